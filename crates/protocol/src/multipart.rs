//! `multipart/mixed` bodies for upload and publish requests.
//!
//! Tableau expects a `request_payload` part carrying XML (possibly empty)
//! and, for uploads, a `tableau_file` part carrying raw bytes.

use crate::constants::{FILE_PART, REQUEST_PAYLOAD_PART};

struct Part {
    disposition: String,
    content_type: &'static str,
    data: Vec<u8>,
}

/// Builder for a `multipart/mixed` request body.
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Creates an empty body with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(&format!("tableau-send-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Creates an empty body with a fixed boundary.
    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    /// Adds the XML `request_payload` part.
    pub fn xml_payload(mut self, xml: &str) -> Self {
        self.parts.push(Part {
            disposition: format!("name=\"{REQUEST_PAYLOAD_PART}\""),
            content_type: "text/xml",
            data: xml.as_bytes().to_vec(),
        });
        self
    }

    /// Adds the raw `tableau_file` part.
    pub fn file(mut self, filename: &str, data: &[u8]) -> Self {
        self.parts.push(Part {
            disposition: format!(
                "name=\"{FILE_PART}\"; filename=\"{}\"",
                sanitize_filename(filename)
            ),
            content_type: "application/octet-stream",
            data: data.to_vec(),
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Encodes all parts into the wire representation.
    pub fn into_bytes(self) -> Vec<u8> {
        let payload: usize = self.parts.iter().map(|p| p.data.len() + 128).sum();
        let mut out = Vec::with_capacity(payload + self.boundary.len() + 8);
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            out.extend_from_slice(
                format!("Content-Disposition: {}\r\n", part.disposition).as_bytes(),
            );
            out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// Strips characters that would break the quoted `filename` parameter.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n' | '\\'))
        .collect()
}
