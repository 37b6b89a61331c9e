//! Send pipeline error types.

use tableau_send_extract::ExtractError;

/// Errors produced while sending a datasource.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("datasource {name:?} already exists in project {project:?}")]
    DatasourceExists { name: String, project: String },

    #[error(transparent)]
    Rest(tableau_send_rest::Error),

    #[error(transparent)]
    Extract(ExtractError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extract task failed: {0}")]
    Task(String),

    #[error("cancelled")]
    Cancelled,
}

impl SendError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tableau_send_rest::Error> for SendError {
    fn from(e: tableau_send_rest::Error) -> Self {
        match e {
            tableau_send_rest::Error::Cancelled => Self::Cancelled,
            other => Self::Rest(other),
        }
    }
}

impl From<ExtractError> for SendError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Cancelled => Self::Cancelled,
            other => Self::Extract(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_unified() {
        assert!(SendError::from(tableau_send_rest::Error::Cancelled).is_cancelled());
        assert!(SendError::from(ExtractError::Cancelled).is_cancelled());
        assert!(!SendError::from(tableau_send_rest::Error::NotSignedIn).is_cancelled());
    }

    #[test]
    fn exists_message_names_target() {
        let err = SendError::DatasourceExists {
            name: "Sales".into(),
            project: "Finance".into(),
        };
        assert_eq!(
            err.to_string(),
            "datasource \"Sales\" already exists in project \"Finance\""
        );
    }
}
