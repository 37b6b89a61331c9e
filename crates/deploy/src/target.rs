//! Target project resolution and overwrite handling.

use tableau_send_protocol::{OverwritePolicy, Project};
use tableau_send_rest::ProjectTree;

use crate::error::SendError;
use crate::types::ProjectSelector;

/// Publish query flags derived from the overwrite policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishFlags {
    pub overwrite: bool,
    pub append: bool,
}

/// Finds the project the selector points at.
pub fn resolve_project<'t>(
    tree: &'t ProjectTree,
    selector: &ProjectSelector,
) -> Result<&'t Project, SendError> {
    let project = match selector {
        ProjectSelector::Id(id) => tree
            .get(id)
            .ok_or_else(|| tableau_send_rest::Error::ProjectNotFound(id.clone()))?,
        ProjectSelector::Path(reference) => tree.lookup(reference)?,
    };
    Ok(project)
}

/// Decides the publish flags for a datasource that may already exist.
///
/// `Abort` on an existing datasource fails with
/// [`SendError::DatasourceExists`] so nothing is uploaded.
pub fn publish_flags(
    exists: bool,
    policy: OverwritePolicy,
    name: &str,
    project: &str,
) -> Result<PublishFlags, SendError> {
    if !exists {
        return Ok(PublishFlags::default());
    }
    match policy {
        OverwritePolicy::Abort => Err(SendError::DatasourceExists {
            name: name.to_string(),
            project: project.to_string(),
        }),
        OverwritePolicy::Overwrite => Ok(PublishFlags {
            overwrite: true,
            append: false,
        }),
        OverwritePolicy::Append => Ok(PublishFlags {
            overwrite: false,
            append: true,
        }),
    }
}
