//! Software version records for contact resources

use crate::ResourceName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown for a resource that never reported its last interaction.
pub const UNSUPPORTED_LABEL: &str = "unsupported";

/// Software identity and activity of one resource.
///
/// Records are replaced wholesale on update; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Resource this record describes
    pub resource: ResourceName,

    /// Client name (`jabber:iq:version` name)
    pub app_name: Option<String>,

    /// Client version string
    pub app_version: Option<String>,

    /// Operating system the client reports
    pub platform_os: Option<String>,

    /// Most recent observed activity of the resource
    pub last_interaction: Option<DateTime<Utc>>,
}

impl VersionInfo {
    /// Create an empty record for a resource
    pub fn new(resource: impl Into<ResourceName>) -> Self {
        Self {
            resource: resource.into(),
            app_name: None,
            app_version: None,
            platform_os: None,
            last_interaction: None,
        }
    }

    pub fn with_app(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self.app_version = Some(version.into());
        self
    }

    pub fn with_platform_os(mut self, os: impl Into<String>) -> Self {
        self.platform_os = Some(os.into());
        self
    }

    pub fn with_last_interaction(mut self, at: DateTime<Utc>) -> Self {
        self.last_interaction = Some(at);
        self
    }

    /// RFC 3339 timestamp of the last interaction, or [`UNSUPPORTED_LABEL`].
    pub fn last_interaction_label(&self) -> String {
        match self.last_interaction {
            Some(at) => at.to_rfc3339(),
            None => UNSUPPORTED_LABEL.to_string(),
        }
    }
}
