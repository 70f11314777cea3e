use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// Operation a role may perform within a module.
///
/// `Any` is the `"*"` wildcard and only makes sense inside a role definition;
/// a request for `Any` is matched literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Upload,
    Download,
    Export,
    Approve,
    Manage,
    #[serde(rename = "*")]
    Any,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Upload => "upload",
            Action::Download => "download",
            Action::Export => "export",
            Action::Approve => "approve",
            Action::Manage => "manage",
            Action::Any => "*",
        }
    }

    pub fn parse(value: &str) -> AuthzResult<Self> {
        value.parse()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            "upload" => Ok(Action::Upload),
            "download" => Ok(Action::Download),
            "export" => Ok(Action::Export),
            "approve" => Ok(Action::Approve),
            "manage" => Ok(Action::Manage),
            "*" => Ok(Action::Any),
            _ => Err(AuthzError::InvalidAction(value.to_string())),
        }
    }
}
