use crate::guard::AuthorizationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),
    #[error("read registry {path}: {source}")]
    RegistryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registry format: {0}")]
    RegistryFormat(#[from] serde_yaml::Error),
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Module};

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::InvalidAction("bad".to_string()),
            AuthzError::InvalidRegistry("missing roles".to_string()),
            AuthzError::RegistryIo {
                path: "/etc/tenantgate/roles.yaml".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            },
            AuthzError::Forbidden(AuthorizationError::new(Module::Clients, Action::Delete)),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn forbidden_renders_only_module_and_action() {
        let err = AuthzError::from(AuthorizationError::new(Module::Users, Action::Edit));
        assert_eq!(err.to_string(), "permission denied: edit on users");
    }
}
