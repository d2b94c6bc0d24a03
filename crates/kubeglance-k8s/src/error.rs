use std::path::PathBuf;

use http::StatusCode;
use kube::config::KubeconfigError;

/// Possible errors from loading kubeconfig files and building clients.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    /// Failed to determine users home directory.
    #[error("failed to determine users home directory")]
    HomeDirNotFound,

    /// An explicitly requested kubeconfig file could not be read.
    #[error("failed to read kubeconfig {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An explicitly requested kubeconfig file could not be parsed.
    #[error("failed to parse kubeconfig {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    /// None of the configured locations produced a kubeconfig.
    #[error("no usable kubeconfig found in {locations}")]
    NoUsableSource { locations: String },

    /// Requested context does not exist in the merged kubeconfig.
    #[error("context '{0}' not found in kubeconfig")]
    ContextNotFound(String),

    /// No context is selected and none was requested.
    #[error("no active context selected")]
    NoActiveContext,

    /// Failed to build transport configuration for the context.
    #[error("failed to create config for context '{context}'")]
    Config {
        context: String,
        #[source]
        source: KubeconfigError,
    },

    /// Failed to build kubernetes client for the context.
    #[error("failed to create client for context '{context}'")]
    Client {
        context: String,
        #[source]
        source: kube::Error,
    },
}

impl ConnectionError {
    /// HTTP status an API layer should answer with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ContextNotFound(_) | Self::NoActiveContext => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ConnectionError::ContextNotFound("dev".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ConnectionError::NoUsableSource {
                locations: "/nowhere".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
