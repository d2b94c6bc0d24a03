use std::time::Duration;

use http::StatusCode;
use kubeglance_k8s::ConnectionError;
use kubeglance_types::ResourceKind;

/// Possible errors from summarizing a namespace.
#[derive(thiserror::Error, Debug)]
pub enum HealthError {
    /// A query for a kind the summary cannot do without failed.
    #[error("failed to list {kind} resources")]
    Critical {
        kind: ResourceKind,
        #[source]
        source: kube::Error,
    },

    /// The summary did not finish in time.
    #[error("namespace summary timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the summary.
    #[error("namespace summary was cancelled")]
    Cancelled,

    /// A query task panicked or was aborted.
    #[error("query task failed")]
    Task(#[from] tokio::task::JoinError),

    /// No client could be obtained for the context.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl HealthError {
    /// HTTP status an API layer should answer with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Connection(error) => error.status_code(),
            Self::Critical {
                source: kube::Error::Api(response),
                ..
            } if response.code == StatusCode::FORBIDDEN.as_u16() => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
