use opal_core::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("{method} {path} failed: {source}")]
    Request {
        method: reqwest::Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: reqwest::Method,
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected {expected} from {path}")]
    UnexpectedResponse { path: String, expected: &'static str },
    #[error("item in column \"{0}\" has not been saved")]
    UnsavedItem(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ClientError {
    /// HTTP status returned by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The item changed on the server since it was loaded.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
