use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("API Error {status}: {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Session store error: {0}")]
    Session(String),

    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if err.is_decode() {
            ClientError::Decode {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            ClientError::Network {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Connectivity, non-2xx and malformed-payload failures can be papered
    /// over with cached or simulated data. Authorization, session and
    /// validation failures cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClientError::Network { .. }
                | ClientError::Timeout { .. }
                | ClientError::Status { .. }
                | ClientError::Decode { .. }
        )
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
