use reqwest::StatusCode;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Check your internet connection and try again.";
pub const API_ERROR_MESSAGE: &str = "The server returned an error. Please try again later.";
pub const NOT_FOUND_MESSAGE: &str = "The requested data could not be found.";

/// Failure of a single API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request URL {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Classifies a transport error from reqwest.
    pub(crate) fn from_transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Text shown to the user in the status bar and error panels.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => NETWORK_ERROR_MESSAGE,
            Self::Status { status, .. } if *status == StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE,
            Self::Status { .. } | Self::Decode { .. } | Self::InvalidUrl(_) | Self::Client(_) => {
                API_ERROR_MESSAGE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_has_its_own_message() {
        let err = ApiError::Status {
            url: "http://x/api/v1/regions/99".to_string(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), NOT_FOUND_MESSAGE);
    }

    #[test]
    fn timeout_reads_as_network_error() {
        let err = ApiError::Timeout {
            url: "http://x".to_string(),
        };
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn decode_and_server_errors_read_as_api_error() {
        let decode = ApiError::Decode {
            url: "http://x".to_string(),
            source: serde_json::from_str::<u8>("nope").unwrap_err(),
        };
        assert_eq!(decode.user_message(), API_ERROR_MESSAGE);

        let server = ApiError::Status {
            url: "http://x".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(server.user_message(), API_ERROR_MESSAGE);
        assert!(server.to_string().contains("500"));
    }
}
