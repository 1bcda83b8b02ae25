use thiserror::Error;

/// Failures talking to the Bitbucket REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Authentication failed for {url}")]
    Unauthorized { url: String },

    #[error("Access denied to {url}")]
    Forbidden { url: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl ApiError {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        match status {
            401 => Self::Unauthorized { url },
            403 => Self::Forbidden { url },
            404 => Self::NotFound { url },
            _ => Self::UnexpectedStatus { status, url },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(ApiError::from_status(401, "u"), ApiError::Unauthorized { .. }));
        assert!(matches!(ApiError::from_status(403, "u"), ApiError::Forbidden { .. }));
        assert!(ApiError::from_status(404, "u").is_not_found());
        assert_eq!(
            ApiError::from_status(502, "http://bb/rest").to_string(),
            "Unexpected HTTP status 502 from http://bb/rest"
        );
    }
}
