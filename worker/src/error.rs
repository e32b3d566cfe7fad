use powercard_core::ValidationError;
use powercard_protocol::ErrorResponse;
use thiserror::Error;
use worker::Response;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Upstream(_) => 500,
        }
    }

    /// Body sent to the client. Upstream details stay in the log, the client only sees `fallback`.
    pub fn body(&self, fallback: &str) -> ErrorResponse {
        match self {
            Self::BadRequest(message) => ErrorResponse::new(*message),
            Self::Upstream(_) => ErrorResponse::new(fallback),
        }
    }

    pub fn into_response(self, fallback: &str) -> worker::Result<Response> {
        match &self {
            Self::BadRequest(message) => log::debug!("bad request: {}", message),
            Self::Upstream(err) => log::error!("{:#}", err),
        }
        Ok(Response::from_json(&self.body(fallback))?.with_status(self.status()))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingUrl => Self::BadRequest("URL is required"),
            ValidationError::InvalidUrl(_) => Self::BadRequest("Invalid URL format"),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn validation_errors_are_bad_requests() {
        let missing = ApiError::from(ValidationError::MissingUrl);
        assert_eq!(missing.status(), 400);
        assert_eq!(missing.body("unused").error, "URL is required");

        let invalid = ApiError::from(ValidationError::InvalidUrl("nope".to_string()));
        assert_eq!(invalid.status(), 400);
        assert_eq!(invalid.body("unused").error, "Invalid URL format");
    }

    #[test]
    fn upstream_errors_hide_details() {
        let err = ApiError::from(anyhow!("screenshot API returned 503 with key abc123"));

        assert_eq!(err.status(), 500);
        assert_eq!(err.body("Failed to take screenshot").error, "Failed to take screenshot");
    }
}
