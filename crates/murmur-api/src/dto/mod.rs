//! Request and response bodies.

pub mod request;
pub mod response;

use validator::Validate;

use murmur_core::error::AppError;

/// Run a request's `validator` rules.
pub fn validate<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}
