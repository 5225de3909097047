//! API handlers module

pub mod authors;
pub mod concepts;
pub mod health;
pub mod suggestions;

use readforge_common::errors::AppError;
use validator::Validate;

/// Run `validator` checks, mapping failures to a 400 response
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: e.field_errors().keys().next().map(|field| field.to_string()),
    })
}
