//! Field-level validation wiring (spec.md §4.9): the `validator` derive on
//! `UploadJob` covers required/length/UUID rules; the `max-file-size` rule is
//! strategy-contextual, so it runs as a second explicit pass once the
//! strategy (and therefore its size cap) is known.

use filepoint_core::validation::describe_validation_errors;
use filepoint_core::{AppError, UploadJob};
use validator::Validate;

use crate::error::HttpAppError;

pub fn validate_upload_job(job: &UploadJob, max_size_bytes: u64) -> Result<(), HttpAppError> {
    if let Err(errors) = job.validate() {
        let description = describe_validation_errors(&errors);
        return Err(HttpAppError::with_description(
            AppError::InvalidInput("upload job failed field validation".to_string()),
            description,
        ));
    }

    job.validate_size(max_size_bytes)
        .map_err(HttpAppError::from)
}
