//! Validation helpers shared by the dispatch service and the worker.

use validator::ValidationErrors;

/// Flattens a [`ValidationErrors`] into human-readable `field: message` strings,
/// used to populate the HTTP error body's `description` array (spec.md §6).
pub fn describe_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let code = e.code.as_ref();
                format!("{field}: {code}")
            })
        })
        .collect()
}
