use validator::ValidationErrors;

/// First message of a failed validation, ordered by field name so the result is
/// stable across runs.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check your input".to_string())
}
