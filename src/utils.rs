use crate::error::InertiaError;
use serde::Serialize;
use serde_json::{Map, Value};

pub(crate) fn inertia_err_msg(msg: String) -> String {
    format!("[Inertia] {}", msg)
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Converts a struct of type `T` into a serde_json::Map.
///
/// ## Errors
/// Results in `InertiaError` if the struct has any field that does not also implement
/// `Serialize`, or if it does not serialize into a JSON object.
pub(crate) fn convert_struct_to_map<T>(s: T) -> Result<Map<String, Value>, InertiaError>
where
    T: Serialize,
{
    let struct_as_value = match serde_json::to_value(s) {
        Ok(value) => value,
        Err(_) => {
            return Err(InertiaError::SerializationError(
                "Struct is not JSON serializable.".into(),
            ))
        }
    };

    match serde_json::from_value(struct_as_value) {
        Ok(value) => Ok(value),
        Err(err) => Err(InertiaError::SerializationError(format!(
            "Failed to serialize struct as map: {}",
            err
        ))),
    }
}

pub(crate) fn convert_struct_to_stringified_json<T>(s: T) -> Result<String, InertiaError>
where
    T: Serialize,
{
    let map = convert_struct_to_map(s)?;
    match serde_json::to_string(&map) {
        Ok(json) => Ok(json),
        Err(err) => Err(InertiaError::SerializationError(format!(
            "Failed to serialize map to json: {}",
            err
        ))),
    }
}
