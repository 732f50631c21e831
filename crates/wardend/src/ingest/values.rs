//! Conversion of parsed JSON values into owned launch parameters.

use serde_json::Value;

use super::errors::RequestError;

/// Copies a JSON string scalar into owned text.
pub(crate) fn load_text(value: &Value, field: &str) -> Result<String, RequestError> {
    value.as_str().map(str::to_owned).ok_or_else(|| {
        RequestError::schema_violation(format!("field '{field}' must be a string"))
    })
}

/// Extracts a JSON boolean scalar.
pub(crate) fn load_flag(value: &Value, field: &str) -> Result<bool, RequestError> {
    value.as_bool().ok_or_else(|| {
        RequestError::schema_violation(format!("field '{field}' must be a boolean"))
    })
}

/// Converts a JSON array into the ordered exec argument vector.
///
/// The result has exactly as many elements as the input, in input order;
/// the position of each argument is significant. Elements converted before
/// a failure are dropped with the local buffer.
pub(crate) fn load_argv(value: &Value) -> Result<Vec<String>, RequestError> {
    let Some(elements) = value.as_array() else {
        return Err(RequestError::schema_violation("field 'Args' must be an array"));
    };

    let mut argv = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let Some(text) = element.as_str() else {
            return Err(RequestError::ArgNotString { index });
        };
        argv.push(text.to_owned());
    }
    Ok(argv)
}

/// Converts a JSON object into `KEY=VALUE` environment entries.
///
/// The source mapping has no defined order, so callers must not rely on the
/// order of the result beyond "every pair present exactly once".
pub(crate) fn load_envp(value: &Value) -> Result<Vec<String>, RequestError> {
    let Some(pairs) = value.as_object() else {
        return Err(RequestError::schema_violation("field 'Env' must be an object"));
    };

    let mut envp = Vec::with_capacity(pairs.len());
    for (key, entry) in pairs {
        let Some(text) = entry.as_str() else {
            return Err(RequestError::EnvValueNotString { key: key.clone() });
        };
        envp.push(format!("{key}={text}"));
    }
    Ok(envp)
}
