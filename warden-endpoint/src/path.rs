use crate::error::EndpointError;

/// Collapse repeated separators and strip the trailing one.
/// The result always starts with `/`; an empty path becomes `/`.
pub fn normalize_path(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Join the controller-level and method-level fragments into one route path
pub fn join_route(controller_path: &str, method_path: &str) -> Result<String, EndpointError> {
    validate_fragment(controller_path)?;
    validate_fragment(method_path)?;
    Ok(normalize_path(&format!("{}/{}", controller_path, method_path)))
}

fn validate_fragment(fragment: &str) -> Result<(), EndpointError> {
    if fragment
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '?' || c == '#')
    {
        return Err(EndpointError::InvalidPath(fragment.to_string()));
    }
    Ok(())
}
