use std::fmt;

/// Request validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field absent or empty
    MissingField(&'static str),
    /// Body is not valid JSON for the request type
    Malformed(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(name) => write!(f, "Missing required field: {}", name),
            ValidationError::Malformed(msg) => write!(f, "Malformed request body: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn require(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(name));
    }
    Ok(())
}
