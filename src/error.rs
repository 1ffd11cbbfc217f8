//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Error Type for Scenesense
//! ═══════════════════════════════════════════════════════════════════════════════
//! Centralized error handling. No scattered .unwrap() or .expect() calls.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::fmt;

/// The unified error type for the scenesense crate
#[derive(Debug)]
pub enum SceneError {
    /// A feature key that is not in any registry (caller bug)
    UnknownFeature(String),
    /// A relation was requested without a partner shape
    MissingPartner(&'static str),
    /// A relation matcher's partner selector contains relation matchers itself
    IllegalNesting,
    /// An extremum attribute was asked of a scene with no movable objects
    NoObjects(&'static str),
    /// The supports relation produced an activity outside its four levels
    UnknownSupportValue(f64),
    /// JSON serialization/deserialization error (report path)
    Json(serde_json::Error),
    /// Internal invariant violation (should not happen)
    Internal(String),
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::UnknownFeature(key) => write!(f, "Unknown feature key: {}", key),
            SceneError::MissingPartner(key) => {
                write!(f, "Relation '{}' requested without a partner", key)
            }
            SceneError::IllegalNesting => {
                write!(f, "Partner selector of a relation matcher must be relation-free")
            }
            SceneError::NoObjects(key) => {
                write!(f, "Attribute '{}' needs at least one movable object", key)
            }
            SceneError::UnknownSupportValue(v) => {
                write!(f, "Supports relation saw unexpected activity value {}", v)
            }
            SceneError::Json(e) => write!(f, "JSON error: {}", e),
            SceneError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        SceneError::Json(err)
    }
}

/// Type alias for Result with SceneError
pub type SceneResult<T> = Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SceneError::UnknownFeature("sparkle".to_string());
        assert!(err.to_string().contains("sparkle"));

        let err = SceneError::MissingPartner("left_of");
        assert!(err.to_string().contains("left_of"));

        let err = SceneError::IllegalNesting;
        assert!(err.to_string().contains("relation-free"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SceneError = json_err.into();
        assert!(matches!(err, SceneError::Json(_)));
    }
}
