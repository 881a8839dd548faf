//! Input validation limits for relation sets

/// Maximum length for a relation key (128 chars)
pub const MAX_RELATION_KEY_LEN: usize = 128;

/// Maximum length for a target type name (128 chars)
pub const MAX_TARGET_TYPE_LEN: usize = 128;

/// Maximum relation keys in one direction (256)
pub const MAX_RELATION_KEYS_PER_DIRECTION: usize = 256;

/// Maximum target types listed under one relation key (64)
pub const MAX_TARGET_TYPES_PER_KEY: usize = 64;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    RelationKeyTooLong { len: usize, max: usize },
    TargetTypeTooLong { len: usize, max: usize },
    TooManyRelationKeys { count: usize, max: usize },
    TooManyTargetTypes { count: usize, max: usize },
    EmptyRelationKey,
    EmptyTargetType,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelationKeyTooLong { len, max } => {
                write!(f, "Relation key too long: {} chars (max {})", len, max)
            }
            Self::TargetTypeTooLong { len, max } => {
                write!(f, "Target type too long: {} chars (max {})", len, max)
            }
            Self::TooManyRelationKeys { count, max } => {
                write!(f, "Too many relation keys in one direction: {} (max {})", count, max)
            }
            Self::TooManyTargetTypes { count, max } => {
                write!(f, "Too many target types for one key: {} (max {})", count, max)
            }
            Self::EmptyRelationKey => write!(f, "Relation key cannot be empty"),
            Self::EmptyTargetType => write!(f, "Target type cannot be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate relation key
pub fn validate_relation_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyRelationKey);
    }
    if key.len() > MAX_RELATION_KEY_LEN {
        return Err(ValidationError::RelationKeyTooLong {
            len: key.len(),
            max: MAX_RELATION_KEY_LEN,
        });
    }
    Ok(())
}

/// Validate target type name
pub fn validate_target_type(target_type: &str) -> Result<(), ValidationError> {
    if target_type.is_empty() {
        return Err(ValidationError::EmptyTargetType);
    }
    if target_type.len() > MAX_TARGET_TYPE_LEN {
        return Err(ValidationError::TargetTypeTooLong {
            len: target_type.len(),
            max: MAX_TARGET_TYPE_LEN,
        });
    }
    Ok(())
}

/// Validate number of relation keys in a direction
pub fn validate_relation_keys(count: usize) -> Result<(), ValidationError> {
    if count > MAX_RELATION_KEYS_PER_DIRECTION {
        return Err(ValidationError::TooManyRelationKeys {
            count,
            max: MAX_RELATION_KEYS_PER_DIRECTION,
        });
    }
    Ok(())
}

/// Validate number of target types under one key
pub fn validate_target_types(count: usize) -> Result<(), ValidationError> {
    if count > MAX_TARGET_TYPES_PER_KEY {
        return Err(ValidationError::TooManyTargetTypes {
            count,
            max: MAX_TARGET_TYPES_PER_KEY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_relation_key() {
        assert!(validate_relation_key("located_at").is_ok());
        assert_eq!(validate_relation_key(""), Err(ValidationError::EmptyRelationKey));
        assert!(validate_relation_key(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_relation_keys(MAX_RELATION_KEYS_PER_DIRECTION).is_ok());
        assert!(validate_relation_keys(MAX_RELATION_KEYS_PER_DIRECTION + 1).is_err());
        assert!(validate_target_types(MAX_TARGET_TYPES_PER_KEY + 1).is_err());
    }
}
