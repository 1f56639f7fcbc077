use crate::utils::error::{ChunkcastError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Checks `0 < value < ceiling` and returns the length as a `usize`.
pub fn validate_chunk_length(value: i64, ceiling: usize) -> Result<usize> {
    let invalid = || ChunkcastError::InvalidChunkLength { value, ceiling };

    let length = usize::try_from(value).map_err(|_| invalid())?;
    if length == 0 || length >= ceiling {
        return Err(invalid());
    }
    Ok(length)
}

pub fn validate_root(root: usize, size: usize) -> Result<()> {
    if root >= size {
        return Err(ChunkcastError::InvalidRoot { root, size });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ChunkcastError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChunkcastError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ChunkcastError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::INT_MAX;

    #[test]
    fn test_validate_chunk_length() {
        assert_eq!(validate_chunk_length(1, INT_MAX).unwrap(), 1);
        assert_eq!(
            validate_chunk_length(INT_MAX as i64 - 1, INT_MAX).unwrap(),
            INT_MAX - 1
        );
        assert!(validate_chunk_length(0, INT_MAX).is_err());
        assert!(validate_chunk_length(-1, INT_MAX).is_err());
        assert!(validate_chunk_length(INT_MAX as i64, INT_MAX).is_err());
        assert!(validate_chunk_length(i64::MAX, INT_MAX).is_err());
    }

    #[test]
    fn test_validate_root() {
        assert!(validate_root(0, 1).is_ok());
        assert!(validate_root(3, 4).is_ok());
        assert!(matches!(
            validate_root(4, 4),
            Err(ChunkcastError::InvalidRoot { root: 4, size: 4 })
        ));
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("group.ranks", 5, 1).is_ok());
        assert!(validate_positive_number("group.ranks", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range_and_strings() {
        assert!(validate_range("broadcast.root", 2usize, 0, 3).is_ok());
        assert!(validate_range("broadcast.root", 4usize, 0, 3).is_err());
        assert!(validate_non_empty_string("hostname", "node-a").is_ok());
        assert!(validate_non_empty_string("hostname", "   ").is_err());
    }
}
