//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a name still has content once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a list of names: each non-blank, no duplicates once trimmed.
pub fn validate_name_list(names: &[String]) -> Result<(), ValidationError> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        validate_display_name(name)?;
        let trimmed = name.trim();
        if seen.contains(&trimmed) {
            let mut err = ValidationError::new("name_duplicate");
            err.message = Some(format!("`{trimmed}` is listed more than once").into());
            return Err(err);
        }
        seen.push(trimmed);
    }
    Ok(())
}

/// Validates an optional position selection: `null` clears, otherwise 1..=3.
pub fn validate_position(position: &Option<u8>) -> Result<(), ValidationError> {
    match position {
        Some(place) if !(1..=3).contains(place) => {
            let mut err = ValidationError::new("position_range");
            err.message = Some(format!("Position must be 1, 2 or 3 (got {place})").into());
            Err(err)
        }
        _ => Ok(()),
    }
}
