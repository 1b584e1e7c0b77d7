/// Shape checks applied to server responses after deserialization.
///
/// Serde already rejects missing or mistyped fields; this catches values that
/// parse but make no sense to render.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        for (i, item) in self.iter().enumerate() {
            item.validate().map_err(|e| format!("item {}: {}", i, e))?;
        }
        Ok(())
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is empty", field))
    } else {
        Ok(())
    }
}

pub(crate) fn require_non_negative(field: &str, value: i64) -> Result<(), String> {
    if value < 0 {
        Err(format!("{} is negative ({})", field, value))
    } else {
        Ok(())
    }
}

/// Ratios such as the conversion rate can legitimately exceed 100.
pub(crate) fn require_non_negative_ratio(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} out of range ({})", field, value))
    }
}

pub(crate) fn require_percentage(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} out of range ({})", field, value))
    }
}
