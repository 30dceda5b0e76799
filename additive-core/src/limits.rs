// MIT License
// Copyright 2023--present additive developers

//! Default value and closed interval of a range-checked parameter.

use crate::error::{check_range, Result};

/// Default and inclusive bounds of one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub const fn new(default: f64, min: f64, max: f64) -> Self {
        Self { default, min, max }
    }

    /// Fails with a value error naming `field` when `value` is out of bounds.
    pub fn check(&self, field: &str, value: f64) -> Result<f64> {
        check_range(field, value, self.min, self.max)?;
        Ok(value)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_value_through() {
        let limits = Limits::new(3e-3, 1e-3, 1e-2);
        assert_eq!(limits.check("size_x", 1e-3).unwrap(), 1e-3);
        assert!(limits.check("size_x", 0.9e-3).is_err());
        assert!(limits.contains(limits.default));
    }
}
