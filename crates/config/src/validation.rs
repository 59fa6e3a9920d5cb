//! Validation helpers for configuration values

pub use crate::error::ValidationError;
use std::fmt;
use std::ops::RangeInclusive;

/// Trait for configuration sections that can validate themselves
pub trait ConfigSection: Default {
    /// Validates the section, returning every problem found
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Merges another section into this one; values from `other` win
    fn merge(&mut self, other: Self);

    /// Section name used as the prefix of field paths in errors
    fn section_name(&self) -> &'static str;
}

/// Field checks shared by every section
pub struct Validator;

impl Validator {
    /// Inclusive range check; NaN never passes
    pub fn in_range<T>(
        value: T,
        range: RangeInclusive<T>,
        field: &str,
    ) -> Result<(), ValidationError>
    where
        T: PartialOrd + fmt::Display + Copy,
    {
        if range.contains(&value) {
            return Ok(());
        }
        Err(ValidationError::with_value(
            field,
            format!("must be between {} and {}", range.start(), range.end()),
            value,
        ))
    }

    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "must not be empty"));
        }
        Ok(())
    }

    /// Keeps every failure, or `Ok` if there were none
    pub fn collect_errors<I>(results: I) -> Result<(), Vec<ValidationError>>
    where
        I: IntoIterator<Item = Result<(), ValidationError>>,
    {
        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
