//! Validators applied to property values before they are sent.
//!
//! A validator takes the caller's value and the legal values declared on a
//! [`Property`](crate::property::Property) and either returns the value to
//! send (possibly coerced) or fails with [`Error::Validation`]. Validators
//! are plain functions so they can live in `const` property tables.
//!
//! [`LegalValues::Any`] and an empty [`LegalValues::Set`] mean "no
//! constraint": drivers use them for settings whose limits have not been
//! characterized yet.

use std::fmt::Debug;

use esalib_core::error::{Error, Result};

/// Legal values declared for a property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegalValues<T: 'static> {
    /// Any value is accepted.
    Any,
    /// Values between `min` and `max`, both inclusive.
    Range {
        /// Lower bound.
        min: T,
        /// Upper bound.
        max: T,
    },
    /// An enumerated set of values.
    Set(&'static [T]),
}

impl<T: Copy + PartialOrd> LegalValues<T> {
    /// Lower and upper bound, or `None` when unconstrained.
    ///
    /// For a set these are its smallest and largest members.
    pub fn bounds(&self) -> Option<(T, T)> {
        match self {
            LegalValues::Any => None,
            LegalValues::Range { min, max } => Some((*min, *max)),
            LegalValues::Set(members) => {
                let (first, rest) = members.split_first()?;
                Some(rest.iter().fold((*first, *first), |(lo, hi), &v| {
                    (
                        if v < lo { v } else { lo },
                        if v > hi { v } else { hi },
                    )
                }))
            }
        }
    }
}

/// Signature shared by all validators.
pub type Validator<T> = fn(T, &LegalValues<T>) -> Result<T>;

/// Accept the value unchanged.
pub fn no_validation<T>(value: T, _values: &LegalValues<T>) -> Result<T> {
    Ok(value)
}

/// Accept values within the bounds, fail otherwise.
pub fn strict_range<T: Copy + PartialOrd + Debug>(value: T, values: &LegalValues<T>) -> Result<T> {
    match values.bounds() {
        None => Ok(value),
        Some((min, max)) if value >= min && value <= max => Ok(value),
        Some((min, max)) => Err(Error::Validation(format!(
            "value {value:?} is not in range [{min:?}, {max:?}]"
        ))),
    }
}

/// Clamp the value to the nearest bound instead of failing.
///
/// Used where the instrument itself would clamp an out-of-range setting.
pub fn truncated_range<T: Copy + PartialOrd + Debug>(
    value: T,
    values: &LegalValues<T>,
) -> Result<T> {
    match values.bounds() {
        None => Ok(value),
        Some((min, _)) if value < min => Ok(min),
        Some((_, max)) if value > max => Ok(max),
        Some(_) => Ok(value),
    }
}

/// Accept only members of an enumerated set.
///
/// A range declaration is treated like [`strict_range`].
pub fn strict_discrete_set<T: Copy + PartialOrd + Debug>(
    value: T,
    values: &LegalValues<T>,
) -> Result<T> {
    match values {
        LegalValues::Set(members) if !members.is_empty() => {
            if members.iter().any(|m| *m == value) {
                Ok(value)
            } else {
                Err(Error::Validation(format!(
                    "value {value:?} is not one of {members:?}"
                )))
            }
        }
        _ => strict_range(value, values),
    }
}
