//! Purchase quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// Larger than the store column can hold.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed value.
        max: i32,
    },
    /// Not an integer at all (fractional, string, missing...).
    #[error("quantity must be an integer")]
    NotAnInteger,
}

/// Number of units taken in a single consumption. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Validate a raw integer.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values below 1 and
    /// `QuantityError::TooLarge` for values that do not fit an `i32`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge { max: i32::MAX })
    }

    /// Validate an untyped JSON value.
    ///
    /// Only JSON integers are accepted: `2.0`, `"2"`, `null` and friends are
    /// rejected with `QuantityError::NotAnInteger`.
    ///
    /// # Errors
    ///
    /// Returns a `QuantityError` describing why the value is not a positive integer.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, QuantityError> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::new(v)
                } else if n.as_u64().is_some() {
                    Err(QuantityError::TooLarge { max: i32::MAX })
                } else {
                    Err(QuantityError::NotAnInteger)
                }
            }
            _ => Err(QuantityError::NotAnInteger),
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_accepts_positive() {
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(99).unwrap().get(), 99);
    }

    #[test]
    fn test_new_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-3), Err(QuantityError::NotPositive(-3)));
    }

    #[test]
    fn test_new_rejects_overflow() {
        assert!(matches!(
            Quantity::new(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Quantity::from_json(&json!(3)).unwrap().get(), 3);
        assert_eq!(
            Quantity::from_json(&json!(2.5)),
            Err(QuantityError::NotAnInteger)
        );
        assert_eq!(
            Quantity::from_json(&json!("3")),
            Err(QuantityError::NotAnInteger)
        );
        assert_eq!(
            Quantity::from_json(&serde_json::Value::Null),
            Err(QuantityError::NotAnInteger)
        );
        assert_eq!(
            Quantity::from_json(&json!(0)),
            Err(QuantityError::NotPositive(0))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("4").is_ok());
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::to_string(&Quantity::new(4).unwrap()).unwrap(), "4");
    }
}
