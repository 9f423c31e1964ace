//! Capacity growth policies applied when a table resizes

use crate::TableError;

/// Number of slots added by [`GrowthPolicy::Additive`] on every resize
pub const ADDITIVE_INCREMENT: usize = 10_000;

/// How a table computes its next capacity when the load factor threshold would be exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GrowthPolicy {
    /// Geometric growth: the capacity is multiplied by two
    #[default]
    Double,
    /// Fixed-increment growth: the capacity grows by [`ADDITIVE_INCREMENT`] slots
    Additive,
}

impl GrowthPolicy {
    /// Returns the capacity that follows `capacity` under this policy
    ///
    /// # Errors
    ///
    /// Returns [`TableError::CapacityOverflow`] if the new capacity does not fit in `usize`.
    pub fn next_capacity(self, capacity: usize) -> Result<usize, TableError> {
        let next = match self {
            Self::Double => capacity.checked_mul(2),
            Self::Additive => capacity.checked_add(ADDITIVE_INCREMENT),
        };
        next.ok_or(TableError::CapacityOverflow { capacity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double() {
        assert_eq!(GrowthPolicy::Double.next_capacity(16), Ok(32));
        assert_eq!(GrowthPolicy::Double.next_capacity(1), Ok(2));
    }

    #[test]
    fn test_additive() {
        assert_eq!(GrowthPolicy::Additive.next_capacity(16), Ok(10_016));
        assert_eq!(GrowthPolicy::Additive.next_capacity(10_016), Ok(20_016));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            GrowthPolicy::Double.next_capacity(usize::MAX),
            Err(TableError::CapacityOverflow { capacity: usize::MAX })
        );
        assert_eq!(
            GrowthPolicy::Additive.next_capacity(usize::MAX - 1),
            Err(TableError::CapacityOverflow { capacity: usize::MAX - 1 })
        );
    }

    #[test]
    fn test_default_is_double() {
        assert_eq!(GrowthPolicy::default(), GrowthPolicy::Double);
    }
}
