//! Errors reported by `ProbingHashTable`

/// Failures of table construction and insertion
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// A table needs at least one slot
    #[error("initial capacity must be at least 1")]
    ZeroCapacity,
    /// The load factor threshold must lie in (0, 1]
    #[error("max load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f64),
    /// A placement probe visited every slot without finding an empty one
    #[error("probe exhausted all {capacity} slots")]
    ProbeExhausted {
        /// Capacity of the table at the time of the failed probe
        capacity: usize,
    },
    /// The growth policy would push the capacity past `usize::MAX`
    #[error("cannot grow table beyond capacity {capacity}")]
    CapacityOverflow {
        /// Capacity of the table when growth was attempted
        capacity: usize,
    },
}
