//! # Probing Table
//!
//! A string set built on open addressing with linear probing, used to compare two resize
//! strategies under varying load factors.
//!
//! - [`GrowthPolicy::Double`] multiplies the capacity by two on every resize
//! - [`GrowthPolicy::Additive`] adds a fixed [`ADDITIVE_INCREMENT`] of slots
//!
//! Growth is anticipatory: an insertion first checks whether one more value would push the load
//! factor strictly above the threshold, and if so rehashes everything into a larger table before
//! placing the new value. Values are never removed.
//!
//! ## Basic Usage
//!
//! ```rust
//! use probing_table::{GrowthPolicy, ProbingHashTable};
//!
//! let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Double)?;
//!
//! assert!(table.insert("apple")?);
//! assert!(!table.insert("apple")?); // already present
//!
//! assert!(table.find("apple"));
//! assert!(!table.find("banana"));
//! assert_eq!(table.occupied_count(), 1);
//! assert_eq!(table.size(), 16);
//! # Ok::<(), probing_table::TableError>(())
//! ```
//!
//! ## Growth
//!
//! ```rust
//! use probing_table::{GrowthPolicy, ProbingHashTable};
//!
//! let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Additive)?;
//! for i in 0..13 {
//!     table.insert(format!("str{i}"))?;
//! }
//!
//! // 13 / 16 > 0.75, so the 13th value grew the table by 10000 slots
//! assert_eq!(table.size(), 10_016);
//! # Ok::<(), probing_table::TableError>(())
//! ```

/// Module with the error type of table operations
mod error;
/// Benchmark experiments comparing the resize strategies
pub mod experiment;
/// Module with the capacity growth policies
mod growth;
/// Logger setup shared by the benchmark binary and tests
pub mod logger;
/// Module implementing the linear probing hash table
mod probing_table;
/// Utility functions and traits for the hash table
mod utils;

pub use error::TableError;
pub use growth::{ADDITIVE_INCREMENT, GrowthPolicy};
pub use probing_table::{
    DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, DefaultHashBuilder, Iter, ProbingHashTable,
};
pub use utils::{TableExtensions, from_values};
