//! Utility functions and traits for `ProbingHashTable`

use std::hash::BuildHasher;

use crate::{GrowthPolicy, ProbingHashTable, TableError};

/// Extension trait for tables that provides bulk membership checks
pub trait TableExtensions {
    /// Returns the stored values as owned strings, in slot order
    fn values(&self) -> Vec<String>;

    /// Returns true if every value in `values` is stored
    fn contains_all<I>(&self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>;

    /// Returns true if no value in `values` is stored
    fn contains_none<I>(&self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>;
}

impl<S: BuildHasher> TableExtensions for ProbingHashTable<S> {
    fn values(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }

    fn contains_all<I>(&self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        values.into_iter().all(|value| self.find(value.as_ref()))
    }

    fn contains_none<I>(&self, values: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        !values.into_iter().any(|value| self.find(value.as_ref()))
    }
}

/// Creates a `ProbingHashTable` holding every value of an iterator
///
/// # Errors
///
/// Returns any error from [`ProbingHashTable::new`] or [`ProbingHashTable::insert`].
pub fn from_values<I>(
    values: I,
    initial_capacity: usize,
    max_load_factor: f64,
    growth_policy: GrowthPolicy,
) -> Result<ProbingHashTable, TableError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut table = ProbingHashTable::new(initial_capacity, max_load_factor, growth_policy)?;

    for value in values {
        table.insert(value)?;
    }

    Ok(table)
}
