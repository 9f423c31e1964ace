//! Timing experiments comparing growth policies and load factors.
//!
//! Two experiments produce tabular results:
//!
//! - the rehash experiment times inserts into tables that start at `2^q` slots and grow by
//!   doubling, by addition, or not at all
//! - the load factor experiment times successful and unsuccessful lookups in a fixed-size table
//!   filled to increasing load factors
//!
//! [`scenarios`] runs the fixed correctness checks on resize thresholds.

use std::{
    collections::HashSet,
    hint::black_box,
    io::{self, Write},
    time::{Duration, Instant},
};

use log::{info, warn};
use rand::{Rng, distr::Alphanumeric, seq::IndexedRandom};

use crate::{
    DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, GrowthPolicy, ProbingHashTable, TableError,
    TableExtensions,
};

/// Length of generated strings unless configured otherwise
pub const STRING_LENGTH: usize = 10;

/// Values inserted by the basic scenario
const PRESENT_FRUITS: [&str; 5] = ["apple", "banana", "cherry", "date", "elderberry"];
/// Values the scenarios expect to be absent
const ABSENT_FRUITS: [&str; 5] = ["fig", "grape", "honeydew", "kiwi", "lemon"];

/// Returns a random alphanumeric string of `len` characters
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Returns `count` pairwise distinct random strings of `len` characters
pub fn distinct_strings<R: Rng + ?Sized>(rng: &mut R, count: usize, len: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut values = Vec::with_capacity(count);

    while values.len() < count {
        let value = random_string(rng, len);
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }

    values
}

/// Mean duration of one operation in microseconds
#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
fn mean_micros(elapsed: Duration, operations: usize) -> f64 {
    if operations == 0 {
        return 0.0;
    }
    elapsed.as_secs_f64() * 1e6 / operations as f64
}

/// Mean of a sequence of probe lengths
#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, len) = values.fold((0usize, 0usize), |(sum, len), value| {
        (sum.saturating_add(value), len.saturating_add(1))
    });
    if len == 0 { 0.0 } else { sum as f64 / len as f64 }
}

/// Result of one resize-threshold scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// Human readable scenario name
    pub name: String,
    /// Capacity the table should end up with
    pub expected_size: usize,
    /// Capacity the table ended up with
    pub actual_size: usize,
    /// Whether every inserted value was found afterwards
    pub all_found: bool,
    /// Whether no value that was never inserted was found
    pub none_found: bool,
}

impl ScenarioOutcome {
    /// Returns true if the table grew as expected and answered every lookup correctly
    #[must_use]
    pub fn passed(&self) -> bool {
        self.actual_size == self.expected_size && self.all_found && self.none_found
    }
}

/// Inserts `values` into `table` and checks the outcome
fn check_scenario(
    name: String,
    mut table: ProbingHashTable,
    values: &[String],
    expected_size: usize,
) -> Result<ScenarioOutcome, TableError> {
    for value in values {
        table.insert(value.as_str())?;
    }

    Ok(ScenarioOutcome {
        name,
        expected_size,
        actual_size: table.size(),
        all_found: table.contains_all(values),
        none_found: table.contains_none(ABSENT_FRUITS),
    })
}

/// Runs the resize-threshold scenarios: basic lookups on a default table, then `strN` values
/// inserted into tables of 16 slots with a 0.75 threshold under both policies.
///
/// # Errors
///
/// Returns any table error raised while inserting.
pub fn scenarios() -> Result<Vec<ScenarioOutcome>, TableError> {
    let fruits: Vec<String> = PRESENT_FRUITS.iter().map(|&fruit| String::from(fruit)).collect();
    let mut outcomes = vec![check_scenario(
        String::from("basic functionality"),
        ProbingHashTable::default(),
        &fruits,
        DEFAULT_INITIAL_CAPACITY,
    )?];

    let cases = [
        (GrowthPolicy::Double, 23, 32),
        // 24 / 32 == 0.75 does not exceed the threshold
        (GrowthPolicy::Double, 24, 32),
        (GrowthPolicy::Double, 25, 64),
        (GrowthPolicy::Additive, 23, 10_016),
        (GrowthPolicy::Additive, 24, 10_016),
    ];
    for (policy, count, expected_size) in cases {
        let values: Vec<String> = (0..count).map(|i| format!("str{i}")).collect();
        let table =
            ProbingHashTable::new(DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, policy)?;
        outcomes.push(check_scenario(
            format!("{policy:?} strategy ({count} elements)"),
            table,
            &values,
            expected_size,
        )?);
    }

    Ok(outcomes)
}

/// Parameters of the rehash experiment
#[derive(Debug, Clone, PartialEq)]
pub struct RehashConfig {
    /// Smallest initial capacity exponent
    pub q_min: u32,
    /// Largest initial capacity exponent
    pub q_max: u32,
    /// Number of values inserted into every table
    pub insert_count: usize,
    /// Load factor threshold of every table
    pub max_load_factor: f64,
    /// Length of the inserted strings
    pub string_length: usize,
}

impl Default for RehashConfig {
    fn default() -> Self {
        Self {
            q_min: 4,
            q_max: 16,
            insert_count: 100_000,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            string_length: STRING_LENGTH,
        }
    }
}

/// Mean insert times in microseconds for one initial capacity `2^q`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RehashRow {
    /// Initial capacity exponent
    pub q: u32,
    /// Table sized so that no resize happens
    pub no_rehash: f64,
    /// Table growing with [`GrowthPolicy::Double`]
    pub doubling: f64,
    /// Table growing with [`GrowthPolicy::Additive`]
    pub addition: f64,
}

/// Inserts every value and returns the mean time per insert in microseconds
fn time_inserts(table: &mut ProbingHashTable, values: &[String]) -> Result<f64, TableError> {
    let start = Instant::now();
    for value in values {
        table.insert(value.as_str())?;
    }
    Ok(mean_micros(start.elapsed(), values.len()))
}

/// Smallest capacity that holds `count` values under `max_load_factor` without growing
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn capacity_without_growth(count: usize, max_load_factor: f64) -> usize {
    ((count as f64 / max_load_factor).ceil() as usize).saturating_add(1)
}

/// Runs the rehash experiment, one row per initial capacity exponent
///
/// # Errors
///
/// Returns [`TableError::CapacityOverflow`] if `2^q` does not fit in `usize`, and any error from
/// table construction or insertion.
pub fn rehash_experiment<R: Rng + ?Sized>(
    config: &RehashConfig,
    rng: &mut R,
) -> Result<Vec<RehashRow>, TableError> {
    let values = distinct_strings(rng, config.insert_count, config.string_length);
    let mut rows = Vec::new();

    for q in config.q_min..=config.q_max {
        let initial_capacity =
            1usize.checked_shl(q).ok_or(TableError::CapacityOverflow { capacity: 1 })?;

        let presized = initial_capacity
            .max(capacity_without_growth(config.insert_count, config.max_load_factor));
        let mut no_rehash_table = ProbingHashTable::new(
            presized,
            config.max_load_factor,
            GrowthPolicy::Double,
        )?;
        let no_rehash = time_inserts(&mut no_rehash_table, &values)?;
        if no_rehash_table.resize_count() > 0 {
            warn!("presized table with {presized} slots resized during q = {q}");
        }

        let mut doubling_table = ProbingHashTable::new(
            initial_capacity,
            config.max_load_factor,
            GrowthPolicy::Double,
        )?;
        let doubling = time_inserts(&mut doubling_table, &values)?;

        let mut addition_table = ProbingHashTable::new(
            initial_capacity,
            config.max_load_factor,
            GrowthPolicy::Additive,
        )?;
        let addition = time_inserts(&mut addition_table, &values)?;

        info!(
            "q = {q}: no rehash {no_rehash:.4} us, doubling {doubling:.4} us ({} resizes), \
             addition {addition:.4} us ({} resizes)",
            doubling_table.resize_count(),
            addition_table.resize_count()
        );
        rows.push(RehashRow { q, no_rehash, doubling, addition });
    }

    Ok(rows)
}

/// Parameters of the load factor experiment
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFactorConfig {
    /// Fixed number of slots of the measured table
    pub capacity: usize,
    /// Load factors to fill the table to
    pub load_factors: Vec<f64>,
    /// Number of successful and of unsuccessful lookups per load factor
    pub lookup_count: usize,
    /// Length of the inserted strings
    pub string_length: usize,
}

impl LoadFactorConfig {
    /// Returns the load factors `step, 2 * step, ...` strictly below 1
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn load_factor_steps(step: f64) -> Vec<f64> {
        if step.is_nan() || step <= 0.0 || step >= 1.0 {
            return Vec::new();
        }
        let steps = (1.0 / step).ceil() as usize;
        (1..steps).map(|i| i as f64 * step).filter(|&load_factor| load_factor < 1.0).collect()
    }
}

impl Default for LoadFactorConfig {
    fn default() -> Self {
        Self {
            capacity: 1 << 16,
            load_factors: Self::load_factor_steps(0.05),
            lookup_count: 10_000,
            string_length: STRING_LENGTH,
        }
    }
}

/// Lookup timings and probe lengths at one load factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadFactorRow {
    /// Load factor the table was filled to
    pub load_factor: f64,
    /// Mean time of a successful lookup in microseconds
    pub success_time: f64,
    /// Mean time of an unsuccessful lookup in microseconds
    pub fail_time: f64,
    /// Mean probe length of a successful lookup
    pub success_probes: f64,
    /// Mean probe length of an unsuccessful lookup
    pub fail_probes: f64,
}

/// Runs every lookup in `queries` and returns the mean time per lookup in microseconds
fn time_lookups(table: &ProbingHashTable, queries: &[String]) -> f64 {
    let start = Instant::now();
    for query in queries {
        let _ = black_box(table.find(query));
    }
    mean_micros(start.elapsed(), queries.len())
}

/// Number of values that fill `capacity` slots to `load_factor`
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn fill_count(capacity: usize, load_factor: f64) -> usize {
    (capacity as f64 * load_factor) as usize
}

/// Runs the load factor experiment, one row per configured load factor.
///
/// The measured table uses a threshold of 1.0 so it never grows below full occupancy.
///
/// # Errors
///
/// Returns any error from table construction or insertion.
pub fn load_factor_experiment<R: Rng + ?Sized>(
    config: &LoadFactorConfig,
    rng: &mut R,
) -> Result<Vec<LoadFactorRow>, TableError> {
    let mut rows = Vec::with_capacity(config.load_factors.len());

    for &load_factor in &config.load_factors {
        let mut table = ProbingHashTable::new(config.capacity, 1.0, GrowthPolicy::Double)?;
        let inserted = distinct_strings(
            rng,
            fill_count(config.capacity, load_factor),
            config.string_length,
        );
        for value in &inserted {
            table.insert(value.as_str())?;
        }

        let hits: Vec<String> = (0..config.lookup_count)
            .filter_map(|_| inserted.choose(rng).cloned())
            .collect();
        let mut misses = Vec::with_capacity(config.lookup_count);
        while misses.len() < config.lookup_count {
            let candidate = random_string(rng, config.string_length);
            if !table.find(&candidate) {
                misses.push(candidate);
            }
        }

        let row = LoadFactorRow {
            load_factor: table.load_factor(),
            success_time: time_lookups(&table, &hits),
            fail_time: time_lookups(&table, &misses),
            success_probes: mean(hits.iter().map(|hit| table.probe_length(hit))),
            fail_probes: mean(misses.iter().map(|miss| table.probe_length(miss))),
        };
        info!(
            "load factor {:.2}: hit {:.4} us / {:.2} probes, miss {:.4} us / {:.2} probes",
            row.load_factor, row.success_time, row.success_probes, row.fail_time, row.fail_probes
        );
        rows.push(row);
    }

    Ok(rows)
}

/// Expected probes of a successful linear probing search at load factor `alpha`
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn linear_probing_success(alpha: f64) -> f64 {
    0.5 + 1.0 / (2.0 * (1.0 - alpha).powi(2))
}

/// Expected probes of an unsuccessful linear probing search at load factor `alpha`
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn linear_probing_failure(alpha: f64) -> f64 {
    0.5 + 1.0 / (2.0 * (1.0 - alpha))
}

/// Expected probes of a successful double hashing search at load factor `alpha`
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn double_hashing_success(alpha: f64) -> f64 {
    -(1.0 - alpha).ln() / alpha
}

/// Expected probes of an unsuccessful double hashing search at load factor `alpha`
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn double_hashing_failure(alpha: f64) -> f64 {
    1.0 / (1.0 - alpha)
}

/// Factor that maps measured lookup times onto the theoretical probe count scale.
///
/// Anchored at the first row with a load factor of at least 0.5, so the scaled successful time
/// there equals [`linear_probing_success`] of 0.5.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn probe_scale(rows: &[LoadFactorRow]) -> Option<f64> {
    rows.iter()
        .find(|row| row.load_factor >= 0.5)
        .filter(|row| row.success_time > 0.0)
        .map(|row| linear_probing_success(0.5) / row.success_time)
}

/// Writes rehash rows as CSV with a `q,no_rehash,doubling,addition` header
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_rehash_csv<W: Write>(mut out: W, rows: &[RehashRow]) -> io::Result<()> {
    writeln!(out, "q,no_rehash,doubling,addition")?;
    for row in rows {
        writeln!(out, "{},{:.6},{:.6},{:.6}", row.q, row.no_rehash, row.doubling, row.addition)?;
    }
    out.flush()
}

/// Writes load factor rows as CSV with a
/// `load_factor,success_time,fail_time,success_probes,fail_probes` header
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_load_factor_csv<W: Write>(mut out: W, rows: &[LoadFactorRow]) -> io::Result<()> {
    writeln!(out, "load_factor,success_time,fail_time,success_probes,fail_probes")?;
    for row in rows {
        writeln!(
            out,
            "{:.4},{:.6},{:.6},{:.4},{:.4}",
            row.load_factor, row.success_time, row.fail_time, row.success_probes, row.fail_probes
        )?;
    }
    out.flush()
}
