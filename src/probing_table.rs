use std::{
    collections::hash_map::DefaultHasher,
    hash::{BuildHasher, BuildHasherDefault},
    mem,
};

use log::{debug, trace};

use crate::{GrowthPolicy, TableError};

/// Capacity used by [`ProbingHashTable::default`]
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
/// Load factor threshold used by [`ProbingHashTable::default`]
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

/// Hasher used when none is supplied. `DefaultHasher::new` uses fixed keys, so home indices are
/// stable across runs.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// Outcome of walking the probe sequence of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    /// Whether the value was found
    found: bool,
    /// Number of slots examined
    probes: usize,
}

/// An open-addressing set of strings with linear probing.
///
/// Growth is anticipatory: before a new value is placed, the table checks whether holding one more
/// value would push the load factor strictly above the threshold, and if so grows according to
/// its [`GrowthPolicy`] and rehashes every stored value.
///
/// There is no removal, so slots only ever go from empty to occupied.
///
/// Note: This implementation is not thread-safe; mutation requires exclusive access.
#[derive(Debug, Clone)]
pub struct ProbingHashTable<S = DefaultHashBuilder> {
    /// Slot storage, `None` marks an empty slot
    slots: Vec<Option<String>>,
    /// Number of occupied slots
    count: usize,
    /// Threshold in (0, 1] that `count / capacity` may not exceed
    max_load_factor: f64,
    /// How the capacity grows on resize
    growth_policy: GrowthPolicy,
    /// Number of resizes performed since construction
    resize_count: usize,
    /// Builds the hasher for home index computation
    hash_builder: S,
}

impl Default for ProbingHashTable {
    fn default() -> Self {
        Self {
            slots: vec![None; DEFAULT_INITIAL_CAPACITY],
            count: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_policy: GrowthPolicy::Double,
            resize_count: 0,
            hash_builder: DefaultHashBuilder::default(),
        }
    }
}

impl ProbingHashTable {
    /// Creates an empty table with `initial_capacity` slots
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ZeroCapacity`] for a zero capacity and
    /// [`TableError::InvalidLoadFactor`] for a threshold outside (0, 1].
    pub fn new(
        initial_capacity: usize,
        max_load_factor: f64,
        growth_policy: GrowthPolicy,
    ) -> Result<Self, TableError> {
        Self::with_hasher(
            initial_capacity,
            max_load_factor,
            growth_policy,
            DefaultHashBuilder::default(),
        )
    }
}

impl<S: BuildHasher> ProbingHashTable<S> {
    /// Creates an empty table that hashes values with `hash_builder`
    ///
    /// # Errors
    ///
    /// Same as [`ProbingHashTable::new`].
    pub fn with_hasher(
        initial_capacity: usize,
        max_load_factor: f64,
        growth_policy: GrowthPolicy,
        hash_builder: S,
    ) -> Result<Self, TableError> {
        if initial_capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        if max_load_factor.is_nan() || max_load_factor <= 0.0 || max_load_factor > 1.0 {
            return Err(TableError::InvalidLoadFactor(max_load_factor));
        }

        Ok(Self {
            slots: vec![None; initial_capacity],
            count: 0,
            max_load_factor,
            growth_policy,
            resize_count: 0,
            hash_builder,
        })
    }

    /// Computes the home index of a value for the current capacity
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    fn home_index(&self, value: &str) -> usize {
        // capacity >= 1, and the remainder is below capacity so it fits in usize
        (self.hash_builder.hash_one(value) % self.slots.len() as u64) as usize
    }

    /// Returns the slot after `index`, wrapping to the start
    fn next_index(&self, index: usize) -> usize {
        let next = index.saturating_add(1);
        if next >= self.slots.len() { 0 } else { next }
    }

    /// Returns true if holding `count` values in `capacity` slots breaks the load factor threshold
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    fn exceeds_load_factor(&self, count: usize, capacity: usize) -> bool {
        count as f64 / capacity as f64 > self.max_load_factor
    }

    /// Walks the probe sequence of `value`, stopping at a match, an empty slot or a full cycle
    fn probe(&self, value: &str) -> Probe {
        let slot_count = self.slots.len();
        let mut index = self.home_index(value);

        for probes in 1..=slot_count {
            match self.slots.get(index) {
                None | Some(None) => return Probe { found: false, probes },
                Some(Some(stored)) if stored == value => return Probe { found: true, probes },
                Some(Some(_)) => {}
            }
            index = self.next_index(index);
        }

        // Back at the home index: every slot is occupied by some other value
        Probe { found: false, probes: slot_count }
    }

    /// Returns true if `value` is stored in the table
    #[must_use]
    pub fn find(&self, value: &str) -> bool {
        self.probe(value).found
    }

    /// Returns the number of slots [`find`](Self::find) examines for `value`
    #[must_use]
    pub fn probe_length(&self, value: &str) -> usize {
        self.probe(value).probes
    }

    /// Inserts `value` unless it is already present.
    ///
    /// Returns `Ok(true)` if the value was added and `Ok(false)` if it was already stored.
    /// Duplicates never trigger growth.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::CapacityOverflow`] if the table cannot grow any further, and
    /// [`TableError::ProbeExhausted`] if no empty slot is reachable.
    pub fn insert(&mut self, value: impl Into<String>) -> Result<bool, TableError> {
        let value = value.into();
        if self.find(&value) {
            return Ok(false);
        }

        self.insert_unique(value)?;
        Ok(true)
    }

    /// Inserts a value known to be absent, growing the table first if needed
    fn insert_unique(&mut self, value: String) -> Result<(), TableError> {
        let required = self.count.saturating_add(1);
        if self.exceeds_load_factor(required, self.slots.len()) {
            self.resize(required)?;
        }

        self.place(value)
    }

    /// Puts `value` into the first empty slot of its probe sequence
    fn place(&mut self, value: String) -> Result<(), TableError> {
        let capacity = self.slots.len();
        let mut index = self.home_index(&value);

        for _ in 0..capacity {
            if let Some(slot) = self.slots.get_mut(index).filter(|slot| slot.is_none()) {
                *slot = Some(value);
                self.count = self.count.saturating_add(1);
                return Ok(());
            }
            index = self.next_index(index);
        }

        trace!("no empty slot for {value:?} among {capacity} slots");
        Err(TableError::ProbeExhausted { capacity })
    }

    /// Grows the table until `required` values fit under the load factor and rehashes every value.
    ///
    /// The old slots are taken out of the table and dropped once every value has been re-placed.
    fn resize(&mut self, required: usize) -> Result<(), TableError> {
        let old_capacity = self.slots.len();
        let mut new_capacity = self.growth_policy.next_capacity(old_capacity)?;
        while self.exceeds_load_factor(required, new_capacity) {
            new_capacity = self.growth_policy.next_capacity(new_capacity)?;
        }

        debug!(
            "resizing from {old_capacity} to {new_capacity} slots ({:?}), rehashing {} values",
            self.growth_policy, self.count
        );

        let old_slots = mem::replace(&mut self.slots, vec![None; new_capacity]);
        self.count = 0;
        self.resize_count = self.resize_count.saturating_add(1);

        for value in old_slots.into_iter().flatten() {
            self.insert_unique(value)?;
        }

        Ok(())
    }
}

impl<S> ProbingHashTable<S> {
    /// Returns the number of slots in the table
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of stored values
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.count
    }

    /// Returns true if no value is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the current ratio of stored values to slots
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.slots.len() as f64
    }

    /// Returns the load factor threshold
    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Returns the growth policy chosen at construction
    #[must_use]
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth_policy
    }

    /// Returns how many times the table has resized
    #[must_use]
    pub fn resize_count(&self) -> usize {
        self.resize_count
    }

    /// Returns an iterator over the stored values in slot order
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { slots: self.slots.iter() }
    }
}

impl<'a, S> IntoIterator for &'a ProbingHashTable<S> {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the values of a [`ProbingHashTable`]
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    /// Remaining slots
    slots: std::slice::Iter<'a, Option<String>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(Option::as_deref)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
mod tests {
    use std::hash::Hasher;

    use proptest::prelude::*;

    use super::*;

    /// Hashes every value to the same home index
    #[derive(Debug, Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            7
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    fn fill(table: &mut ProbingHashTable, count: usize) -> Vec<String> {
        let values: Vec<String> = (0..count).map(|i| format!("str{i}")).collect();
        for value in &values {
            assert!(table.insert(value.as_str()).unwrap());
        }
        values
    }

    #[test]
    fn test_insert_and_find() {
        let mut table = ProbingHashTable::default();
        for value in ["apple", "banana", "cherry", "date", "elderberry"] {
            assert!(table.insert(value).unwrap());
        }

        for value in ["apple", "banana", "cherry", "date", "elderberry"] {
            assert!(table.find(value));
        }
        for value in ["fig", "grape", "honeydew", "kiwi", "lemon"] {
            assert!(!table.find(value));
        }
        assert_eq!(table.occupied_count(), 5);
        assert_eq!(table.size(), DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut table = ProbingHashTable::default();
        assert!(table.insert("key1").unwrap());
        assert!(!table.insert("key1").unwrap());
        assert!(!table.insert(String::from("key1")).unwrap());
        assert_eq!(table.occupied_count(), 1);
    }

    #[test]
    fn test_duplicate_never_triggers_growth() {
        let mut table = ProbingHashTable::new(4, 0.75, GrowthPolicy::Double).unwrap();
        fill(&mut table, 3);
        assert_eq!(table.size(), 4);

        // A fourth distinct value would need 4/4 > 0.75, a repeated one must not
        assert!(!table.insert("str0").unwrap());
        assert_eq!(table.size(), 4);
        assert_eq!(table.resize_count(), 0);
    }

    #[test]
    fn test_rejects_degenerate_configuration() {
        assert_eq!(
            ProbingHashTable::new(0, 0.75, GrowthPolicy::Double).unwrap_err(),
            TableError::ZeroCapacity
        );
        for load_factor in [0.0, -0.5, 1.5, f64::INFINITY] {
            assert_eq!(
                ProbingHashTable::new(16, load_factor, GrowthPolicy::Double).unwrap_err(),
                TableError::InvalidLoadFactor(load_factor)
            );
        }
        assert!(matches!(
            ProbingHashTable::new(16, f64::NAN, GrowthPolicy::Additive),
            Err(TableError::InvalidLoadFactor(_))
        ));
        assert!(ProbingHashTable::new(1, 1.0, GrowthPolicy::Additive).is_ok());
    }

    #[test]
    fn test_doubling_single_resize() {
        let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Double).unwrap();
        let values = fill(&mut table, 23);

        assert_eq!(table.size(), 32);
        assert_eq!(table.resize_count(), 1);
        assert!(values.iter().all(|v| table.find(v)));
    }

    #[test]
    fn test_doubling_growth_is_strict() {
        // The 24th value gives 24/32 == 0.75 which does not exceed the threshold
        let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Double).unwrap();
        let values = fill(&mut table, 24);
        assert_eq!(table.size(), 32);
        assert!(values.iter().all(|v| table.find(v)));

        // The 25th value gives 25/32 > 0.75
        assert!(table.insert("str24").unwrap());
        assert_eq!(table.size(), 64);
        assert_eq!(table.resize_count(), 2);
        assert!(values.iter().all(|v| table.find(v)));
        assert!(table.find("str24"));
    }

    #[test]
    fn test_resize_fires_before_placement() {
        let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Double).unwrap();
        fill(&mut table, 12);
        assert_eq!(table.size(), 16);

        assert!(table.insert("str12").unwrap());
        assert_eq!(table.size(), 32);
        assert_eq!(table.occupied_count(), 13);
    }

    #[test]
    fn test_additive_growth() {
        for count in [23, 24] {
            let mut table = ProbingHashTable::new(16, 0.75, GrowthPolicy::Additive).unwrap();
            let values = fill(&mut table, count);

            assert_eq!(table.size(), 10_016);
            assert_eq!(table.resize_count(), 1);
            assert!(values.iter().all(|v| table.find(v)));
        }
    }

    #[test]
    fn test_growth_repeats_until_value_fits() {
        // One doubling of a single slot is not enough for a 0.25 threshold
        let mut table = ProbingHashTable::new(1, 0.25, GrowthPolicy::Double).unwrap();
        assert!(table.insert("only").unwrap());
        assert_eq!(table.size(), 4);
        assert_eq!(table.resize_count(), 1);
        assert!(table.load_factor() <= 0.25);
    }

    #[test]
    fn test_full_table_find_terminates() {
        // A threshold of 1.0 lets the table fill every slot
        let mut table = ProbingHashTable::new(8, 1.0, GrowthPolicy::Double).unwrap();
        let values = fill(&mut table, 8);
        assert_eq!(table.size(), 8);
        assert!((table.load_factor() - 1.0).abs() < f64::EPSILON);

        assert!(!table.find("absent"));
        assert_eq!(table.probe_length("absent"), 8);
        assert!(values.iter().all(|v| table.find(v)));

        // One more value forces growth instead of a failed probe
        assert!(table.insert("absent").unwrap());
        assert_eq!(table.size(), 16);
    }

    #[test]
    fn test_place_into_full_table_reports_exhaustion() {
        let mut table = ProbingHashTable::new(4, 1.0, GrowthPolicy::Double).unwrap();
        fill(&mut table, 4);

        assert_eq!(
            table.place(String::from("extra")),
            Err(TableError::ProbeExhausted { capacity: 4 })
        );
        assert_eq!(table.occupied_count(), 4);
    }

    #[test]
    fn test_colliding_values_probe_linearly() {
        let mut table = ProbingHashTable::with_hasher(
            8,
            0.75,
            GrowthPolicy::Double,
            BuildHasherDefault::<ConstantHasher>::default(),
        )
        .unwrap();
        for value in ["a", "b", "c", "d", "e", "f"] {
            assert!(table.insert(value).unwrap());
        }

        // Home index is 7 % 8, the cluster wraps around to the start
        assert_eq!(table.probe_length("a"), 1);
        assert_eq!(table.probe_length("f"), 6);
        assert_eq!(table.probe_length("missing"), 7);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["b", "c", "d", "e", "f", "a"]);

        // Growth rehashes the whole cluster
        assert!(table.insert("g").unwrap());
        assert_eq!(table.size(), 16);
        for value in ["a", "b", "c", "d", "e", "f", "g"] {
            assert!(table.find(value));
        }
    }

    #[test]
    fn test_probe_length_of_empty_table() {
        let table = ProbingHashTable::default();
        assert!(table.is_empty());
        assert_eq!(table.probe_length("anything"), 1);
        assert!(!table.find("anything"));
    }

    #[test]
    fn test_iter_visits_every_value_once() {
        let mut table = ProbingHashTable::default();
        let mut values = fill(&mut table, 40);

        let mut stored: Vec<String> = table.iter().map(String::from).collect();
        stored.sort();
        values.sort();
        assert_eq!(stored, values);
        assert_eq!((&table).into_iter().count(), table.occupied_count());
    }

    #[test]
    fn test_accessors() {
        let table = ProbingHashTable::new(32, 0.5, GrowthPolicy::Additive).unwrap();
        assert_eq!(table.size(), 32);
        assert_eq!(table.occupied_count(), 0);
        assert!((table.max_load_factor() - 0.5).abs() < f64::EPSILON);
        assert_eq!(table.growth_policy(), GrowthPolicy::Additive);
        assert_eq!(table.resize_count(), 0);
    }

    fn growth_policy() -> impl Strategy<Value = GrowthPolicy> {
        prop_oneof![Just(GrowthPolicy::Double), Just(GrowthPolicy::Additive)]
    }

    proptest! {
        #[test]
        fn prop_inserted_values_are_found(
            values in prop::collection::hash_set("[a-z]{1,12}", 0..200),
            absent in prop::collection::vec("[A-Z]{1,12}", 0..20),
        ) {
            let mut table = ProbingHashTable::default();
            for value in &values {
                prop_assert!(table.insert(value.as_str()).unwrap());
            }

            prop_assert_eq!(table.occupied_count(), values.len());
            for value in &values {
                prop_assert!(table.find(value));
            }
            for value in &absent {
                prop_assert!(!table.find(value));
            }
        }

        #[test]
        fn prop_invariants_hold_after_every_insert(
            values in prop::collection::vec("[a-z0-9]{1,8}", 0..150),
            initial_capacity in 1usize..64,
            max_load_factor in 0.1f64..=1.0,
            policy in growth_policy(),
        ) {
            let mut table =
                ProbingHashTable::new(initial_capacity, max_load_factor, policy).unwrap();
            let mut size = table.size();

            for value in &values {
                let count = table.occupied_count();
                let added = table.insert(value.as_str()).unwrap();
                prop_assert_eq!(table.occupied_count(), if added { count + 1 } else { count });

                // Idempotence
                prop_assert!(!table.insert(value.as_str()).unwrap());
                prop_assert_eq!(table.occupied_count(), if added { count + 1 } else { count });

                prop_assert!(table.load_factor() <= max_load_factor);
                prop_assert!(table.size() >= size);
                size = table.size();
            }

            // Every stored value is reachable from its home index
            let stored: Vec<String> = table.iter().map(String::from).collect();
            prop_assert_eq!(stored.len(), table.occupied_count());
            for value in &stored {
                prop_assert!(table.find(value));
            }
        }
    }
}
