//! ChainedTable: fixed slot array with per-slot chains stored in an arena.

use crate::dump::{Dump, SlotDump};
use crate::error::TableError;
use crate::hasher::{Djb2, KeyHasher};
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

/// Stable reference to one entry of a [`ChainedTable`].
///
/// Handles are generational: once the entry is deleted (or the table is
/// cleared) the handle stops resolving, even if the arena cell is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, V, H>(&self, table: &'a ChainedTable<V, H>) -> Option<&'a str> {
        table.entries.get(self.0).map(|e| e.key.as_str())
    }

    pub fn value<'a, V, H>(&self, table: &'a ChainedTable<V, H>) -> Option<&'a V> {
        table.entries.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, V, H>(&self, table: &'a mut ChainedTable<V, H>) -> Option<&'a mut V> {
        table.entries.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Debug)]
struct Entry<V> {
    key: String,
    value: V,
    next: Option<DefaultKey>,
}

/// Where a key sits in its slot's chain.
enum Probe {
    Found {
        prev: Option<DefaultKey>,
        at: DefaultKey,
    },
    Vacant {
        tail: Option<DefaultKey>,
    },
}

/// String-keyed hash table with a fixed number of slots.
///
/// A key always lives in slot `hash(key) % size()`. Keys sharing a slot form
/// a chain kept in insertion order; the table never grows or rehashes.
pub struct ChainedTable<V, H = Djb2> {
    hasher: H,
    heads: Box<[Option<DefaultKey>]>,
    entries: SlotMap<DefaultKey, Entry<V>>, // chain nodes, linked through `next`
}

impl<V> ChainedTable<V> {
    /// Creates a table with `size` empty slots using the [`Djb2`] hash.
    pub fn new(size: usize) -> Result<Self, TableError> {
        Self::with_hasher(size, Djb2)
    }
}

impl<V, H> ChainedTable<V, H>
where
    H: KeyHasher,
{
    /// Creates a table with `size` empty slots placing keys with `hasher`.
    ///
    /// Fails with [`TableError::InvalidSize`] for zero slots and with
    /// [`TableError::AllocationFailure`] if the slot array cannot be
    /// allocated.
    pub fn with_hasher(size: usize, hasher: H) -> Result<Self, TableError> {
        if size == 0 {
            return Err(TableError::InvalidSize);
        }
        let mut heads = Vec::new();
        heads.try_reserve_exact(size)?;
        heads.resize(size, None);
        log::trace!("created table with {size} slots");
        Ok(Self {
            hasher,
            heads: heads.into_boxed_slice(),
            entries: SlotMap::with_key(),
        })
    }

    /// Number of slots, fixed at construction.
    pub fn size(&self) -> usize {
        self.heads.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot index `key` maps to.
    pub fn slot_of(&self, key: &str) -> usize {
        // size() >= 1, so the remainder fits in usize.
        (self.hasher.hash_key(key) % self.heads.len() as u64) as usize
    }

    fn probe(&self, slot: usize, key: &str) -> Probe {
        let mut prev = None;
        let mut cursor = self.heads[slot];
        while let Some(at) = cursor {
            let entry = &self.entries[at];
            if entry.key == key {
                return Probe::Found { prev, at };
            }
            prev = Some(at);
            cursor = entry.next;
        }
        Probe::Vacant { tail: prev }
    }

    /// Maps `key` to `value` and returns the stored value.
    ///
    /// An existing entry for `key` gets its value replaced in place and keeps
    /// its chain position. Otherwise a new entry is appended at the tail of
    /// the slot's chain, holding the table's own copy of `key`. If that copy
    /// or the entry node cannot be allocated the table is left unchanged.
    pub fn put(&mut self, key: &str, value: V) -> Result<&V, TableError> {
        let slot = self.slot_of(key);
        match self.probe(slot, key) {
            Probe::Found { at, .. } => {
                let entry = &mut self.entries[at];
                entry.value = value;
                Ok(&entry.value)
            }
            Probe::Vacant { tail } => {
                let mut owned = String::new();
                owned.try_reserve_exact(key.len())?;
                owned.push_str(key);
                self.entries.try_reserve(1)?;

                let at = self.entries.insert(Entry {
                    key: owned,
                    value,
                    next: None,
                });
                match tail {
                    None => self.heads[slot] = Some(at),
                    Some(tail) => {
                        log::trace!("chaining {key:?} onto occupied slot {slot}");
                        self.entries[tail].next = Some(at);
                    }
                }
                Ok(&self.entries[at].value)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let slot = self.slot_of(key);
        match self.probe(slot, key) {
            Probe::Found { at, .. } => Some(&self.entries[at].value),
            Probe::Vacant { .. } => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let slot = self.slot_of(key);
        match self.probe(slot, key) {
            Probe::Found { at, .. } => Some(&mut self.entries[at].value),
            Probe::Vacant { .. } => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let slot = self.slot_of(key);
        matches!(self.probe(slot, key), Probe::Found { .. })
    }

    /// Returns a [`Handle`] to the entry for `key`, if present.
    pub fn find(&self, key: &str) -> Option<Handle> {
        let slot = self.slot_of(key);
        match self.probe(slot, key) {
            Probe::Found { at, .. } => Some(Handle(at)),
            Probe::Vacant { .. } => None,
        }
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// The entry is spliced out of its chain; the remaining entries keep
    /// their order. Absent keys return `None` and change nothing.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        let slot = self.slot_of(key);
        let Probe::Found { prev, at } = self.probe(slot, key) else {
            return None;
        };
        let entry = self.entries.remove(at)?;
        match prev {
            None => self.heads[slot] = entry.next,
            Some(prev) => self.entries[prev].next = entry.next,
        }
        log::trace!("unlinked {key:?} from slot {slot}");
        Some(entry.value)
    }

    /// Releases every entry. The slot count is unchanged.
    pub fn clear(&mut self) {
        log::trace!("clearing {} entries", self.entries.len());
        self.entries.clear();
        self.heads.fill(None);
    }

    /// Releases the table along with every entry it holds.
    pub fn destroy(self) {
        log::trace!(
            "destroying table with {} slots and {} entries",
            self.heads.len(),
            self.entries.len()
        );
    }

    /// Iterates the chain of `slot` in chain order. Out-of-range slots are
    /// empty.
    pub fn chain(&self, slot: usize) -> Chain<'_, V> {
        Chain {
            entries: &self.entries,
            cursor: self.heads.get(slot).copied().flatten(),
        }
    }

    pub fn chain_len(&self, slot: usize) -> usize {
        self.chain(slot).count()
    }

    /// Iterates all entries, slot by slot, each slot in chain order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            heads: self.heads.iter(),
            chain: Chain {
                entries: &self.entries,
                cursor: None,
            },
        }
    }

    /// Calls `f` on every entry in the same order as [`iter`](Self::iter).
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut V),
    {
        for &head in self.heads.iter() {
            let mut cursor = head;
            while let Some(at) = cursor {
                let entry = &mut self.entries[at];
                f(&entry.key, &mut entry.value);
                cursor = entry.next;
            }
        }
    }

    /// Snapshot of every non-empty slot and its chain.
    pub fn dump(&self) -> Dump<'_, V> {
        let slots = (0..self.heads.len())
            .filter_map(|slot| {
                let entries: Vec<_> = self.chain(slot).collect();
                (!entries.is_empty()).then_some(SlotDump { slot, entries })
            })
            .collect();
        Dump::new(slots)
    }
}

impl<V, H> fmt::Debug for ChainedTable<V, H>
where
    V: fmt::Debug,
    H: KeyHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over one slot's chain.
#[derive(Debug)]
pub struct Chain<'a, V> {
    entries: &'a SlotMap<DefaultKey, Entry<V>>,
    cursor: Option<DefaultKey>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cursor?;
        let entry = &self.entries[at];
        self.cursor = entry.next;
        Some((entry.key.as_str(), &entry.value))
    }
}

impl<V> Clone for Chain<'_, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries,
            cursor: self.cursor,
        }
    }
}

/// Iterator over all entries in slot order, then chain order.
#[derive(Debug)]
pub struct Iter<'a, V> {
    heads: core::slice::Iter<'a, Option<DefaultKey>>,
    chain: Chain<'a, V>,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            heads: self.heads.clone(),
            chain: self.chain.clone(),
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.chain.next() {
                return Some(item);
            }
            self.chain.cursor = *self.heads.next()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct ConstHasher;
    impl KeyHasher for ConstHasher {
        fn hash_key(&self, _key: &str) -> u64 {
            7 // force every key into the same slot
        }
    }

    fn keys_in<V, H: KeyHasher>(t: &ChainedTable<V, H>, slot: usize) -> Vec<String> {
        t.chain(slot).map(|(k, _)| k.to_string()).collect()
    }

    /// Invariant: zero slots are rejected; no table is produced.
    #[test]
    fn zero_size_rejected() {
        match ChainedTable::<i32>::new(0) {
            Err(TableError::InvalidSize) => {}
            other => panic!("unexpected result: {:?}", other.map(|t| t.size())),
        }
    }

    /// Invariant: a fresh table has all slots empty and its declared size.
    #[test]
    fn new_table_is_empty() {
        let t: ChainedTable<i32> = ChainedTable::new(8).unwrap();
        assert_eq!(t.size(), 8);
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert!((0..8).all(|s| t.chain_len(s) == 0));
        assert!(t.dump().is_empty());
    }

    /// Invariant: `slot_of` is `djb2(key) % size`.
    #[test]
    fn slot_is_hash_mod_size() {
        let t: ChainedTable<i32> = ChainedTable::new(10).unwrap();
        for key in ["", "a", "ab", "value 1", "some longer key"] {
            assert_eq!(t.slot_of(key) as u64, crate::djb2(key) % 10);
        }
    }

    /// Invariant: put returns the stored value and get observes it.
    #[test]
    fn put_then_get() {
        let mut t = ChainedTable::new(4).unwrap();
        assert_eq!(t.put("k", 5).unwrap(), &5);
        assert_eq!(t.get("k"), Some(&5));
        assert_eq!(t.get("missing"), None);
    }

    /// Invariant: updating a key replaces the value in place; the entry keeps
    /// its chain position and no duplicate is created.
    #[test]
    fn update_keeps_chain_position() {
        let mut t = ChainedTable::with_hasher(3, ConstHasher).unwrap();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            t.put(k, i).unwrap();
        }
        let slot = t.slot_of("a");
        assert_eq!(t.put("b", 42).unwrap(), &42);
        assert_eq!(keys_in(&t, slot), ["a", "b", "c"]);
        assert_eq!(t.get("b"), Some(&42));
        assert_eq!(t.len(), 3);
    }

    /// Invariant: new keys append at the chain tail in insertion order.
    #[test]
    fn collisions_append_in_insertion_order() {
        let mut t = ChainedTable::with_hasher(5, ConstHasher).unwrap();
        for k in ["x", "y", "z", "w"] {
            t.put(k, k.len()).unwrap();
        }
        let slot = 7 % 5;
        assert_eq!(keys_in(&t, slot), ["x", "y", "z", "w"]);
        assert_eq!(t.chain_len(slot), 4);
        assert!((0..5).filter(|&s| s != slot).all(|s| t.chain_len(s) == 0));
    }

    /// Invariant: deleting the head, a middle node, and the tail each relink
    /// the chain correctly and preserve the order of survivors.
    #[test]
    fn delete_relinks_head_middle_and_tail() {
        let mut t = ChainedTable::with_hasher(1, ConstHasher).unwrap();
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            t.put(k, i).unwrap();
        }
        assert_eq!(t.delete("c"), Some(2));
        assert_eq!(keys_in(&t, 0), ["a", "b", "d", "e"]);
        assert_eq!(t.delete("a"), Some(0));
        assert_eq!(keys_in(&t, 0), ["b", "d", "e"]);
        assert_eq!(t.delete("e"), Some(4));
        assert_eq!(keys_in(&t, 0), ["b", "d"]);

        // A new key lands after the current tail.
        t.put("f", 5).unwrap();
        assert_eq!(keys_in(&t, 0), ["b", "d", "f"]);
        assert_eq!(t.len(), 3);
    }

    /// Invariant: deleting an absent key changes nothing.
    #[test]
    fn delete_missing_is_noop() {
        let mut t = ChainedTable::with_hasher(2, ConstHasher).unwrap();
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        assert_eq!(t.delete("zz"), None);
        assert_eq!(t.len(), 2);
        assert_eq!(keys_in(&t, 1), ["a", "b"]);
    }

    /// Invariant: the table stores its own copy of the key.
    #[test]
    fn key_is_copied() {
        let mut t = ChainedTable::new(4).unwrap();
        let mut buf = String::from("owned");
        t.put(&buf, 1).unwrap();
        buf.clear();
        buf.push_str("other");
        assert_eq!(t.get("owned"), Some(&1));
        assert_eq!(t.get("other"), None);
    }

    /// Invariant: clear empties every slot and keeps the declared size; the
    /// table stays usable afterward.
    #[test]
    fn clear_keeps_size() {
        let mut t = ChainedTable::new(3).unwrap();
        for k in ["a", "b", "c", "d"] {
            t.put(k, 0u8).unwrap();
        }
        t.clear();
        assert_eq!(t.size(), 3);
        assert!(t.is_empty());
        assert!(["a", "b", "c", "d"].iter().all(|k| t.get(k).is_none()));
        t.put("a", 9).unwrap();
        assert_eq!(t.get("a"), Some(&9));
    }

    /// Invariant: handles resolve while the entry lives and never alias a
    /// later entry after deletion.
    #[test]
    fn stale_handle_does_not_alias_new_entry() {
        let mut t = ChainedTable::new(4).unwrap();
        t.put("old", 1).unwrap();
        let h1 = t.find("old").unwrap();
        assert_eq!(h1.key(&t), Some("old"));
        *h1.value_mut(&mut t).unwrap() += 1;
        assert_eq!(t.get("old"), Some(&2));

        t.delete("old").unwrap();
        t.put("new", 3).unwrap();
        let h2 = t.find("new").unwrap();
        assert_ne!(h1, h2, "handles must differ across generations");
        assert!(h1.value(&t).is_none(), "stale handle must not resolve");
        assert_eq!(h2.value(&t), Some(&3));
    }

    /// Invariant: iteration visits slots in ascending order, chains in order.
    #[test]
    fn iter_and_for_each_mut_follow_slot_then_chain_order() {
        let mut t = ChainedTable::new(16).unwrap();
        for (i, k) in ["a", "b", "q", "r", "aa"].iter().enumerate() {
            t.put(k, i).unwrap();
        }
        let seen: Vec<String> = t.iter().map(|(k, _)| k.to_string()).collect();
        let expected: Vec<String> = (0..t.size())
            .flat_map(|s| t.chain(s).map(|(k, _)| k.to_string()))
            .collect();
        assert_eq!(seen, expected);
        assert!(seen.windows(2).all(|w| t.slot_of(&w[0]) <= t.slot_of(&w[1])));

        let mut visited = Vec::new();
        t.for_each_mut(|k, v| {
            visited.push(k.to_string());
            *v += 100;
        });
        assert_eq!(visited, seen);
        assert_eq!(t.get("q"), Some(&102));
    }

    /// Invariant: an unrepresentable slot array is reported as an allocation
    /// failure instead of aborting.
    #[test]
    fn oversized_slot_array_reports_allocation_failure() {
        match ChainedTable::<i32>::new(usize::MAX) {
            Err(TableError::AllocationFailure(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|t| t.size())),
        }
    }

    /// Invariant: entries added while the node arena grows stay linked in
    /// their chains, and every put reserves before linking.
    #[test]
    fn put_across_arena_growth_keeps_chains() {
        let mut t = ChainedTable::new(3).unwrap();
        let keys: Vec<String> = (0..1000).map(|i| format!("key{i}")).collect();
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.put(k, i).unwrap(), &i);
            assert_eq!(t.len(), i + 1);
        }
        assert_eq!((0..3).map(|s| t.chain_len(s)).sum::<usize>(), 1000);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.get(k), Some(&i));
        }
    }

    /// Invariant: handle accessors need no hasher bound.
    #[test]
    fn handle_accessors_are_hasher_agnostic() {
        fn resolve<'a, V, H>(h: Handle, t: &'a ChainedTable<V, H>) -> Option<(&'a str, &'a V)> {
            Some((h.key(t)?, h.value(t)?))
        }
        let mut t = ChainedTable::with_hasher(2, ConstHasher).unwrap();
        t.put("k", 1).unwrap();
        let h = t.find("k").unwrap();
        assert_eq!(resolve(h, &t), Some(("k", &1)));
    }

    #[test]
    fn chain_out_of_range_is_empty() {
        let t: ChainedTable<i32> = ChainedTable::new(2).unwrap();
        assert_eq!(t.chain(2).count(), 0);
        assert_eq!(t.chain_len(usize::MAX), 0);
    }

    #[test]
    fn debug_renders_map() {
        let mut t = ChainedTable::with_hasher(1, ConstHasher).unwrap();
        t.put("a", 1).unwrap();
        t.put("b", 2).unwrap();
        assert_eq!(format!("{t:?}"), r#"{"a": 1, "b": 2}"#);
    }
}
