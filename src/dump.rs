//! Read-only snapshot of a table's occupied slots, for diagnostics.

use core::fmt;

/// One occupied slot and its chain, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDump<'a, V> {
    pub(crate) slot: usize,
    pub(crate) entries: Vec<(&'a str, &'a V)>,
}

impl<'a, V> SlotDump<'a, V> {
    /// Index of the slot within the table.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// `(key, value)` pairs of the chain, head first.
    pub fn entries(&self) -> &[(&'a str, &'a V)] {
        &self.entries
    }
}

/// Occupied slots of a table in ascending slot order.
///
/// Produced by [`ChainedTable::dump`](crate::ChainedTable::dump). Formats
/// with `Display` as one line per slot:
///
/// ```text
/// slot 0: "value 3" => 193
/// slot 2: "value 1" => 7
/// slot 3: "value 2" => 1370
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump<'a, V> {
    slots: Vec<SlotDump<'a, V>>,
}

impl<'a, V> Dump<'a, V> {
    pub(crate) fn new(slots: Vec<SlotDump<'a, V>>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[SlotDump<'a, V>] {
        &self.slots
    }

    /// True when every slot of the table was empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, SlotDump<'a, V>> {
        self.slots.iter()
    }
}

impl<'a, V> IntoIterator for Dump<'a, V> {
    type Item = SlotDump<'a, V>;
    type IntoIter = std::vec::IntoIter<SlotDump<'a, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<V: fmt::Debug> fmt::Display for SlotDump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}:", self.slot)?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{key:?} => {value:?}")?;
        }
        Ok(())
    }
}

impl<V: fmt::Debug> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            writeln!(f, "{slot}")?;
        }
        Ok(())
    }
}
