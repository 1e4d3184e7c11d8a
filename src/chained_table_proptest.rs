#![cfg(test)]

// Property tests for ChainedTable kept inside the crate so they can check
// chain layout through the same helpers the unit tests use.

use crate::chained_table::{ChainedTable, Handle};
use crate::hasher::KeyHasher;
use proptest::prelude::*;
use std::collections::HashMap;

// Hashes only the first byte, so short keys from the pool collide often.
#[derive(Clone, Copy, Default)]
struct FirstByte;
impl KeyHasher for FirstByte {
    fn hash_key(&self, key: &str) -> u64 {
        key.bytes().next().map(u64::from).unwrap_or(0)
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Get(usize),
    Delete(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=6, proptest::collection::vec("[a-d]{0,4}", 1..=10)).prop_flat_map(|(size, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Delete),
            1 => "[a-d]{0,4}".prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (size, pool.clone(), ops))
    })
}

// Structural check: every entry sits in the slot its key hashes to, keys are
// unique, and per-slot chain order equals first-insertion order in the model.
fn check_layout<H: KeyHasher>(
    sut: &ChainedTable<i32, H>,
    order: &[String],
    model: &HashMap<String, i32>,
) -> Result<(), TestCaseError> {
    let mut seen = 0usize;
    for slot in 0..sut.size() {
        let chain: Vec<&str> = sut.chain(slot).map(|(k, _)| k).collect();
        let expected: Vec<&str> = order
            .iter()
            .filter(|k| sut.slot_of(k) == slot)
            .map(String::as_str)
            .collect();
        prop_assert_eq!(chain, expected);
        seen += sut.chain_len(slot);
    }
    prop_assert_eq!(seen, model.len());
    prop_assert_eq!(sut.len(), model.len());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` on an existing key updates in place: chain order is unchanged.
// - `put` on a new key appends to the tail of its slot's chain.
// - `delete` returns the model's value and preserves survivor order.
// - `clear` empties every slot while `size()` stays fixed.
// - Handles taken before a delete/clear never resolve afterwards.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((size, pool, ops) in arb_scenario()) {
        let mut sut: ChainedTable<i32, FirstByte> =
            ChainedTable::with_hasher(size, FirstByte).unwrap();
        let mut model: HashMap<String, i32> = HashMap::new();
        // Live keys in first-insertion order.
        let mut order: Vec<String> = Vec::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.put(k, v).unwrap(), &v);
                    if model.insert(k.clone(), v).is_none() {
                        order.push(k.clone());
                    }
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k), model.get(k));
                }
                OpI::Delete(i) => {
                    let k = &pool[i];
                    let h = sut.find(k);
                    prop_assert_eq!(sut.delete(k), model.remove(k));
                    order.retain(|o| o != k);
                    stale.extend(h);
                    prop_assert!(sut.get(k).is_none());
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
                }
                OpI::Mutate(i, d) => {
                    let k = &pool[i];
                    if let Some(v) = sut.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                }
                OpI::Clear => {
                    stale.extend(order.iter().filter_map(|k| sut.find(k)));
                    sut.clear();
                    model.clear();
                    order.clear();
                    prop_assert_eq!(sut.size(), size);
                }
            }

            check_layout(&sut, &order, &model)?;
            for h in &stale {
                prop_assert!(h.value(&sut).is_none(), "stale handle resolved");
            }
        }
    }
}

// Property: with the default djb2 hash, any set of distinct keys stays fully
// retrievable at any table size, and deleting half of them leaves the rest.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_distinct_keys_retrievable(
        size in 1usize..=64,
        keys in proptest::collection::hash_set(".{0,24}", 0..40),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut t = ChainedTable::new(size).unwrap();
        for (i, k) in keys.iter().enumerate() {
            t.put(k, i).unwrap();
        }
        prop_assert_eq!(t.len(), keys.len());
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(t.get(k), Some(&i));
            prop_assert!(t.slot_of(k) < size);
        }
        for (i, k) in keys.iter().enumerate().filter(|(i, _)| i % 2 == 0) {
            prop_assert_eq!(t.delete(k), Some(i));
        }
        for (i, k) in keys.iter().enumerate() {
            let expected = if i % 2 == 0 { None } else { Some(&i) };
            prop_assert_eq!(t.get(k), expected);
        }
    }
}
