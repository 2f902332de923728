use crate::CaseFoldMap;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use proptest::prelude::*;

/// Reference model: the container semantics written out naively on a `Vec`.
struct Model {
    /// (folded key, last written casing, value) in iteration order.
    entries: Vec<(String, Option<String>, u32)>,
    next_index: u64,
}

impl Model {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
        }
    }

    fn canonical_index(s: &str) -> Option<u64> {
        // canonical decimals survive a parse/print round trip unchanged,
        // which rejects "042", "+1" and anything past u64::MAX
        s.parse::<u64>().ok().filter(|n| n.to_string() == s)
    }

    fn insert(&mut self, key: &str, value: u32) {
        let folded = key.to_lowercase();
        if let Some(n) = Self::canonical_index(&folded) {
            self.next_index = self.next_index.max(n + 1);
        }
        if let Some(entry) = self.entries.iter_mut().find(|(f, _, _)| *f == folded) {
            entry.1 = Some(key.to_string());
            entry.2 = value;
        } else {
            self.entries.push((folded, Some(key.to_string()), value));
        }
    }

    fn append(&mut self, value: u32) {
        let folded = self.next_index.to_string();
        self.next_index += 1;
        self.entries.push((folded, None, value));
    }

    fn remove(&mut self, key: &str) {
        let folded = key.to_lowercase();
        self.entries.retain(|(f, _, _)| *f != folded);
    }

    fn reported(&self) -> Vec<(&str, u32)> {
        self.entries
            .iter()
            .map(|(f, o, v)| (o.as_deref().unwrap_or(f), *v))
            .collect()
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String, u32),
    Append(u32),
    Remove(String),
    Compact,
}

fn key_strategy() -> impl Strategy<Value = String> {
    // Tiny alphabet so case collisions, repeated keys, and integer-like
    // keys all show up in short sequences.
    prop::string::string_regex("[abAB012]{0,3}").unwrap()
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (key_strategy(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => any::<u32>().prop_map(Op::Append),
        2 => key_strategy().prop_map(Op::Remove),
        1 => Just(Op::Compact),
    ]
}

proptest! {
    #[test]
    fn matches_reference_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut map: CaseFoldMap<u32> = CaseFoldMap::new();
        let mut model = Model::new();

        for op in &ops {
            match op {
                Op::Insert(k, v) => {
                    map.insert(k.as_str(), *v);
                    model.insert(k, *v);
                }
                Op::Append(v) => {
                    map.append(*v);
                    model.append(*v);
                }
                Op::Remove(k) => {
                    map.remove(k.as_str());
                    model.remove(k);
                }
                Op::Compact => map.shrink_to_fit_live(),
            }
        }

        prop_assert_eq!(map.len(), model.entries.len());

        let got: Vec<(&str, u32)> = map.iter().map(|(k, v)| (k, *v)).collect();
        prop_assert_eq!(got, model.reported());

        // every surviving entry resolves under both casings of its key
        for (folded, _, value) in &model.entries {
            prop_assert_eq!(map.get(folded.as_str()), Some(value));
            let upper = folded.to_uppercase();
            prop_assert_eq!(map.get(upper.as_str()), Some(value));
        }
    }

    #[test]
    fn any_casing_reads_back_the_write(
        key in "[a-z]{1,8}",
        flips in prop::collection::vec(any::<bool>(), 1..=8),
        value in any::<u32>(),
    ) {
        let variant: String = key
            .chars()
            .zip(flips.iter().cycle())
            .map(|(c, flip)| if *flip { c.to_ascii_uppercase() } else { c })
            .collect();

        let mut map = CaseFoldMap::new();
        map.insert(variant.as_str(), value);

        prop_assert_eq!(map.get(key.as_str()), Some(&value));
        prop_assert_eq!(map.len(), 1);
        prop_assert_eq!(map.keys().next(), Some(variant.as_str()));
    }

    #[test]
    fn appends_never_collide_with_integer_keys(
        indexes in prop::collection::vec(0u64..512, 0..16),
        appends in 1usize..8,
    ) {
        let mut map: CaseFoldMap<u64> = CaseFoldMap::new();
        for i in &indexes {
            map.insert(i, 0);
        }

        let before = map.len();
        for n in 0..appends {
            map.append(n as u64 + 1);
        }

        prop_assert_eq!(map.len(), before + appends);
    }
}
