use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;
use std::ops::Bound;

type Map = ArtMap<Vec<u8>, u64, Bytes>;

fn validate_tree(t: &Map, m: &BTreeMap<Vec<u8>, u64>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "integrity issues: {issues:#?}\n{}", t.dump());
    assert_eq!(t.len(), m.len(), "len must match the reference map");

    let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.clone(), *v)).collect();
    let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
    assert_eq!(got, expected, "ascending iteration");

    let got: Vec<&Vec<u8>> = t.keys().rev().collect();
    let expected: Vec<&Vec<u8>> = m.keys().rev().collect();
    assert_eq!(got, expected, "descending iteration");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        // A tiny alphabet makes shared prefixes and keys that are byte
        // prefixes of other keys the common case.
        3 => prop::collection::vec(prop::sample::select(vec![0u8, 1, b'a', b'b', 0xFF]), 0..=6),
        // Long common runs push compressed paths past the stored limit.
        1 => (0usize..=24, prop::collection::vec(prop::sample::select(vec![0u8, b'x', b'y']), 0..=3))
            .prop_map(|(run, tail)| {
                let mut key = vec![b'/'; run];
                key.extend(tail);
                key
            }),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 8)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 5)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Navigate(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    Range(
        #[proptest(strategy = "key_strategy()")] Vec<u8>,
        bool,
        #[proptest(strategy = "key_strategy()")] Vec<u8>,
        bool,
    ),
    PopFirst,
    PopLast,
}

fn bound(key: &[u8], inclusive: bool) -> Bound<Vec<u8>> {
    if inclusive {
        Bound::Included(key.to_vec())
    } else {
        Bound::Excluded(key.to_vec())
    }
}

fn check_navigation(
    t: &Map,
    m: &BTreeMap<Vec<u8>, u64>,
    key: &[u8],
) -> std::result::Result<(), TestCaseError> {
    let owned = key.to_vec();
    prop_assert_eq!(
        t.floor_key(key).unwrap(),
        m.range(..=owned.clone()).next_back().map(|(k, _)| k)
    );
    prop_assert_eq!(
        t.lower_key(key).unwrap(),
        m.range(..owned.clone()).next_back().map(|(k, _)| k)
    );
    prop_assert_eq!(
        t.ceiling_key(key).unwrap(),
        m.range(owned.clone()..).next().map(|(k, _)| k)
    );
    prop_assert_eq!(
        t.higher_key(key).unwrap(),
        m.range((Bound::Excluded(owned), Bound::Unbounded)).next().map(|(k, _)| k)
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t: Map = ArtMap::new(Bytes);
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(key.clone(), value).unwrap();
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    let old_t = t.remove(&key).unwrap();
                    let old_m = m.remove(key.as_slice());
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key).unwrap(), m.get(key.as_slice()));
                    prop_assert_eq!(t.contains_key(&key).unwrap(), m.contains_key(key.as_slice()));
                }
                Op::Navigate(key) => {
                    check_navigation(&t, &m, &key)?;
                }
                Op::Range(lo, lo_inclusive, hi, hi_inclusive) => {
                    let start = bound(&lo, lo_inclusive);
                    let end = bound(&hi, hi_inclusive);
                    let got = t.range::<Vec<u8>, _>((start.clone(), end.clone()));
                    if lo > hi {
                        prop_assert!(matches!(got, Err(Error::InvalidArgument(_))));
                        continue;
                    }
                    let got: Vec<u64> = got.unwrap().map(|(_, v)| *v).collect();
                    let expected: Vec<u64> = if lo == hi && !(lo_inclusive && hi_inclusive) {
                        Vec::new()
                    } else {
                        m.range((start, end)).map(|(_, v)| *v).collect()
                    };
                    let got_rev: Vec<u64> = t
                        .range::<Vec<u8>, _>((bound(&lo, lo_inclusive), bound(&hi, hi_inclusive)))
                        .unwrap()
                        .rev()
                        .map(|(_, v)| *v)
                        .collect();
                    let mut expected_rev = expected.clone();
                    expected_rev.reverse();
                    prop_assert_eq!(got, expected);
                    prop_assert_eq!(got_rev, expected_rev);
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t, &m);
    }

    #[test]
    fn prop_walker_removal(
        keys in prop::collection::btree_set(key_strategy(), 0..=200),
        descending in any::<bool>(),
    ) {
        let mut t: Map = ArtMap::new(Bytes);
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        for (i, key) in keys.into_iter().enumerate() {
            t.insert(key.clone(), i as u64).unwrap();
            m.insert(key, i as u64);
        }

        let mut walker = if descending { t.walker_rev() } else { t.walker() };
        let mut seen = Vec::new();
        while let Some((key, value)) = walker.next(&t).unwrap() {
            seen.push(key.clone());
            if value % 3 != 0 {
                let (removed, _) = walker.remove(&mut t).unwrap();
                prop_assert!(m.remove(&removed).is_some());
            }
        }

        let mut expected = seen.clone();
        expected.sort();
        if descending {
            expected.reverse();
        }
        prop_assert_eq!(seen, expected);
        validate_tree(&t, &m);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn prefix_keys() -> Vec<Vec<u8>> {
    ["", "B", "BAR", "BARCA", "BARCALONA", "BAZ"]
        .iter()
        .map(|k| k.as_bytes().to_vec())
        .collect()
}

#[test]
fn exhaustive_insert_order_prefix_keys() {
    for_each_permutation(&prefix_keys(), |perm| {
        let mut t: Map = ArtMap::new(Bytes);
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(k.clone(), v).unwrap(), m.insert(k, v));
        }

        validate_tree(&t, &m);
        for probe in ["", "A", "B", "BA", "BARC", "BARCAL", "BARCALONAS", "BB", "C"] {
            let probe = probe.as_bytes();
            assert_eq!(
                t.floor_key(probe).unwrap(),
                m.range(..=probe.to_vec()).next_back().map(|(k, _)| k),
                "floor {probe:?}"
            );
            assert_eq!(
                t.higher_key(probe).unwrap(),
                m.range((Bound::Excluded(probe.to_vec()), Bound::Unbounded))
                    .next()
                    .map(|(k, _)| k),
                "higher {probe:?}"
            );
        }
    });
}

#[test]
fn exhaustive_remove_order_prefix_keys() {
    let keys = prefix_keys();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: Map = ArtMap::new(Bytes);
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        assert_eq!(base_tree.insert(k.clone(), v).unwrap(), base_map.insert(k.clone(), v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k).unwrap(), m.remove(k.as_slice()));
            validate_tree(&t, &m);
        }
        assert!(t.is_empty());
        assert_eq!(t.stats(), NodeStats::default());
    });
}

#[test]
fn exhaustive_remove_order_long_paths() {
    // Paths well past the stored prefix limit, diverging at several depths.
    let keys: Vec<Vec<u8>> = [10usize, 20, 30]
        .iter()
        .flat_map(|&at| {
            [b'p', b'q'].into_iter().map(move |b| {
                let mut k = vec![b'#'; 36];
                k[at] = b;
                k
            })
        })
        .collect();

    let mut base_tree: Map = ArtMap::new(Bytes);
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        base_tree.insert(k.clone(), i as u64).unwrap();
        base_map.insert(k.clone(), i as u64);
    }
    validate_tree(&base_tree, &base_map);

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();
        for k in perm {
            assert_eq!(t.remove(&k).unwrap(), m.remove(k.as_slice()));
            validate_tree(&t, &m);
        }
    });
}
