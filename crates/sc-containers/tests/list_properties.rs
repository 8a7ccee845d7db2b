//! Property tests for the list contract and the map contract.

#![cfg(not(loom))]

use proptest::prelude::*;

use sc_containers::{ContainerError, HashMapLesson, LinkedListContainer, MapConfig};
use sc_core::{HashMapPropertyChecker, LinkedListPropertyChecker, ListHistory, PropertyChecker};

fn filled(values: &[u64]) -> LinkedListContainer<u64> {
    let list = LinkedListContainer::new();
    for v in values {
        list.add(*v);
    }
    list
}

/// Any configuration `MapConfig::validate` accepts.
fn map_config_strategy() -> impl Strategy<Value = MapConfig> {
    (0..6_u32, 1..=100_u32).prop_map(|(shift, percent)| MapConfig {
        initial_capacity: 1 << shift,
        load_factor: f64::from(percent) / 100.0,
    })
}

#[derive(Debug, Clone)]
enum Op {
    Add(u64),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..50_u64).prop_map(Op::Add),
        (0..20_usize).prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn append_then_read(values in prop::collection::vec(any::<u64>(), 0..64)) {
        let list = filled(&values);
        prop_assert_eq!(list.size(), values.len());
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(list.get(i), Ok(*v));
        }
    }

    #[test]
    fn delete_shifts_indices(values in prop::collection::vec(any::<u64>(), 1..32), k in any::<prop::sample::Index>()) {
        let list = filled(&values);
        let k = k.index(values.len());

        prop_assert_eq!(list.delete(k), Ok(values[k]));
        prop_assert_eq!(list.size(), values.len() - 1);
        for i in 0..list.size() {
            let old = if i < k { values[i] } else { values[i + 1] };
            prop_assert_eq!(list.get(i), Ok(old));
        }
    }

    #[test]
    fn out_of_range_boundary(values in prop::collection::vec(any::<u64>(), 0..16), extra in 0..8_usize) {
        let list = filled(&values);
        let size = values.len();
        for index in [size, size + extra, usize::MAX] {
            let expected = Err(ContainerError::IndexOutOfBounds { index, size });
            prop_assert_eq!(list.get(index), expected.clone());
            prop_assert_eq!(list.delete(index), expected);
        }
        prop_assert_eq!(list.size(), size);
    }

    #[test]
    fn containment_matches_get(values in prop::collection::vec(0..10_u64, 0..16), probe in 0..12_u64) {
        let list = filled(&values);
        let by_get = (0..list.size()).any(|i| list.get(i) == Ok(probe));
        prop_assert_eq!(list.contains(&probe), by_get);
    }

    #[test]
    fn exhaustion_yields_chain_order(values in prop::collection::vec(any::<u64>(), 0..32)) {
        let list = filled(&values);
        let mut iter = list.iter();
        for v in &values {
            prop_assert_eq!(iter.next_element(), Ok(*v));
        }
        prop_assert_eq!(iter.next_element(), Err(ContainerError::NoSuchElement));
    }

    #[test]
    fn any_mutation_invalidates(values in prop::collection::vec(any::<u64>(), 1..16), delete in any::<bool>()) {
        let list = filled(&values);
        let mut iter = list.iter();
        if delete {
            list.delete(0).unwrap();
        } else {
            list.add(0);
        }
        let is_modification_error = matches!(
            iter.has_next(),
            Err(ContainerError::ConcurrentModification { .. })
        );
        prop_assert!(is_modification_error);
        let is_modification_error = matches!(
            iter.next_element(),
            Err(ContainerError::ConcurrentModification { .. })
        );
        prop_assert!(is_modification_error);
    }

    #[test]
    fn random_ops_match_model(ops in prop::collection::vec(op_strategy(), 0..128)) {
        let list = LinkedListContainer::new();
        let mut model: Vec<u64> = Vec::new();
        let mut history = ListHistory::new();

        for op in ops {
            match op {
                Op::Add(v) => {
                    list.add(v);
                    model.push(v);
                    history.record_add(v, list.modification_count());
                }
                Op::Delete(i) => {
                    let result = list.delete(i);
                    if i < model.len() {
                        let expected = model.remove(i);
                        prop_assert_eq!(result, Ok(expected));
                        history.record_delete(expected, list.modification_count());
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
            }
        }

        prop_assert_eq!(list.to_vec(), model);
        let checker = LinkedListPropertyChecker::new(&list).with_history(&history);
        prop_assert!(checker.all_hold(), "{}", checker.report());
    }

    #[test]
    fn map_matches_std(
        config in map_config_strategy(),
        ops in prop::collection::vec((any::<bool>(), 0..64_u64), 0..256),
    ) {
        let mut map = HashMapLesson::with_config(config).unwrap();
        let mut model = std::collections::HashMap::new();
        for (insert, key) in ops {
            if insert {
                let fresh = !model.contains_key(&key);
                if fresh {
                    model.insert(key, key + 1);
                }
                prop_assert_eq!(map.insert(key, key + 1), fresh);
            } else {
                prop_assert_eq!(map.delete(&key), model.remove(&key));
            }
        }
        prop_assert_eq!(map.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
        let checker = HashMapPropertyChecker::new(&map);
        prop_assert!(checker.all_hold(), "{}", checker.report());
    }
}
