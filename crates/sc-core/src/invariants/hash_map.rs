//! Separate-chaining hash map invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | NoDuplicateKeys | A key is stored at most once across all buckets |
//! | BucketPlacement | Every key lives in the bucket its hash selects |
//! | LoadFactorBounded | `len <= bucket_count * load_factor` |
//! | SizeMatchesEntries | `len` equals the number of stored entries |

use std::collections::HashSet;

use crate::property::{PropertyChecker, PropertyResult};

const STRUCTURE: &str = "hash_map";

/// Bucket layout of a map, keys only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketView {
    pub declared_len: usize,
    pub load_factor: f64,
    /// Keys stored in each bucket, in bucket order.
    pub buckets: Vec<Vec<u64>>,
    /// Keys whose hash selects a different bucket than the one holding them.
    pub misplaced: Vec<u64>,
}

/// Implemented by maps that can expose their bucket layout.
pub trait HashMapProperties {
    fn bucket_view(&self) -> BucketView;
}

/// Property checker for hash map implementations.
pub struct HashMapPropertyChecker<'a, T: HashMapProperties> {
    map: &'a T,
}

impl<'a, T: HashMapProperties> HashMapPropertyChecker<'a, T> {
    #[must_use]
    pub fn new(map: &'a T) -> Self {
        Self { map }
    }

    fn check_no_duplicate_keys(&self, view: &BucketView) -> PropertyResult {
        let mut seen = HashSet::new();
        for key in view.buckets.iter().flatten() {
            if !seen.insert(*key) {
                return PropertyResult::fail(
                    "NoDuplicateKeys",
                    STRUCTURE,
                    format!("key {} stored more than once", key),
                    None,
                );
            }
        }
        PropertyResult::pass("NoDuplicateKeys", STRUCTURE)
    }

    fn check_bucket_placement(&self, view: &BucketView) -> PropertyResult {
        match view.misplaced.first() {
            None => PropertyResult::pass("BucketPlacement", STRUCTURE),
            Some(key) => PropertyResult::fail(
                "BucketPlacement",
                STRUCTURE,
                format!(
                    "key {} is not in its hash bucket ({} misplaced)",
                    key,
                    view.misplaced.len()
                ),
                None,
            ),
        }
    }

    fn check_load_factor(&self, view: &BucketView) -> PropertyResult {
        let bound = view.buckets.len() as f64 * view.load_factor;
        if view.declared_len as f64 <= bound {
            PropertyResult::pass("LoadFactorBounded", STRUCTURE)
        } else {
            PropertyResult::fail(
                "LoadFactorBounded",
                STRUCTURE,
                format!(
                    "{} entries in {} buckets exceeds load factor {}",
                    view.declared_len,
                    view.buckets.len(),
                    view.load_factor
                ),
                None,
            )
        }
    }

    fn check_size_matches_entries(&self, view: &BucketView) -> PropertyResult {
        let stored: usize = view.buckets.iter().map(Vec::len).sum();
        if stored == view.declared_len {
            PropertyResult::pass("SizeMatchesEntries", STRUCTURE)
        } else {
            PropertyResult::fail(
                "SizeMatchesEntries",
                STRUCTURE,
                format!("len is {} but {} entries are stored", view.declared_len, stored),
                None,
            )
        }
    }
}

impl<'a, T: HashMapProperties> PropertyChecker for HashMapPropertyChecker<'a, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        let view = self.map.bucket_view();
        vec![
            self.check_no_duplicate_keys(&view),
            self.check_bucket_placement(&view),
            self.check_load_factor(&view),
            self.check_size_matches_entries(&view),
        ]
    }
}
