//! Kani proof harnesses for the linked list.
//!
//! Bounded model checking of the sequential contract. Concurrency is
//! covered by the loom tests in `linked_list` and by `sc-model`.
//!
//! ```bash
//! cargo kani -p sc-containers
//! cargo kani -p sc-containers --harness proof_delete_shifts_indices
//! ```

#[cfg(kani)]
mod proofs {
    use crate::linked_list::LinkedListContainer;
    use sc_core::ContainerError;

    /// Any index at or past `size` is rejected by both `get` and `delete`.
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_out_of_range_rejected() {
        let list = LinkedListContainer::new();
        let len: usize = kani::any();
        kani::assume(len <= 3);
        for i in 0..len {
            list.add(i as u64);
        }

        let index: usize = kani::any();
        kani::assume(index >= len);

        let expected = Err(ContainerError::IndexOutOfBounds { index, size: len });
        kani::assert(list.get(index) == expected, "get must reject out-of-range index");
        kani::assert(list.delete(index) == expected, "delete must reject out-of-range index");
        kani::assert(list.size() == len, "failed delete must not change size");
    }

    /// Deleting index `k` of [0, 1, 2] shifts later elements down by one.
    #[kani::proof]
    #[kani::unwind(5)]
    fn proof_delete_shifts_indices() {
        let list = LinkedListContainer::new();
        for i in 0..3_u64 {
            list.add(i);
        }

        let k: usize = kani::any();
        kani::assume(k < 3);

        kani::assert(list.delete(k) == Ok(k as u64), "delete returns the element at k");
        kani::assert(list.size() == 2, "size drops by one");
        for i in 0..2_usize {
            let old = if i < k { i } else { i + 1 };
            kani::assert(list.get(i) == Ok(old as u64), "indices shift after k");
        }
    }

    /// Every structural mutation advances the generation by exactly one.
    #[kani::proof]
    #[kani::unwind(4)]
    fn proof_generation_counts_mutations() {
        let list = LinkedListContainer::new();
        let adds: u8 = kani::any();
        kani::assume(adds > 0 && adds <= 3);
        for i in 0..adds {
            list.add(u64::from(i));
        }
        kani::assert(list.modification_count() == u64::from(adds), "one step per add");

        let _ = list.delete(0);
        kani::assert(
            list.modification_count() == u64::from(adds) + 1,
            "one step per delete",
        );
        let _ = list.contains(&0);
        let _ = list.get(0);
        kani::assert(
            list.modification_count() == u64::from(adds) + 1,
            "reads leave the generation alone",
        );
    }
}
