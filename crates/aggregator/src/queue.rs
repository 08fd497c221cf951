use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use oru_primitives::tx::TransactionResult;

/// Heap entry ordered by transaction number only.
#[derive(Debug)]
struct Entry(TransactionResult);

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0.transaction_number == other.0.transaction_number
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.transaction_number.cmp(&other.0.transaction_number)
    }
}

/// Min-queue of results waiting for their predecessors.
#[derive(Debug, Default)]
pub(crate) struct ResultQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl ResultQueue {
    pub(crate) fn push(&mut self, result: TransactionResult) {
        self.heap.push(Reverse(Entry(result)));
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    fn peek_number(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.0 .0.transaction_number)
    }

    /// Discards results numbered below `expected`, then pops the minimum if
    /// it is numbered exactly `expected`. Returns the number of discarded
    /// results too.
    pub(crate) fn pop_next(&mut self, expected: u64) -> (Option<TransactionResult>, usize) {
        let mut dropped = 0;
        while self.peek_number().is_some_and(|n| n < expected) {
            self.heap.pop();
            dropped += 1;
        }

        if self.peek_number() == Some(expected) {
            (self.heap.pop().map(|e| e.0 .0), dropped)
        } else {
            (None, dropped)
        }
    }
}

#[cfg(test)]
mod tests {
    use oru_test_utils::ArbitraryGenerator;

    use super::*;

    fn result(n: u64, gen: &ArbitraryGenerator) -> TransactionResult {
        let mut r: TransactionResult = gen.generate();
        r.transaction_number = n;
        r
    }

    #[test]
    fn test_pops_in_order_with_gap() {
        let gen = ArbitraryGenerator::new();
        let mut q = ResultQueue::default();
        q.push(result(3, &gen));
        q.push(result(1, &gen));

        assert_eq!(q.pop_next(1).0.map(|r| r.transaction_number), Some(1));
        assert!(q.pop_next(2).0.is_none(), "gap at 2");
        assert_eq!(q.len(), 1);

        q.push(result(2, &gen));
        assert_eq!(q.pop_next(2).0.map(|r| r.transaction_number), Some(2));
        assert_eq!(q.pop_next(3).0.map(|r| r.transaction_number), Some(3));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_drops_stale() {
        let gen = ArbitraryGenerator::new();
        let mut q = ResultQueue::default();
        q.push(result(4, &gen));
        q.push(result(4, &gen));
        q.push(result(5, &gen));

        let (next, dropped) = q.pop_next(5);
        assert_eq!(dropped, 2);
        assert_eq!(next.map(|r| r.transaction_number), Some(5));
    }
}
