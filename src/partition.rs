//! Block/remainder distribution of `total` items over `n` processes.
//!
//! Every rank gets `ceil(total / n)` consecutive items except at the tail:
//! the last non-empty rank takes the remainder and any rank past the end of
//! the data gets an empty block. The blocks of ranks `0..n` cover
//! `0..total` exactly once, in rank order.
//!
//! The same rule partitions matrix cells, interpolation rows, LU candidate
//! rows and LU columns.

use std::ops::Range;

/// Nominal block length, `ceil(total / n)`.
///
/// This is also the slot size every rank contributes to an equal-count
/// all-gather over the partition.
pub fn block_len(total: usize, n: usize) -> usize {
    total.div_ceil(n.max(1))
}

/// Items owned by `rank`.
pub fn block_range(total: usize, n: usize, rank: usize) -> Range<usize> {
    let chunk = block_len(total, n);
    let start = (chunk * rank).min(total);
    let finish = (start + chunk).min(total);
    start..finish
}

/// Items of the sub-range `from..to` owned by `rank`, in absolute indices.
pub fn block_range_in(from: usize, to: usize, n: usize, rank: usize) -> Range<usize> {
    let local = block_range(to.saturating_sub(from), n, rank);
    from + local.start..from + local.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_cover_exactly_once() {
        for total in 0..40 {
            for n in 1..9 {
                let mut next = 0;
                for rank in 0..n {
                    let r = block_range(total, n, rank);
                    assert_eq!(r.start, next, "total={} n={} rank={}", total, n, rank);
                    assert!(r.len() <= block_len(total, n));
                    next = r.end;
                }
                assert_eq!(next, total);
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_the_tail() {
        assert_eq!(block_range(10, 3, 0), 0..4);
        assert_eq!(block_range(10, 3, 1), 4..8);
        assert_eq!(block_range(10, 3, 2), 8..10);

        // ceil(5/4) = 2: ranks 0..2 are full, rank 3 is past the end.
        assert_eq!(block_range(5, 4, 2), 4..5);
        assert_eq!(block_range(5, 4, 3), 5..5);
    }

    #[test]
    fn test_sub_range() {
        assert_eq!(block_range_in(3, 10, 2, 0), 3..7);
        assert_eq!(block_range_in(3, 10, 2, 1), 7..10);
        assert_eq!(block_range_in(9, 9, 4, 2), 9..9);
    }
}
