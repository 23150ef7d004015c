//! Splitting a drained source into contiguous chunks

/// Number of elements per chunk for `len` elements.
///
/// An explicit `partition_size` wins; otherwise the size is chosen so that
/// at most `concurrency` chunks exist.
pub fn chunk_size(len: usize, concurrency: usize, partition_size: Option<usize>) -> usize {
    partition_size
        .unwrap_or_else(|| len.div_ceil(concurrency.max(1)))
        .max(1)
}

/// Split `data` into contiguous, disjoint chunks preserving encounter order
/// inside each chunk. The last chunk absorbs the remainder.
pub fn partition<T>(data: Vec<T>, concurrency: usize, partition_size: Option<usize>) -> Vec<Vec<T>> {
    let size = chunk_size(data.len(), concurrency, partition_size);
    let mut chunks = Vec::with_capacity(data.len().div_ceil(size));
    let mut elements = data.into_iter().peekable();
    while elements.peek().is_some() {
        chunks.push(elements.by_ref().take(size).collect());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_size_bounds_chunk_count() {
        let chunks = partition((1..=7).collect(), 3, None);
        assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn explicit_size_wins() {
        let chunks = partition((1..=7).collect(), 3, Some(2));
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.concat(), (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(partition(Vec::<i32>::new(), 4, None).is_empty());
    }

    #[test]
    fn more_workers_than_elements() {
        let chunks = partition(vec![1, 2], 8, None);
        assert_eq!(chunks, vec![vec![1], vec![2]]);
    }

    #[test]
    fn chunk_size_is_never_zero() {
        assert_eq!(chunk_size(0, 4, None), 1);
        assert_eq!(chunk_size(10, 4, None), 3);
        assert_eq!(chunk_size(10, 4, Some(5)), 5);
    }
}
