use crate::{BatchError, BatchResult};

/// Split `items` into order-preserving chunks of at most `chunk_size`
///
/// Every chunk has exactly `chunk_size` items except the last, which holds
/// the remainder.
pub fn partition<T: Clone>(items: &[T], chunk_size: usize) -> BatchResult<Vec<Vec<T>>> {
    if chunk_size == 0 {
        return Err(BatchError::Validation(
            "chunk size must be at least 1".to_string(),
        ));
    }

    Ok(items.chunks(chunk_size).map(<[T]>::to_vec).collect())
}

/// Number of chunks `partition` produces for `len` items
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    len.div_ceil(chunk_size)
}
