use std::num::NonZeroUsize;

/// Split `lines` into contiguous chunks of at most `chunk_size` lines.
///
/// Order is preserved and only the last chunk can be shorter. Empty input
/// yields no chunks.
pub fn partition<T>(lines: Vec<T>, chunk_size: NonZeroUsize) -> Vec<Vec<T>> {
    let size = chunk_size.get();
    let mut chunks = Vec::with_capacity(lines.len().div_ceil(size));
    let mut lines = lines.into_iter();

    loop {
        let chunk: Vec<T> = lines.by_ref().take(size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_partition_shapes() {
        for total in 0..20usize {
            for chunk_size in 1..8usize {
                let lines: Vec<usize> = (0..total).collect();
                let chunks = partition(lines.clone(), size(chunk_size));

                assert_eq!(chunks.len(), total.div_ceil(chunk_size));
                assert_eq!(chunks.concat(), lines);
                if let Some((last, rest)) = chunks.split_last() {
                    assert!(rest.iter().all(|chunk| chunk.len() == chunk_size));
                    assert!(!last.is_empty() && last.len() <= chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_partition_remainder() {
        let lines = vec!["a", "b", "c", "d", "e"];
        let chunks = partition(lines, size(2));
        assert_eq!(chunks, vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    }

    #[test]
    fn test_partition_empty() {
        let chunks = partition(Vec::<String>::new(), size(100));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_partition_single_chunk() {
        let lines = vec!["a".to_string(), "b".to_string()];
        let chunks = partition(lines.clone(), size(100));
        assert_eq!(chunks, vec![lines]);
    }
}
