use crate::domain::model::ChunkHeader;
use std::ops::Range;

/// Element ranges of a chunked transfer, in transmission order.
///
/// Every range holds `max_chunk_len` elements except possibly the last one.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    total_len: usize,
    max_chunk_len: usize,
    next: usize,
}

impl ChunkPlan {
    pub fn new(total_len: usize, max_chunk_len: usize) -> Self {
        Self {
            total_len,
            max_chunk_len: max_chunk_len.max(1),
            next: 0,
        }
    }

    pub fn from_header(header: &ChunkHeader) -> Self {
        Self::new(header.total_len, header.max_chunk_len)
    }
}

impl Iterator for ChunkPlan {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next >= self.total_len {
            return None;
        }
        let begin = self.next;
        let end = begin.saturating_add(self.max_chunk_len).min(self.total_len);
        self.next = end;
        Some(begin..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total_len - self.next).div_ceil(self.max_chunk_len);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkPlan {}
