// ============================================================
// Layer 3 — Conversation Domain Types
// ============================================================
// A conversation row is tokenised into an EncodedSegment
// (prompt ids + answer ids). Segments of a row and its
// ancestors form a TurnChain, ordered from the earliest
// ancestor to the target row.

use std::collections::VecDeque;

/// Label value excluded from the loss.
pub const IGNORE_INDEX: i64 = -100;

/// Tokenised prompt and answer of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedSegment {
    pub prompt_ids: Vec<i64>,
    pub answer_ids: Vec<i64>,
}

impl EncodedSegment {
    pub fn new(prompt_ids: Vec<i64>, answer_ids: Vec<i64>) -> Self {
        Self { prompt_ids, answer_ids }
    }

    pub fn len(&self) -> usize {
        self.prompt_ids.len() + self.answer_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered segments, ancestor first, target row last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnChain {
    segments: VecDeque<EncodedSegment>,
}

impl TurnChain {
    /// A chain holding only the target row's segment.
    pub fn new(target: EncodedSegment) -> Self {
        Self { segments: VecDeque::from([target]) }
    }

    /// Insert an older turn in front of the chain.
    pub fn prepend(&mut self, segment: EncodedSegment) {
        self.segments.push_front(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &EncodedSegment> {
        self.segments.iter()
    }

    /// prompt + answer of every segment, in chain order.
    pub fn input_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.token_count());
        for seg in &self.segments {
            ids.extend_from_slice(&seg.prompt_ids);
            ids.extend_from_slice(&seg.answer_ids);
        }
        ids
    }

    /// `true` on prompt positions, `false` on answer positions.
    pub fn prompt_mask(&self) -> Vec<bool> {
        let mut mask = Vec::with_capacity(self.token_count());
        for seg in &self.segments {
            mask.extend(std::iter::repeat(true).take(seg.prompt_ids.len()));
            mask.extend(std::iter::repeat(false).take(seg.answer_ids.len()));
        }
        mask
    }

    /// Same as `input_ids` but without the last segment's answer:
    /// all prior context plus the current prompt.
    pub fn prompt_only_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.token_count());
        let last = self.segments.len().saturating_sub(1);
        for (i, seg) in self.segments.iter().enumerate() {
            ids.extend_from_slice(&seg.prompt_ids);
            if i != last {
                ids.extend_from_slice(&seg.answer_ids);
            }
        }
        ids
    }

    pub fn token_count(&self) -> usize {
        self.segments.iter().map(EncodedSegment::len).sum()
    }
}
