// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bucket membership index
//!
//! Accumulates row indices per bucket during the single sequential scan. When
//! a capacity is configured, a bucket that grows past it after an append is
//! moved wholesale into a new overflow segment `flush-<n>` and the live bucket
//! starts over empty, so no stored segment ever holds more than
//! `max_bucket_size + 1` rows.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SkyhookResult;
use crate::partition::jump_hash::{BucketId, ConsistentHasher};

/// Identifier of a row-index list held by a [`BucketIndex`]
///
/// Ordering puts all live buckets first (ascending id), then overflow
/// segments in flush order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentKey {
    /// Live bucket produced by the hasher
    Bucket(BucketId),
    /// Snapshot of a bucket taken when it overflowed
    Overflow(u64),
}

impl SegmentKey {
    pub fn is_overflow(&self) -> bool {
        matches!(self, SegmentKey::Overflow(_))
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKey::Bucket(id) => write!(f, "{}", id),
            SegmentKey::Overflow(n) => write!(f, "flush-{}", n),
        }
    }
}

/// Mapping from segment to the ordered row indices it holds
#[derive(Debug, Clone)]
pub struct BucketIndex {
    hasher: ConsistentHasher,
    max_bucket_size: Option<usize>,
    segments: BTreeMap<SegmentKey, Vec<usize>>,
    flush_counter: u64,
    rows_assigned: usize,
}

impl BucketIndex {
    /// Create an empty index
    ///
    /// `max_bucket_size` of `None` disables flushing.
    pub fn new(num_buckets: u32, max_bucket_size: Option<usize>) -> SkyhookResult<Self> {
        Ok(Self {
            hasher: ConsistentHasher::new(num_buckets)?,
            max_bucket_size,
            segments: BTreeMap::new(),
            flush_counter: 0,
            rows_assigned: 0,
        })
    }

    pub fn num_buckets(&self) -> u32 {
        self.hasher.num_buckets()
    }

    pub fn max_bucket_size(&self) -> Option<usize> {
        self.max_bucket_size
    }

    /// Hash `composite_key` and append `row_index` to the resulting bucket
    ///
    /// Returns the bucket and, if the append overflowed it, the overflow
    /// segment the bucket's rows were moved to.
    pub fn insert(&mut self, row_index: usize, composite_key: u64) -> (BucketId, Option<SegmentKey>) {
        let bucket_id = self.hasher.bucket(composite_key);
        let flushed = self.assign(row_index, bucket_id);
        (bucket_id, flushed)
    }

    /// Append `row_index` to `bucket_id`, flushing the bucket if it is now over capacity
    pub fn assign(&mut self, row_index: usize, bucket_id: BucketId) -> Option<SegmentKey> {
        debug_assert!(bucket_id < self.hasher.num_buckets());

        let rows = self.segments.entry(SegmentKey::Bucket(bucket_id)).or_default();
        rows.push(row_index);
        self.rows_assigned += 1;

        match self.max_bucket_size {
            Some(max) if rows.len() > max => {
                let overflow = SegmentKey::Overflow(self.flush_counter);
                let moved = std::mem::take(rows);
                log::debug!(
                    "bucket {} overflowed at {} rows, flushed to {}",
                    bucket_id,
                    moved.len(),
                    overflow
                );
                self.segments.insert(overflow, moved);
                self.flush_counter += 1;
                Some(overflow)
            }
            _ => None,
        }
    }

    /// Rows held by a segment
    pub fn get(&self, key: &SegmentKey) -> Option<&[usize]> {
        self.segments.get(key).map(|rows| rows.as_slice())
    }

    /// All segments in [`SegmentKey`] order, including empty live buckets
    pub fn iter(&self) -> impl Iterator<Item = (&SegmentKey, &[usize])> {
        self.segments.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Segments that hold at least one row
    pub fn non_empty(&self) -> impl Iterator<Item = (&SegmentKey, &[usize])> {
        self.iter().filter(|(_, rows)| !rows.is_empty())
    }

    /// Number of segments, including empty live buckets
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of overflow segments created so far
    pub fn flush_count(&self) -> u64 {
        self.flush_counter
    }

    /// Number of rows appended so far
    pub fn rows_assigned(&self) -> usize {
        self.rows_assigned
    }

    /// Consume the index, yielding every segment in [`SegmentKey`] order
    pub fn into_segments(self) -> BTreeMap<SegmentKey, Vec<usize>> {
        self.segments
    }
}
