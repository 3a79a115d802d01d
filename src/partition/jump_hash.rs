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

//! Jump consistent hash placement
//!
//! Lamping & Veach, "A Fast, Minimal Memory, Consistent Hash Algorithm".
//! Growing the bucket count from `b` to `b + 1` moves only the keys that land
//! in the new bucket, an expected `1 / (b + 1)` of them.

use crate::error::{SkyhookError, SkyhookResult};

/// Bucket identifier in `[0, num_buckets)`
pub type BucketId = u32;

const JUMP_MULTIPLIER: u64 = 2_862_933_555_777_941_757;

/// Pack two 32-bit keys into one 64-bit key, first key in the high half
#[inline]
pub fn composite_key(key_a: u32, key_b: u32) -> u64 {
    ((key_a as u64) << 32) | key_b as u64
}

/// Map a 64-bit key onto one of `num_buckets` buckets
pub fn jump_consistent_hash(key: u64, num_buckets: u32) -> SkyhookResult<BucketId> {
    if num_buckets == 0 {
        return Err(SkyhookError::InvalidBucketCount(0));
    }
    Ok(jump(key, num_buckets))
}

// num_buckets >= 1
fn jump(mut key: u64, num_buckets: u32) -> BucketId {
    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < num_buckets as i64 {
        b = j;
        key = key.wrapping_mul(JUMP_MULTIPLIER).wrapping_add(1);
        j = ((b + 1) as f64 * ((1i64 << 31) as f64 / ((key >> 33) + 1) as f64)) as i64;
    }
    b as BucketId
}

/// Stateless hasher bound to a fixed bucket count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistentHasher {
    num_buckets: u32,
}

impl ConsistentHasher {
    pub fn new(num_buckets: u32) -> SkyhookResult<Self> {
        if num_buckets == 0 {
            return Err(SkyhookError::InvalidBucketCount(0));
        }
        Ok(Self { num_buckets })
    }

    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Bucket for a composite key
    #[inline]
    pub fn bucket(&self, composite_key: u64) -> BucketId {
        jump(composite_key, self.num_buckets)
    }

    /// Bucket for a pair of 32-bit keys
    #[inline]
    pub fn bucket_for(&self, key_a: u32, key_b: u32) -> BucketId {
        self.bucket(composite_key(key_a, key_b))
    }
}
