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

//! Partitioning operations
//!
//! Rows are placed by jump consistent hashing of a composite key built from
//! one or two integer key columns.

pub mod bucket_index;
pub mod column_partition;
pub mod jump_hash;
pub mod key_extractor;
pub mod row_partitioner;

pub use bucket_index::{BucketIndex, SegmentKey};
pub use column_partition::{partition_columns, ColumnObject};
pub use jump_hash::{composite_key, jump_consistent_hash, BucketId, ConsistentHasher};
pub use key_extractor::{key_columns_from_schema, KeyExtractor, KeyTuple, KEY_METADATA};
pub use row_partitioner::{RowPartitioner, WriteSummary, WrittenObject};
