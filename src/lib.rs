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

//! Skyhook: deterministic row partitioning into Arrow IPC objects
//!
//! Rows of an Arrow table are placed into buckets by jump consistent hashing
//! of one or two integer key columns. Buckets that outgrow a configured
//! capacity are split off into overflow segments. Each segment is stored as
//! one self-describing Arrow IPC stream in an [`io::ObjectSink`].

pub mod config;
pub mod error;
pub mod io;
pub mod partition;
pub mod table;
pub mod util;

// Re-export commonly used types
pub use crate::config::PartitionConfig;
pub use crate::error::{Code, SkyhookError, SkyhookResult, WriteFailure};
pub use crate::io::{FileSystemSink, MemorySink, ObjectNaming, ObjectSink};
pub use crate::partition::{BucketIndex, RowPartitioner, SegmentKey, WriteSummary};
pub use crate::table::Table;

pub use tokio_util::sync::CancellationToken;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
