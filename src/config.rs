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

//! Configuration types for partitioning runs.

use std::path::Path;

use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

use crate::error::{SkyhookError, SkyhookResult};
use crate::partition::key_extractor::key_columns_from_schema;

/// Default object name prefix
pub const DEFAULT_OBJECT_PREFIX: &str = "Object-";

/// Default number of rows per IPC record batch
pub const DEFAULT_MAX_BATCH_ROWS: usize = 64 * 1024;

/// Default number of segment writes in flight
pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 4;

fn default_object_prefix() -> String {
    DEFAULT_OBJECT_PREFIX.to_string()
}

fn default_max_batch_rows() -> usize {
    DEFAULT_MAX_BATCH_ROWS
}

fn default_max_concurrent_writes() -> usize {
    DEFAULT_MAX_CONCURRENT_WRITES
}

/// Main configuration for a partitioning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Primary key column (mandatory)
    pub key_column: String,
    /// Secondary key column; reads as 0 for every row when unset
    #[serde(default)]
    pub secondary_key_column: Option<String>,
    /// Number of buckets to hash into, in `[1, u32::MAX]`
    pub num_buckets: i64,
    /// Scan at most this many rows (clamped to the table size); all rows when unset
    #[serde(default)]
    pub max_rows_to_process: Option<usize>,
    /// Flush a bucket once it holds more than this many rows; never flush when unset
    #[serde(default)]
    pub max_bucket_size: Option<usize>,
    /// Prefix prepended to every object name
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,
    /// Rows per record batch in a written stream
    #[serde(default = "default_max_batch_rows")]
    pub max_batch_rows: usize,
    /// Segment writes allowed in flight at once
    #[serde(default = "default_max_concurrent_writes")]
    pub max_concurrent_writes: usize,
}

impl PartitionConfig {
    /// Create a new config keyed on one column
    pub fn new(key_column: impl Into<String>, num_buckets: i64) -> Self {
        Self {
            key_column: key_column.into(),
            secondary_key_column: None,
            num_buckets,
            max_rows_to_process: None,
            max_bucket_size: None,
            object_prefix: default_object_prefix(),
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
        }
    }

    /// Create a config from the key-flagged fields of a schema
    pub fn from_schema(schema: &Schema, num_buckets: i64) -> SkyhookResult<Self> {
        let (primary, secondary) = key_columns_from_schema(schema)?;
        let mut config = Self::new(primary, num_buckets);
        config.secondary_key_column = secondary;
        Ok(config)
    }

    /// Parse a JSON config
    pub fn from_json_str(json: &str) -> SkyhookResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> SkyhookResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SkyhookError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> SkyhookResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the secondary key column
    pub fn with_secondary_key(mut self, column: impl Into<String>) -> Self {
        self.secondary_key_column = Some(column.into());
        self
    }

    /// Cap the number of scanned rows
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows_to_process = Some(max_rows);
        self
    }

    /// Enable bucket flushing
    pub fn with_max_bucket_size(mut self, max_bucket_size: usize) -> Self {
        self.max_bucket_size = Some(max_bucket_size);
        self
    }

    /// Set the object name prefix
    pub fn with_object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = prefix.into();
        self
    }

    /// Set the rows per record batch
    pub fn with_max_batch_rows(mut self, rows: usize) -> Self {
        self.max_batch_rows = rows;
        self
    }

    /// Set the write concurrency
    pub fn with_max_concurrent_writes(mut self, writes: usize) -> Self {
        self.max_concurrent_writes = writes;
        self
    }

    /// Bucket count as accepted by the hasher
    pub fn bucket_count(&self) -> SkyhookResult<u32> {
        if self.num_buckets <= 0 || self.num_buckets > u32::MAX as i64 {
            return Err(SkyhookError::InvalidBucketCount(self.num_buckets));
        }
        Ok(self.num_buckets as u32)
    }

    /// Check the config before any row is scanned
    pub fn validate(&self) -> SkyhookResult<()> {
        if self.key_column.is_empty() {
            return Err(SkyhookError::MissingPrimaryKey("<unset>".to_string()));
        }
        self.bucket_count()?;
        if self.max_batch_rows == 0 {
            return Err(SkyhookError::Invalid(
                "max_batch_rows must be >= 1".to_string(),
            ));
        }
        if self.max_concurrent_writes == 0 {
            return Err(SkyhookError::Invalid(
                "max_concurrent_writes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
