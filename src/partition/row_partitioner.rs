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

//! Row partitioning runs
//!
//! A run has two phases:
//!
//! 1. A sequential scan assigns every row to a bucket and builds the
//!    [`BucketIndex`]. Nothing is written during the scan, so a fatal key
//!    error leaves the sink untouched.
//! 2. Each non-empty segment is sliced out of the table, encoded as an IPC
//!    stream and stored. Segments are independent, so writes run
//!    concurrently up to `max_concurrent_writes`.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::PartitionConfig;
use crate::error::{SkyhookError, SkyhookResult, WriteFailure};
use crate::io::ipc::BatchSerializer;
use crate::io::sink::{ObjectNaming, ObjectSink};
use crate::partition::bucket_index::{BucketIndex, SegmentKey};
use crate::partition::key_extractor::KeyExtractor;
use crate::table::{RowSlicer, Table};

/// An object stored for one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenObject {
    pub segment: SegmentKey,
    pub object_name: String,
    pub rows: usize,
    pub bytes: usize,
}

/// Outcome of the write phase
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    /// Rows assigned during the scan
    pub rows_scanned: usize,
    /// Stored objects in segment order
    pub written: Vec<WrittenObject>,
    /// Segments skipped because they held no rows
    pub skipped_empty: usize,
    /// Non-empty segments never dispatched because the run was cancelled
    pub not_dispatched: usize,
}

impl WriteSummary {
    pub fn bytes_written(&self) -> usize {
        self.written.iter().map(|w| w.bytes).sum()
    }

    pub fn rows_written(&self) -> usize {
        self.written.iter().map(|w| w.rows).sum()
    }

    pub fn object_names(&self) -> Vec<&str> {
        self.written.iter().map(|w| w.object_name.as_str()).collect()
    }

    /// Whether every non-empty segment was dispatched
    pub fn is_complete(&self) -> bool {
        self.not_dispatched == 0
    }
}

/// Hash partitioner for the rows of a table
pub struct RowPartitioner {
    config: PartitionConfig,
    num_buckets: u32,
    serializer: BatchSerializer,
    naming: ObjectNaming,
}

impl RowPartitioner {
    /// Create a partitioner; fails if the config is invalid
    pub fn new(config: PartitionConfig) -> SkyhookResult<Self> {
        config.validate()?;
        let num_buckets = config.bucket_count()?;
        let serializer = BatchSerializer::new(config.max_batch_rows)?;
        let naming = ObjectNaming::new(config.object_prefix.clone());

        Ok(Self {
            config,
            num_buckets,
            serializer,
            naming,
        })
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub fn naming(&self) -> &ObjectNaming {
        &self.naming
    }

    /// Scan the table and assign every row to a segment
    ///
    /// Scans `min(max_rows_to_process, table.rows())` rows in order. Any key
    /// error aborts the scan; the partial index is dropped.
    pub fn build_index(&self, table: &Table) -> SkyhookResult<BucketIndex> {
        let extractor = KeyExtractor::try_new(
            table,
            &self.config.key_column,
            self.config.secondary_key_column.as_deref(),
        )?;

        let rows = match self.config.max_rows_to_process {
            Some(max_rows) => max_rows.min(extractor.rows()),
            None => extractor.rows(),
        };

        let mut index = BucketIndex::new(self.num_buckets, self.config.max_bucket_size)?;
        for row in 0..rows {
            let key = extractor.composite_key(row)?;
            index.insert(row, key);
        }

        log::info!(
            "assigned {} rows to {} buckets ({} overflow segments)",
            index.rows_assigned(),
            self.num_buckets,
            index.flush_count()
        );
        Ok(index)
    }

    /// Store every non-empty segment of `index` in `sink`
    ///
    /// Once `cancel` fires no further segment is dispatched; writes already
    /// started run to completion. Failed writes do not stop the remaining
    /// ones; if any failed, the run returns [`SkyhookError::SegmentWrites`].
    pub async fn write_segments(
        &self,
        table: Arc<Table>,
        index: BucketIndex,
        sink: Arc<dyn ObjectSink>,
        cancel: &CancellationToken,
    ) -> SkyhookResult<WriteSummary> {
        let mut summary = WriteSummary {
            rows_scanned: index.rows_assigned(),
            ..Default::default()
        };

        let slicer = Arc::new(RowSlicer::new(&table)?);
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_writes));
        let mut tasks = JoinSet::new();
        let mut dispatched: Vec<(SegmentKey, String)> = Vec::new();

        let mut segments = index.into_segments().into_iter();
        while let Some((segment, rows)) = segments.next() {
            if rows.is_empty() {
                summary.skipped_empty += 1;
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => Some(permit.map_err(|e| {
                    SkyhookError::Invalid(format!("write semaphore closed: {}", e))
                })?),
            };
            let permit = match permit {
                Some(permit) => permit,
                None => {
                    summary.not_dispatched =
                        1 + segments.by_ref().filter(|(_, r)| !r.is_empty()).count();
                    log::warn!(
                        "partitioning cancelled, {} segments not written",
                        summary.not_dispatched
                    );
                    break;
                }
            };

            let object_name = self.naming.segment_object(&segment);
            dispatched.push((segment, object_name.clone()));

            let slicer = slicer.clone();
            let serializer = self.serializer;
            let sink = sink.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let row_count = rows.len();
                let result = write_segment(slicer, serializer, sink.as_ref(), &object_name, rows).await;
                (segment, object_name, row_count, result)
            });
        }

        let mut failures = Vec::new();
        let mut finished = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            let (segment, object_name, rows, result) = match joined {
                Ok(outcome) => outcome,
                // The segment is reported as aborted below
                Err(e) => {
                    log::error!("segment write task failed: {}", e);
                    continue;
                }
            };
            finished.insert(segment);

            match result {
                Ok(bytes) => {
                    log::debug!("wrote {} ({} rows, {} bytes)", object_name, rows, bytes);
                    summary.written.push(WrittenObject {
                        segment,
                        object_name,
                        rows,
                        bytes,
                    });
                }
                Err(error) => {
                    log::warn!("failed to write {}: {}", object_name, error);
                    failures.push(WriteFailure {
                        object_name,
                        segment: Some(segment),
                        error,
                    });
                }
            }
        }

        for (segment, object_name) in dispatched {
            if !finished.contains(&segment) {
                failures.push(WriteFailure {
                    error: SkyhookError::sink(object_name.clone(), "write task aborted"),
                    object_name,
                    segment: Some(segment),
                });
            }
        }

        summary.written.sort_by_key(|w| w.segment);
        failures.sort_by_key(|f| f.segment);

        log::info!(
            "wrote {} objects ({} bytes) to {}, {} empty segments skipped",
            summary.written.len(),
            summary.bytes_written(),
            sink.location(),
            summary.skipped_empty
        );

        if !failures.is_empty() {
            return Err(SkyhookError::SegmentWrites {
                written: summary.written.len(),
                failures,
            });
        }
        Ok(summary)
    }

    /// Scan `table` and store its segments in `sink`
    pub async fn run(
        &self,
        table: Arc<Table>,
        sink: Arc<dyn ObjectSink>,
        cancel: &CancellationToken,
    ) -> SkyhookResult<WriteSummary> {
        let index = self.build_index(&table)?;
        self.write_segments(table, index, sink, cancel).await
    }
}

/// Slice, encode and store one segment; returns the payload size
async fn write_segment(
    slicer: Arc<RowSlicer>,
    serializer: BatchSerializer,
    sink: &dyn ObjectSink,
    object_name: &str,
    rows: Vec<usize>,
) -> SkyhookResult<usize> {
    let payload = tokio::task::spawn_blocking(move || {
        let sub_table = slicer.slice(&rows)?;
        serializer.serialize(&sub_table)
    })
    .await
    .map_err(|e| SkyhookError::Serialization(format!("encode task failed: {}", e)))??;

    let bytes = payload.len();
    sink.put(object_name, payload).await?;
    Ok(bytes)
}
