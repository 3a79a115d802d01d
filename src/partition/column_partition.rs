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

//! Column layout: one object per column
//!
//! Every column is projected into a single-column table and stored as its own
//! IPC stream under `<prefix>col-<column index>`. No hashing is involved.

use crate::config::PartitionConfig;
use crate::error::{SkyhookError, SkyhookResult, WriteFailure};
use crate::io::ipc::BatchSerializer;
use crate::io::sink::{ObjectNaming, ObjectSink};
use crate::table::Table;

/// An object stored for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnObject {
    pub column_index: usize,
    pub column_name: String,
    pub object_name: String,
    pub bytes: usize,
}

/// Store each column of `table` as its own object
///
/// Uses the object prefix and batch size of `config`; key and bucket settings
/// are ignored. Every column is attempted even if an earlier write failed.
pub async fn partition_columns(
    table: &Table,
    sink: &dyn ObjectSink,
    config: &PartitionConfig,
) -> SkyhookResult<Vec<ColumnObject>> {
    let serializer = BatchSerializer::new(config.max_batch_rows)?;
    let naming = ObjectNaming::new(config.object_prefix.clone());

    let mut written = Vec::with_capacity(table.columns());
    let mut failures = Vec::new();

    for (column_index, column_name) in table.column_names().into_iter().enumerate() {
        let object_name = naming.column_object(column_index);
        let payload = serializer.serialize(&table.project(&[column_index])?)?;
        let bytes = payload.len();

        match sink.put(&object_name, payload).await {
            Ok(()) => {
                log::debug!("wrote column {} to {} ({} bytes)", column_name, object_name, bytes);
                written.push(ColumnObject {
                    column_index,
                    column_name,
                    object_name,
                    bytes,
                });
            }
            Err(error) => {
                log::warn!("failed to write column {} to {}: {}", column_name, object_name, error);
                failures.push(WriteFailure {
                    object_name,
                    segment: None,
                    error,
                });
            }
        }
    }

    log::info!("wrote {} column objects to {}", written.len(), sink.location());

    if !failures.is_empty() {
        return Err(SkyhookError::SegmentWrites {
            written: written.len(),
            failures,
        });
    }
    Ok(written)
}
