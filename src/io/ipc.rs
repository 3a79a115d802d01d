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

//! Arrow IPC stream framing for stored objects
//!
//! Every object is one Arrow IPC stream: the schema message once, followed by
//! zero or more record batch messages and the end-of-stream marker. A stream
//! with zero batches is a valid empty result.

use std::io::Cursor;

use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;

use crate::config::DEFAULT_MAX_BATCH_ROWS;
use crate::error::{SkyhookError, SkyhookResult};
use crate::table::Table;

/// Encodes tables as fully buffered IPC streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSerializer {
    max_batch_rows: usize,
}

impl Default for BatchSerializer {
    fn default() -> Self {
        Self {
            max_batch_rows: DEFAULT_MAX_BATCH_ROWS,
        }
    }
}

impl BatchSerializer {
    /// Create a serializer that emits batches of at most `max_batch_rows` rows
    pub fn new(max_batch_rows: usize) -> SkyhookResult<Self> {
        if max_batch_rows == 0 {
            return Err(SkyhookError::Invalid(
                "max_batch_rows must be >= 1".to_string(),
            ));
        }
        Ok(Self { max_batch_rows })
    }

    pub fn max_batch_rows(&self) -> usize {
        self.max_batch_rows
    }

    /// Serialize a table into one IPC stream
    ///
    /// Source batches larger than the batch limit are split; zero-row batches
    /// are dropped, so an empty table yields a schema-only stream.
    pub fn serialize(&self, table: &Table) -> SkyhookResult<Vec<u8>> {
        let mut buffer = Vec::new();

        {
            let mut writer = StreamWriter::try_new(&mut buffer, &table.schema())
                .map_err(|e| SkyhookError::Serialization(format!(
                    "Failed to create IPC writer: {}", e
                )))?;

            for (i, batch) in table.batches().iter().enumerate() {
                let mut offset = 0;
                while offset < batch.num_rows() {
                    let len = self.max_batch_rows.min(batch.num_rows() - offset);
                    writer.write(&batch.slice(offset, len))
                        .map_err(|e| SkyhookError::Serialization(format!(
                            "Failed to write batch {} at row {}: {}", i, offset, e
                        )))?;
                    offset += len;
                }
            }

            writer.finish()
                .map_err(|e| SkyhookError::Serialization(format!(
                    "Failed to finish writing: {}", e
                )))?;
        }

        Ok(buffer)
    }
}

/// Serialize a table with the default batch limit
pub fn serialize_table(table: &Table) -> SkyhookResult<Vec<u8>> {
    BatchSerializer::default().serialize(table)
}

/// Deserialize an IPC stream back into a table
///
/// The schema comes from the stream header, so a zero-batch stream decodes to
/// an empty table with the original schema.
pub fn deserialize_table(data: &[u8]) -> SkyhookResult<Table> {
    let reader = StreamReader::try_new(Cursor::new(data), None)
        .map_err(|e| SkyhookError::Serialization(format!(
            "Failed to create IPC reader: {}", e
        )))?;
    let schema = reader.schema();

    let mut batches = Vec::new();
    for result in reader {
        let batch = result.map_err(|e| SkyhookError::Serialization(format!(
            "Failed to read batch: {}", e
        )))?;
        batches.push(batch);
    }

    Table::try_new(schema, batches)
}
