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

//! Table - the columnar input of a partitioning run
//!
//! A table is an Arrow schema plus an ordered list of record batches sharing
//! that schema. Row indices are global: row `i` of the second batch is
//! `first_batch.num_rows() + i`.

use std::sync::Arc;
use arrow::array::{ArrayRef, RecordBatch};
use arrow::compute::{concat, concat_batches};
use arrow::datatypes::SchemaRef;

use crate::error::{SkyhookError, SkyhookResult};

pub mod slicer;
pub use slicer::RowSlicer;

/// Immutable, column-oriented dataset
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Create a table from a schema and batches that all carry that schema
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> SkyhookResult<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.schema() != schema {
                return Err(SkyhookError::Invalid(format!(
                    "Batch {} schema does not match table schema",
                    i
                )));
            }
        }

        Ok(Self { schema, batches })
    }

    /// Create a zero-row table
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    /// Create a table from a single Arrow RecordBatch
    pub fn from_record_batch(batch: RecordBatch) -> SkyhookResult<Self> {
        Ok(Self::from(batch))
    }

    /// Create a table from multiple Arrow RecordBatches
    ///
    /// The schema is taken from the first batch, so the list must not be empty.
    pub fn from_record_batches(batches: Vec<RecordBatch>) -> SkyhookResult<Self> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| SkyhookError::Invalid("Cannot infer schema from zero batches".to_string()))?;
        Self::try_new(schema, batches)
    }

    /// Get the number of columns
    pub fn columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Get the number of rows
    pub fn rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    /// Check if table is empty
    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Get the schema
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    /// Get the number of batches in the table
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    /// Get a reference to a specific batch
    pub fn batch(&self, index: usize) -> Option<&RecordBatch> {
        self.batches.get(index)
    }

    /// Get all batches
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Whole column by name, with chunks concatenated into one array
    ///
    /// Returns `Ok(None)` when the schema has no such column.
    pub fn column_by_name(&self, name: &str) -> SkyhookResult<Option<ArrayRef>> {
        let idx = match self.schema.index_of(name) {
            Ok(idx) => idx,
            Err(_) => return Ok(None),
        };

        match self.batches.len() {
            0 => Ok(Some(arrow::array::new_empty_array(
                self.schema.field(idx).data_type(),
            ))),
            1 => Ok(Some(self.batches[0].column(idx).clone())),
            _ => {
                let chunks: Vec<&dyn arrow::array::Array> =
                    self.batches.iter().map(|b| b.column(idx).as_ref()).collect();
                Ok(Some(concat(&chunks)?))
            }
        }
    }

    /// Combine all batches into one
    pub fn combine(&self) -> SkyhookResult<RecordBatch> {
        match self.batches.len() {
            0 => Ok(RecordBatch::new_empty(self.schema.clone())),
            1 => Ok(self.batches[0].clone()),
            _ => Ok(concat_batches(&self.schema, &self.batches)?),
        }
    }

    /// Project (select) specific columns from the table
    ///
    /// # Arguments
    /// * `column_indices` - Indices of columns to include in the projection
    pub fn project(&self, column_indices: &[usize]) -> SkyhookResult<Table> {
        if column_indices.is_empty() {
            return Err(SkyhookError::Invalid(
                "column_indices cannot be empty".to_string(),
            ));
        }

        for &idx in column_indices {
            if idx >= self.columns() {
                return Err(SkyhookError::Invalid(format!(
                    "Column index {} out of range (table has {} columns)",
                    idx,
                    self.columns()
                )));
            }
        }

        let schema = Arc::new(self.schema.project(column_indices)?);
        let batches = self
            .batches
            .iter()
            .map(|batch| batch.project(column_indices))
            .collect::<Result<Vec<_>, _>>()?;

        Table::try_new(schema, batches)
    }

    /// Project by column names instead of indices
    pub fn project_by_names(&self, column_names: &[&str]) -> SkyhookResult<Table> {
        let mut indices = Vec::with_capacity(column_names.len());
        for &col_name in column_names {
            let idx = self.schema.index_of(col_name).map_err(|_| {
                SkyhookError::Invalid(format!("Column '{}' not found in table", col_name))
            })?;
            indices.push(idx);
        }

        self.project(&indices)
    }

    /// Whether another table holds the same schema and the same rows in order
    ///
    /// Batch boundaries are ignored.
    pub fn content_equals(&self, other: &Table) -> SkyhookResult<bool> {
        if self.schema != other.schema || self.rows() != other.rows() {
            return Ok(false);
        }
        Ok(self.combine()? == other.combine()?)
    }
}

impl From<RecordBatch> for Table {
    fn from(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }
}

