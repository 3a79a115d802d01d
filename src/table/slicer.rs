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

//! Row selection by global row index

use arrow::array::{RecordBatch, UInt64Array};
use arrow::compute::take;

use crate::error::{SkyhookError, SkyhookResult};
use crate::table::Table;

/// Produces row-ordered sub-tables of one source table
///
/// The source batches are combined once up front so every slice is a single
/// `take` per column regardless of how the source was chunked.
#[derive(Debug, Clone)]
pub struct RowSlicer {
    combined: RecordBatch,
}

impl RowSlicer {
    pub fn new(table: &Table) -> SkyhookResult<Self> {
        Ok(Self {
            combined: table.combine()?,
        })
    }

    /// Number of rows available for slicing
    pub fn rows(&self) -> usize {
        self.combined.num_rows()
    }

    /// Sub-table holding exactly `row_indices`, in the given order
    ///
    /// An empty index list yields a zero-row table with the source schema.
    pub fn slice(&self, row_indices: &[usize]) -> SkyhookResult<Table> {
        let schema = self.combined.schema();
        if row_indices.is_empty() {
            return Ok(Table::empty(schema));
        }

        let num_rows = self.combined.num_rows();
        if let Some(&bad) = row_indices.iter().find(|&&i| i >= num_rows) {
            return Err(SkyhookError::IndexError(format!(
                "Row index {} out of range (table has {} rows)",
                bad, num_rows
            )));
        }

        let indices = UInt64Array::from_iter_values(row_indices.iter().map(|&i| i as u64));
        let columns = self
            .combined
            .columns()
            .iter()
            .map(|column| take(column.as_ref(), &indices, None))
            .collect::<Result<Vec<_>, _>>()?;

        let batch = RecordBatch::try_new(schema.clone(), columns)?;
        Table::try_new(schema, vec![batch])
    }
}
