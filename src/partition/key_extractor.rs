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

//! Key column readers
//!
//! Resolves the one or two key columns of a table once, before the scan, and
//! then reads per-row 32-bit keys from them. A missing secondary key reads as
//! the constant 0 so single-key and dual-key tables hash the same way.

use arrow::array::{Array, ArrayRef, GenericStringArray, OffsetSizeTrait, PrimitiveArray};
use arrow::datatypes::{ArrowNativeType, ArrowPrimitiveType, DataType, Schema};

use crate::error::{SkyhookError, SkyhookResult};
use crate::partition::jump_hash::composite_key;
use crate::table::Table;

/// Field metadata key marking a column as a partitioning key
pub const KEY_METADATA: &str = "skyhook.key";

/// Reads one integer key per row from a column
pub trait KeyReader: Send + Sync {
    /// Key value at `row`, or a reason it cannot be read as an integer
    fn read(&self, row: usize) -> Result<i64, String>;
}

struct PrimitiveKeyReader<T: ArrowPrimitiveType> {
    array: PrimitiveArray<T>,
}

impl<T: ArrowPrimitiveType> KeyReader for PrimitiveKeyReader<T> {
    fn read(&self, row: usize) -> Result<i64, String> {
        if self.array.is_null(row) {
            return Err("null key value".to_string());
        }
        let value = self.array.value(row);
        value
            .to_i64()
            .ok_or_else(|| format!("value {:?} is not representable in 32 bits", value))
    }
}

struct StringKeyReader<O: OffsetSizeTrait> {
    array: GenericStringArray<O>,
}

impl<O: OffsetSizeTrait> KeyReader for StringKeyReader<O> {
    fn read(&self, row: usize) -> Result<i64, String> {
        if self.array.is_null(row) {
            return Err("null key value".to_string());
        }
        let text = self.array.value(row);
        text.trim()
            .parse::<i64>()
            .map_err(|e| format!("'{}' is not an integer: {}", text, e))
    }
}

fn primitive_reader<T: ArrowPrimitiveType>(column: &ArrayRef) -> Option<Box<dyn KeyReader>> {
    let array = column.as_any().downcast_ref::<PrimitiveArray<T>>()?.clone();
    Some(Box::new(PrimitiveKeyReader { array }))
}

fn string_reader<O: OffsetSizeTrait>(column: &ArrayRef) -> Option<Box<dyn KeyReader>> {
    let array = column.as_any().downcast_ref::<GenericStringArray<O>>()?.clone();
    Some(Box::new(StringKeyReader { array }))
}

/// Create a key reader for a column, `None` if its type cannot hold integer keys
pub fn create_key_reader(column: &ArrayRef) -> Option<Box<dyn KeyReader>> {
    use arrow::datatypes::*;

    match column.data_type() {
        DataType::Int8 => primitive_reader::<Int8Type>(column),
        DataType::Int16 => primitive_reader::<Int16Type>(column),
        DataType::Int32 => primitive_reader::<Int32Type>(column),
        DataType::Int64 => primitive_reader::<Int64Type>(column),
        DataType::UInt8 => primitive_reader::<UInt8Type>(column),
        DataType::UInt16 => primitive_reader::<UInt16Type>(column),
        DataType::UInt32 => primitive_reader::<UInt32Type>(column),
        DataType::UInt64 => primitive_reader::<UInt64Type>(column),
        DataType::Utf8 => string_reader::<i32>(column),
        DataType::LargeUtf8 => string_reader::<i64>(column),
        _ => None,
    }
}

/// Narrow a key to 32 bits
///
/// Accepts `[i32::MIN, u32::MAX]`; negative values keep their two's
/// complement bit pattern.
pub fn to_key32(value: i64) -> Result<u32, String> {
    if value < i32::MIN as i64 || value > u32::MAX as i64 {
        return Err(format!("value {} is not representable in 32 bits", value));
    }
    Ok(value as u32)
}

/// One or two key values of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTuple {
    pub key_a: u32,
    pub key_b: u32,
}

impl KeyTuple {
    pub fn composite(&self) -> u64 {
        composite_key(self.key_a, self.key_b)
    }
}

struct KeyColumn {
    name: String,
    reader: Box<dyn KeyReader>,
}

impl KeyColumn {
    fn resolve(table: &Table, name: &str, missing: fn(String) -> SkyhookError) -> SkyhookResult<Self> {
        let column = table
            .column_by_name(name)?
            .ok_or_else(|| missing(name.to_string()))?;

        let reader = create_key_reader(&column).ok_or_else(|| SkyhookError::KeyConversion {
            column: name.to_string(),
            row: 0,
            reason: format!("unsupported key type {}", column.data_type()),
        })?;

        Ok(Self {
            name: name.to_string(),
            reader,
        })
    }

    fn key(&self, row: usize) -> SkyhookResult<u32> {
        self.reader
            .read(row)
            .and_then(to_key32)
            .map_err(|reason| SkyhookError::KeyConversion {
                column: self.name.clone(),
                row,
                reason,
            })
    }
}

/// Per-row key access for a partitioning run
pub struct KeyExtractor {
    primary: KeyColumn,
    secondary: Option<KeyColumn>,
    rows: usize,
}

impl KeyExtractor {
    /// Resolve the key columns of `table`
    ///
    /// Fails with `MissingPrimaryKey` if `primary` is empty or absent and with
    /// `MissingKeyColumn` if a named secondary column is absent.
    pub fn try_new(table: &Table, primary: &str, secondary: Option<&str>) -> SkyhookResult<Self> {
        if primary.is_empty() {
            return Err(SkyhookError::MissingPrimaryKey("<unset>".to_string()));
        }

        let primary = KeyColumn::resolve(table, primary, SkyhookError::MissingPrimaryKey)?;
        let secondary = secondary
            .map(|name| KeyColumn::resolve(table, name, SkyhookError::MissingKeyColumn))
            .transpose()?;

        Ok(Self {
            primary,
            secondary,
            rows: table.rows(),
        })
    }

    /// Rows available to extract from
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn primary_column(&self) -> &str {
        &self.primary.name
    }

    pub fn secondary_column(&self) -> Option<&str> {
        self.secondary.as_ref().map(|c| c.name.as_str())
    }

    /// Keys of `row`; `row` must be below [`KeyExtractor::rows`]
    pub fn extract(&self, row: usize) -> SkyhookResult<KeyTuple> {
        let key_a = self.primary.key(row)?;
        let key_b = match &self.secondary {
            Some(column) => column.key(row)?,
            None => 0,
        };
        Ok(KeyTuple { key_a, key_b })
    }

    /// 64-bit composite key of `row`
    pub fn composite_key(&self, row: usize) -> SkyhookResult<u64> {
        Ok(self.extract(row)?.composite())
    }
}

/// Key columns flagged with `skyhook.key = "true"` field metadata, in schema order
///
/// Returns the primary and optional secondary key column names.
pub fn key_columns_from_schema(schema: &Schema) -> SkyhookResult<(String, Option<String>)> {
    let flagged: Vec<&str> = schema
        .fields()
        .iter()
        .filter(|f| {
            f.metadata()
                .get(KEY_METADATA)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        })
        .map(|f| f.name().as_str())
        .collect();

    match flagged.as_slice() {
        [] => Err(SkyhookError::MissingPrimaryKey(
            "no field is flagged as a key".to_string(),
        )),
        [primary] => Ok((primary.to_string(), None)),
        [primary, secondary] => Ok((primary.to_string(), Some(secondary.to_string()))),
        more => Err(SkyhookError::Invalid(format!(
            "at most two key columns are supported, schema flags {}: {:?}",
            more.len(),
            more
        ))),
    }
}
