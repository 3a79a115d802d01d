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

//! IPC stream serialization tests

use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use skyhook::error::SkyhookError;
use skyhook::io::{deserialize_table, serialize_table, BatchSerializer};
use skyhook::table::Table;

fn create_test_table() -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("c"), Some("d"), Some("e")])),
            Arc::new(Float64Array::from(vec![1.0, 2.5, 3.0, 4.5, 5.0])),
        ],
    )
    .unwrap();

    Table::from_record_batch(batch).unwrap()
}

#[test]
fn test_round_trip() {
    let table = create_test_table();
    let bytes = serialize_table(&table).unwrap();
    let decoded = deserialize_table(&bytes).unwrap();

    assert_eq!(decoded.schema(), table.schema());
    assert_eq!(decoded.rows(), 5);
    assert!(decoded.content_equals(&table).unwrap());
}

#[test]
fn test_batches_are_split() {
    let table = create_test_table();
    let serializer = BatchSerializer::new(2).unwrap();
    let decoded = deserialize_table(&serializer.serialize(&table).unwrap()).unwrap();

    assert_eq!(decoded.num_batches(), 3);
    let sizes: Vec<usize> = decoded.batches().iter().map(|b| b.num_rows()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert!(decoded.content_equals(&table).unwrap());
}

#[test]
fn test_empty_table_keeps_schema() {
    let table = Table::empty(create_test_table().schema());
    let bytes = serialize_table(&table).unwrap();
    assert!(!bytes.is_empty(), "Stream must carry the schema header");

    let decoded = deserialize_table(&bytes).unwrap();
    assert_eq!(decoded.num_batches(), 0);
    assert_eq!(decoded.rows(), 0);
    assert_eq!(decoded.schema(), table.schema());
}

#[test]
fn test_zero_row_batches_dropped() {
    let table = create_test_table();
    let empty = RecordBatch::new_empty(table.schema());
    let mut batches = vec![empty.clone()];
    batches.extend(table.batches().iter().cloned());
    batches.push(empty);
    let padded = Table::try_new(table.schema(), batches).unwrap();

    let decoded = deserialize_table(&serialize_table(&padded).unwrap()).unwrap();
    assert_eq!(decoded.num_batches(), 1);
    assert!(decoded.content_equals(&table).unwrap());
}

#[test]
fn test_zero_batch_rows_rejected() {
    assert!(matches!(
        BatchSerializer::new(0),
        Err(SkyhookError::Invalid(_))
    ));
    assert_eq!(BatchSerializer::default().max_batch_rows(), 65536);
}

#[test]
fn test_garbage_input() {
    // Continuation marker and a 16 byte metadata length, then truncated
    let err = deserialize_table(&[0xff, 0xff, 0xff, 0xff, 0x10, 0, 0, 0, 1, 2, 3]).unwrap_err();
    assert!(matches!(err, SkyhookError::Serialization(_)), "Got {:?}", err);
}
