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

//! Reading stored objects back into tables

use crate::error::SkyhookResult;
use crate::io::ipc::deserialize_table;
use crate::io::sink::{ObjectNaming, ObjectSink};
use crate::partition::bucket_index::SegmentKey;
use crate::table::Table;

/// Fetch and decode the object stored under `name`
pub async fn read_object(sink: &dyn ObjectSink, name: &str) -> SkyhookResult<Table> {
    let payload = sink.get(name).await?;
    log::debug!("read {} bytes from {} in {}", payload.len(), name, sink.location());
    deserialize_table(&payload)
}

/// Fetch and decode the object written for a segment
pub async fn read_segment(
    sink: &dyn ObjectSink,
    naming: &ObjectNaming,
    key: &SegmentKey,
) -> SkyhookResult<Table> {
    read_object(sink, &naming.segment_object(key)).await
}
