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

//! Object sink tests

use std::sync::Arc;

use tempfile::tempdir;

use skyhook::error::{Code, SkyhookError};
use skyhook::{FileSystemSink, MemorySink, ObjectNaming, ObjectSink, SegmentKey};

// ============================================================================
// Naming Tests
// ============================================================================

#[test]
fn test_object_naming() {
    let naming = ObjectNaming::default();
    assert_eq!(naming.prefix(), "Object-");
    assert_eq!(naming.segment_object(&SegmentKey::Bucket(7)), "Object-7");
    assert_eq!(naming.segment_object(&SegmentKey::Overflow(2)), "Object-flush-2");
    assert_eq!(naming.column_object(0), "Object-col-0");

    let custom = ObjectNaming::new("");
    assert_eq!(custom.segment_object(&SegmentKey::Bucket(1)), "1");
}

// ============================================================================
// FileSystemSink Tests
// ============================================================================

#[tokio::test]
async fn test_filesystem_put_get() {
    let dir = tempdir().unwrap();
    let sink = FileSystemSink::new(dir.path().join("nested"));

    sink.put("Object-0", b"first".to_vec()).await.unwrap();
    assert_eq!(sink.get("Object-0").await.unwrap(), b"first");

    sink.put("Object-0", b"second".to_vec()).await.unwrap();
    assert_eq!(sink.get("Object-0").await.unwrap(), b"second");

    let entries: Vec<String> = std::fs::read_dir(sink.root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["Object-0"]);
}

#[tokio::test]
async fn test_filesystem_object_visible_to_new_sink() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("objects");

    let writer = FileSystemSink::new(&root);
    writer.put("Object-flush-0", b"payload".to_vec()).await.unwrap();
    drop(writer);

    let reader = FileSystemSink::new(&root);
    assert_eq!(reader.get("Object-flush-0").await.unwrap(), b"payload");

    let entries: Vec<String> = std::fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec!["Object-flush-0"]);
}

#[tokio::test]
async fn test_filesystem_initialize() {
    let dir = tempdir().unwrap();
    let sink = FileSystemSink::new(dir.path().join("a").join("b"));
    sink.initialize().await.unwrap();
    assert!(sink.root().is_dir());
    assert!(sink.location().ends_with('b'));
}

#[tokio::test]
async fn test_filesystem_invalid_names() {
    let dir = tempdir().unwrap();
    let sink = FileSystemSink::new(dir.path());

    for name in ["", "../escape", "a/b", ".hidden"] {
        match sink.put(name, vec![1]).await {
            Err(SkyhookError::Sink { object, .. }) => assert_eq!(object, name),
            other => panic!("Expected Sink error for {:?}, got {:?}", name, other),
        }
    }
}

#[tokio::test]
async fn test_filesystem_missing_object() {
    let dir = tempdir().unwrap();
    let sink = FileSystemSink::new(dir.path());
    let err = sink.get("Object-9").await.unwrap_err();
    assert_eq!(err.code(), Code::IoError);
}

#[tokio::test]
async fn test_filesystem_concurrent_puts() {
    let dir = tempdir().unwrap();
    let sink = Arc::new(FileSystemSink::new(dir.path()));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16u8 {
        let sink = sink.clone();
        tasks.spawn(async move { sink.put(&format!("Object-{}", i), vec![i; 64]).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    for i in 0..16u8 {
        assert_eq!(sink.get(&format!("Object-{}", i)).await.unwrap(), vec![i; 64]);
    }
}

// ============================================================================
// MemorySink Tests
// ============================================================================

#[tokio::test]
async fn test_memory_sink() {
    let sink = MemorySink::new();
    assert!(sink.is_empty().await);

    sink.put("b", vec![2]).await.unwrap();
    sink.put("a", vec![1]).await.unwrap();
    sink.put("a", vec![3]).await.unwrap();

    assert_eq!(sink.len().await, 2);
    assert_eq!(sink.object_names().await, vec!["a", "b"]);
    assert_eq!(sink.get("a").await.unwrap(), vec![3]);
    assert!(matches!(
        sink.get("missing").await,
        Err(SkyhookError::Sink { .. })
    ));
}
