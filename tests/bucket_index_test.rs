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

//! Bucket index and flush policy tests

use skyhook::error::SkyhookError;
use skyhook::partition::{composite_key, BucketIndex, SegmentKey};

fn all_rows(index: &BucketIndex) -> Vec<usize> {
    let mut rows: Vec<usize> = index.iter().flat_map(|(_, r)| r.iter().copied()).collect();
    rows.sort_unstable();
    rows
}

#[test]
fn test_segment_key_display() {
    assert_eq!(SegmentKey::Bucket(3).to_string(), "3");
    assert_eq!(SegmentKey::Overflow(0).to_string(), "flush-0");
    assert_eq!(SegmentKey::Overflow(12).to_string(), "flush-12");
    assert!(SegmentKey::Overflow(0).is_overflow());
    assert!(!SegmentKey::Bucket(0).is_overflow());
}

#[test]
fn test_segment_key_order() {
    let mut keys = vec![
        SegmentKey::Overflow(1),
        SegmentKey::Bucket(2),
        SegmentKey::Overflow(0),
        SegmentKey::Bucket(0),
    ];
    keys.sort();
    assert_eq!(
        keys,
        vec![
            SegmentKey::Bucket(0),
            SegmentKey::Bucket(2),
            SegmentKey::Overflow(0),
            SegmentKey::Overflow(1),
        ]
    );
}

#[test]
fn test_invalid_bucket_count() {
    match BucketIndex::new(0, None) {
        Err(SkyhookError::InvalidBucketCount(_)) => {}
        other => panic!("Expected InvalidBucketCount, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_flush_after_append() {
    let mut index = BucketIndex::new(1, Some(2)).unwrap();

    assert_eq!(index.assign(0, 0), None);
    assert_eq!(index.assign(1, 0), None);
    assert_eq!(index.get(&SegmentKey::Bucket(0)), Some(&[0, 1][..]));

    // Third row pushes the bucket to 3 > 2 rows
    assert_eq!(index.assign(2, 0), Some(SegmentKey::Overflow(0)));
    assert_eq!(index.get(&SegmentKey::Overflow(0)), Some(&[0, 1, 2][..]));
    assert_eq!(index.get(&SegmentKey::Bucket(0)), Some(&[][..]));
    assert_eq!(index.flush_count(), 1);

    // The live bucket keeps accumulating under the same id
    assert_eq!(index.assign(3, 0), None);
    assert_eq!(index.get(&SegmentKey::Bucket(0)), Some(&[3][..]));
    assert_eq!(index.rows_assigned(), 4);
}

#[test]
fn test_zero_capacity_flushes_every_row() {
    let mut index = BucketIndex::new(1, Some(0)).unwrap();
    for row in 0..4 {
        assert_eq!(index.assign(row, 0), Some(SegmentKey::Overflow(row as u64)));
    }
    for n in 0..4u64 {
        assert_eq!(index.get(&SegmentKey::Overflow(n)), Some(&[n as usize][..]));
    }
    assert_eq!(index.non_empty().count(), 4);
}

#[test]
fn test_no_flush_without_capacity() {
    let mut index = BucketIndex::new(1, None).unwrap();
    for row in 0..1000 {
        assert_eq!(index.assign(row, 0), None);
    }
    assert_eq!(index.len(), 1);
    assert_eq!(index.get(&SegmentKey::Bucket(0)).unwrap().len(), 1000);
    assert_eq!(index.flush_count(), 0);
}

#[test]
fn test_insertion_order_preserved() {
    let mut index = BucketIndex::new(4, None).unwrap();
    for row in 0..200 {
        index.insert(row, composite_key(row as u32, 0));
    }
    for (_, rows) in index.iter() {
        assert!(rows.windows(2).all(|w| w[0] < w[1]), "Rows must stay in scan order");
    }
}

#[test]
fn test_flush_bound_and_completeness() {
    let max = 4usize;
    let total = 500usize;
    let mut index = BucketIndex::new(3, Some(max)).unwrap();

    for row in 0..total {
        let (bucket, _) = index.insert(row, composite_key(row as u32, 1));
        let live = index.get(&SegmentKey::Bucket(bucket)).unwrap();
        assert!(live.len() <= max, "Live bucket {} holds {} rows", bucket, live.len());
    }

    for (key, rows) in index.iter() {
        match key {
            SegmentKey::Overflow(_) => {
                assert!(!rows.is_empty() && rows.len() <= max + 1, "{} holds {} rows", key, rows.len())
            }
            SegmentKey::Bucket(_) => assert!(rows.len() <= max),
        }
    }

    assert_eq!(all_rows(&index), (0..total).collect::<Vec<_>>());
    assert!(index.flush_count() > 0);
}

#[test]
fn test_same_input_same_index() {
    let build = || {
        let mut index = BucketIndex::new(2, None).unwrap();
        for (row, key) in [1u32, 2, 3, 4, 5].iter().enumerate() {
            index.insert(row, composite_key(*key, 0));
        }
        index.into_segments()
    };

    let first = build();
    let second = build();
    assert_eq!(first, second);

    let mut rows: Vec<usize> = first.values().flatten().copied().collect();
    rows.sort_unstable();
    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    assert!(first
        .keys()
        .all(|k| matches!(k, SegmentKey::Bucket(0) | SegmentKey::Bucket(1))));
}
