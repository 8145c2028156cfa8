//! Primary key removal against committed snapshots

use doclink::pk::{decode, encode, FilterState, PreparedFilter, PK_COLUMN, PK_WIDTH};
use doclink::segment::IndexSnapshot;
use doclink::{
    AnalyzerResolver, IndexWriter, LinkConfig, LinkMeta, PrimaryKey, PrimaryKeyFilterContainer,
    RecoveryFlag, RecoveryMode, WriterConfig,
};
use serde_json::json;

const RIDS: [u64; 37] = [
    1605879230128717824,
    1605879230128717826,
    1605879230129766400,
    1605879230130814976,
    1605879230130814978,
    1605879230131863552,
    1605879230131863554,
    1605879230132912128,
    1605879230133960704,
    1605879230133960706,
    1605879230135009280,
    1605879230136057856,
    1605879230136057858,
    1605879230137106432,
    1605879230137106434,
    1605879230138155008,
    1605879230138155010,
    1605879230139203584,
    1605879230139203586,
    1605879230140252160,
    1605879230140252162,
    1605879230141300736,
    1605879230142349312,
    1605879230142349314,
    1605879230142349316,
    1605879230143397888,
    1605879230143397890,
    1605879230144446464,
    1605879230144446466,
    1605879230144446468,
    1605879230145495040,
    1605879230145495042,
    1605879230145495044,
    1605879230146543616,
    1605879230146543618,
    1605879230146543620,
    1605879230147592192,
];

/// Configuration that indexes nothing but the primary key
fn key_only(resolver: &AnalyzerResolver) -> LinkConfig {
    LinkConfig::new(LinkMeta::new(), resolver)
}

fn insert(writer: &IndexWriter, config: &LinkConfig, rid: u64) {
    writer
        .documents()
        .insert_document(PrimaryKey(rid), &json!({ "rid": rid }), config);
}

fn replace(writer: &IndexWriter, config: &LinkConfig, rid: u64) {
    writer
        .documents()
        .replace_document(PrimaryKey(rid), &json!({ "rid": rid }), config);
}

/// Matches of `rid` per segment, checking each stored key
fn matches_per_segment(snapshot: &IndexSnapshot, rid: u64, mode: RecoveryMode) -> Vec<usize> {
    let mut filters = PrimaryKeyFilterContainer::new();
    let filter = filters.emplace(PrimaryKey(rid));
    let prepared = filter.prepare(snapshot, mode);
    assert!(!prepared.is_empty());

    snapshot
        .segments()
        .iter()
        .map(|segment| {
            let docs: Vec<_> = prepared.execute(segment, mode).collect();
            for docno in &docs {
                assert_eq!(segment.primary_key(*docno).unwrap(), Some(rid));
            }
            docs.len()
        })
        .collect()
}

#[test]
fn test_each_key_found_in_exactly_one_segment() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let writer = IndexWriter::default();

    for rid in &RIDS[..36] {
        insert(&writer, &config, *rid);
        writer.commit().unwrap();
    }

    let snapshot = writer.snapshot();
    assert_eq!(snapshot.segment_count(), 36);

    for rid in &RIDS[..36] {
        let counts = matches_per_segment(&snapshot, *rid, RecoveryMode::Normal);
        assert_eq!(counts.iter().sum::<usize>(), 1);
        assert_eq!(counts.iter().filter(|c| **c > 0).count(), 1);
    }
}

#[test]
fn test_filter_executes_once_per_snapshot() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let writer = IndexWriter::default();

    for rid in RIDS {
        insert(&writer, &config, rid);
    }
    // keeps the segment alive once the others are removed
    insert(&writer, &config, 12345);
    writer.commit().unwrap();

    let snapshot = writer.snapshot();
    assert_eq!(snapshot.segment_count(), 1);
    assert_eq!(snapshot.doc_count(), RIDS.len() as u64 + 1);
    assert_eq!(snapshot.live_doc_count(), RIDS.len() as u64 + 1);

    let mut found = 0;
    for rid in RIDS {
        let mut filters = PrimaryKeyFilterContainer::new();
        assert!(filters.is_empty());
        assert_eq!(filters.emplace(PrimaryKey(rid)).key(), PrimaryKey(rid));
        assert_eq!(filters.len(), 1);
        let filter = filters.iter().next().unwrap();

        let prepared = filter.prepare(&snapshot, RecoveryMode::Normal);
        assert!(prepared == filter.prepare(&snapshot, RecoveryMode::Normal));

        for segment in snapshot.segments() {
            let mut docs = prepared.execute(segment, RecoveryMode::Normal);
            assert_eq!(
                filter.state(),
                FilterState::Executed {
                    generation: snapshot.generation()
                }
            );
            assert_eq!(
                filter.prepare(&snapshot, RecoveryMode::Normal),
                PreparedFilter::Empty
            );

            let docno = docs.next().unwrap();
            assert!(docs.next().is_none());
            assert!(docs.next().is_none());
            assert_eq!(segment.primary_key(docno).unwrap(), Some(rid));
            found += 1;
        }
    }
    assert_eq!(found, RIDS.len());
}

#[test]
fn test_replay_after_repeated_replacement() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let writer = IndexWriter::default();

    for rid in RIDS {
        insert(&writer, &config, rid);
    }
    insert(&writer, &config, 12345);
    writer.commit().unwrap();

    let rounds = [123456u64, 1234567];
    for (round, keep_alive) in rounds.iter().enumerate() {
        for rid in RIDS {
            replace(&writer, &config, rid);
        }
        insert(&writer, &config, *keep_alive);
        let stats = writer.commit().unwrap().unwrap();
        assert_eq!(stats.documents_removed, RIDS.len());

        let snapshot = writer.snapshot();
        let segments = round + 2;
        let inserted = RIDS.len() + 1;
        assert_eq!(snapshot.segment_count(), segments);
        assert_eq!(snapshot.doc_count(), (inserted * segments) as u64);
        assert_eq!(snapshot.live_doc_count(), (RIDS.len() + segments) as u64);

        let mut found = 0;
        for rid in RIDS {
            let mut filters = PrimaryKeyFilterContainer::new();
            let filter = filters.emplace(PrimaryKey(rid));
            let prepared = filter.prepare(&snapshot, RecoveryMode::Replay);
            assert!(prepared == filter.prepare(&snapshot, RecoveryMode::Replay));

            for segment in snapshot.segments() {
                let mut docs = prepared.execute(segment, RecoveryMode::Replay);
                assert!(!filter.prepare(&snapshot, RecoveryMode::Replay).is_empty());
                // older segments only hold removed copies
                if let Some(docno) = docs.next() {
                    assert!(docs.next().is_none());
                    assert_eq!(segment.primary_key(docno).unwrap(), Some(rid));
                    found += 1;
                }
            }
        }
        assert_eq!(found, RIDS.len());
    }
}

#[test]
fn test_commits_in_recovery_replace_documents() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let flag = RecoveryFlag::new();
    let writer =
        IndexWriter::new(WriterConfig::default().with_max_segment_docs(8)).with_recovery_flag(flag.clone());

    for rid in RIDS {
        insert(&writer, &config, rid);
    }
    writer.commit().unwrap();
    assert_eq!(writer.snapshot().segment_count(), 5);

    flag.set_in_recovery(true);
    for rid in RIDS {
        replace(&writer, &config, rid);
    }
    // a replayed log may repeat the same replacement
    for rid in &RIDS[..4] {
        replace(&writer, &config, *rid);
    }
    writer.commit().unwrap();
    flag.set_in_recovery(false);

    let snapshot = writer.snapshot();
    assert_eq!(snapshot.live_doc_count(), RIDS.len() as u64);
    for rid in RIDS {
        let counts = matches_per_segment(&snapshot, rid, RecoveryMode::Normal);
        assert_eq!(counts.iter().sum::<usize>(), 1);
    }
}

#[test]
fn test_removing_unknown_key_changes_nothing() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let writer = IndexWriter::default();

    insert(&writer, &config, RIDS[0]);
    writer.commit().unwrap();

    writer.documents().remove(PrimaryKey(2605879230128717824));
    let stats = writer.commit().unwrap().unwrap();
    assert_eq!(stats.documents_removed, 0);
    assert_eq!(stats.generation, 2);
    assert_eq!(writer.snapshot().live_doc_count(), 1);
}

#[test]
fn test_key_codec() {
    for rid in RIDS {
        let encoded = encode(rid);
        assert_eq!(encoded.len(), PK_WIDTH);
        assert_eq!(decode(&encoded).unwrap(), rid);
        assert_eq!(PrimaryKey::decode(&encoded).unwrap(), PrimaryKey(rid));
    }

    let err = decode(&[0u8; 7]).unwrap_err();
    assert_eq!(err.expected, PK_WIDTH);
    assert_eq!(err.actual, 7);
    assert!(decode(&[0u8; 9]).is_err());
    assert!(decode(&[]).is_err());
}

#[test]
fn test_primary_key_column_holds_encoded_keys() {
    let resolver = AnalyzerResolver::default();
    let config = key_only(&resolver);
    let writer = IndexWriter::default();

    insert(&writer, &config, 42);
    writer.commit().unwrap();

    let snapshot = writer.snapshot();
    let segment = &snapshot.segments()[0];
    assert!(segment.has_field(PK_COLUMN));
    assert_eq!(segment.doc_frequency(PK_COLUMN, &encode(42)), 1);
    assert_eq!(segment.field_names().count(), 1);
}
