use coldcompress_core::{
    BatchSummary, CollisionPolicy, ErrorKind, FileCandidate, OperationKind, OperationResult,
    TransformConfig, TransformError, compressed_path, is_compressed, original_path,
    threshold_from_days,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_candidate_age() {
    let candidate = FileCandidate::new("/data/old.log", 4096, Duration::from_secs(90_061));
    assert_eq!(candidate.age_secs(), 90_061);
    assert_eq!(candidate.size, 4096);
    assert!(candidate.accessed_age > threshold_from_days(1));
}

#[test]
fn test_marker_helpers_agree() {
    let plain = Path::new("/srv/logs/app.2023-01-01.log");
    let compressed = compressed_path(plain).unwrap();

    assert_eq!(
        compressed,
        PathBuf::from("/srv/logs/app.2023-01-01.log.zz")
    );
    assert!(!is_compressed(plain));
    assert!(is_compressed(&compressed));
    assert_eq!(original_path(&compressed).as_deref(), Some(plain));
    assert_eq!(compressed_path(&compressed), None);
}

#[test]
fn test_result_serializes() {
    let result = OperationResult::compressed("/d/a.txt", "/d/a.txt.zz", 2048, 512);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["kind"], "Compress");
    assert_eq!(json["space_saved"], 1536);
    assert_eq!(json["transformed_path"], "/d/a.txt.zz");
    assert!(json["error"].is_null());
}

#[test]
fn test_summary_across_kinds() {
    let mut summary = BatchSummary::new(OperationKind::Decompress);
    summary.record(&OperationResult::decompressed(
        "/d/a.txt.zz",
        "/d/a.txt",
        512,
        2048,
    ));

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.space_saved, 0);
    assert_eq!(summary.bytes_after, 2048);
    assert!(summary.is_success());
    assert_eq!(summary.summary(), "Decompressed 1 files");
}

#[test]
fn test_summary_merge() {
    let mut left = BatchSummary::new(OperationKind::Compress);
    left.record(&OperationResult::compressed("/a", "/a.zz", 300, 100));

    let mut right = BatchSummary::new(OperationKind::Compress);
    right.record(&OperationResult::compressed("/b", "/b.zz", 50, 20));
    right.record(&OperationResult::failed(
        OperationKind::Compress,
        "/c",
        &TransformError::Collision {
            path: "/c.zz".into(),
        },
    ));
    right.cancelled = true;

    left.merge(right);

    assert_eq!(left.files_processed, 2);
    assert_eq!(left.files_failed, 1);
    assert_eq!(left.space_saved, 230);
    assert!(left.cancelled);
    assert_eq!(left.errors[0].kind, ErrorKind::Collision);
    assert_eq!(left.summary(), "Compressed 2 files, 1 failed (cancelled)");
}

#[test]
fn test_transform_config_overwrite() {
    let config = TransformConfig::builder()
        .collision(CollisionPolicy::Overwrite)
        .build()
        .unwrap();
    assert_eq!(config.collision, CollisionPolicy::Overwrite);
    assert_eq!(config.compression_level, 9);
}
