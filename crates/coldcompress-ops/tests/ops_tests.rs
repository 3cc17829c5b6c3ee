use coldcompress_ops::{
    CollisionPolicy, ErrorKind, OperationKind, TransformConfig, Transformer, run_batch,
};
use coldcompress_scan::{ScanConfig, Selector, threshold_from_days};
use std::fs::{self, FileTimes};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const DAY: u64 = 24 * 60 * 60;

fn reference_now() -> SystemTime {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn write_aged(path: &Path, contents: &[u8], now: SystemTime, age: Duration) {
    fs::write(path, contents).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_times(FileTimes::new().set_accessed(now - age)).unwrap();
}

fn overwriting() -> Transformer {
    Transformer::with_config(
        TransformConfig::builder()
            .collision(CollisionPolicy::Overwrite)
            .build()
            .unwrap(),
    )
}

fn pseudo_random(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed as u8
        })
        .collect()
}

#[test]
fn test_round_trip_restores_bytes_and_name() {
    let temp = TempDir::new().unwrap();
    let transformer = Transformer::new();

    let samples: Vec<(&str, Vec<u8>)> = vec![
        ("empty", Vec::new()),
        ("text.md", "# heading\n\nsome prose\n".repeat(300).into_bytes()),
        ("noise.bin", pseudo_random(64 * 1024, 0x9e37_79b9_7f4a_7c15)),
        ("archive.tar.gz", vec![0u8; 1]),
    ];

    for (name, contents) in samples {
        let path = temp.path().join(name);
        fs::write(&path, &contents).unwrap();

        let compressed = transformer.compress(&path);
        assert!(compressed.success, "{}", compressed.message);
        let compressed_path = compressed.transformed_path.unwrap();
        assert_eq!(
            compressed_path.file_name().unwrap().to_string_lossy(),
            format!("{name}.zz")
        );

        let restored = transformer.decompress(&compressed_path);
        assert!(restored.success, "{}", restored.message);
        assert_eq!(restored.transformed_path.as_deref(), Some(path.as_path()));
        assert_eq!(fs::read(&path).unwrap(), contents);
        assert!(!compressed_path.exists());
    }
}

#[test]
fn test_selection_is_idempotent_after_compression() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let now = reference_now();
    write_aged(&root.join("stale.csv"), b"a,b,c\n1,2,3\n", now, Duration::from_secs(60 * DAY));

    let selector = Selector::with_config(ScanConfig::builder().reference_time(now).build().unwrap());
    let before = selector
        .find_candidates_for_compression(root, threshold_from_days(30))
        .unwrap();
    assert_eq!(before.len(), 1);

    let result = Transformer::new().compress(&before.candidates[0].path);
    assert!(result.success);

    let after = selector
        .find_candidates_for_compression(root, threshold_from_days(30))
        .unwrap();
    assert!(after.is_empty());

    let to_decompress = selector.find_candidates_for_decompression(root).unwrap();
    assert_eq!(to_decompress.paths(), vec![root.join("stale.csv.zz")]);
}

#[test]
fn test_failed_write_keeps_source() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("keep.txt");
    let contents = b"must survive".repeat(100);
    fs::write(&path, &contents).unwrap();

    // A directory at the destination makes the final rename fail for any user
    fs::create_dir(temp.path().join("keep.txt.zz")).unwrap();

    let result = overwriting().compress(&path);

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Write));
    assert_eq!(fs::read(&path).unwrap(), contents);
    assert!(temp.path().join("keep.txt.zz").is_dir());

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != "keep.txt" && name != "keep.txt.zz")
        .collect();
    assert!(leftovers.is_empty(), "temporary files left: {leftovers:?}");
}

#[test]
fn test_failed_restore_keeps_archive() {
    let temp = TempDir::new().unwrap();
    let plain = temp.path().join("report.txt");
    fs::write(&plain, b"quarterly numbers").unwrap();

    let transformer = overwriting();
    let compressed = transformer.compress(&plain).transformed_path.unwrap();
    let archived = fs::read(&compressed).unwrap();

    // A directory where the restored file should go cannot be renamed over
    fs::create_dir(&plain).unwrap();

    let result = transformer.decompress(&compressed);

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Write));
    assert_eq!(fs::read(&compressed).unwrap(), archived);
    assert!(plain.is_dir());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
}

#[test]
fn test_collision_fail_policy_leaves_both_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("log.txt");
    let existing = temp.path().join("log.txt.zz");
    fs::write(&path, b"new contents").unwrap();
    fs::write(&existing, b"older archive").unwrap();

    let result = Transformer::new().compress(&path);

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Collision));
    assert_eq!(fs::read(&path).unwrap(), b"new contents");
    assert_eq!(fs::read(&existing).unwrap(), b"older archive");
}

#[test]
fn test_collision_overwrite_policy_replaces() {
    let temp = TempDir::new().unwrap();
    let plain = temp.path().join("log.txt");
    let compressed = temp.path().join("log.txt.zz");

    fs::write(&plain, b"first").unwrap();
    let transformer = overwriting();
    assert!(transformer.compress(&plain).success);

    fs::write(&plain, b"second generation").unwrap();
    let result = transformer.compress(&plain);
    assert!(result.success);

    assert!(transformer.decompress(&compressed).success);
    assert_eq!(fs::read(&plain).unwrap(), b"second generation");
}

#[test]
fn test_decompress_collision_with_existing_plain_file() {
    let temp = TempDir::new().unwrap();
    let plain = temp.path().join("doc.txt");
    fs::write(&plain, b"original").unwrap();

    let transformer = Transformer::new();
    let compressed = transformer.compress(&plain).transformed_path.unwrap();
    fs::write(&plain, b"recreated meanwhile").unwrap();

    let result = transformer.decompress(&compressed);

    assert_eq!(result.error_kind(), Some(ErrorKind::Collision));
    assert!(compressed.exists());
    assert_eq!(fs::read(&plain).unwrap(), b"recreated meanwhile");
}

#[test]
fn test_truncated_archive_reports_corruption() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("big.log");
    fs::write(&path, "GET /index.html 200\n".repeat(5_000)).unwrap();

    let transformer = Transformer::new();
    let compressed = transformer.compress(&path).transformed_path.unwrap();

    let mut bytes = fs::read(&compressed).unwrap();
    bytes.truncate(bytes.len() - 10);
    fs::write(&compressed, &bytes).unwrap();

    let result = transformer.decompress(&compressed);

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::CorruptData));
    assert!(result.message.contains("Corrupt"), "{}", result.message);
    assert_eq!(fs::read(&compressed).unwrap(), bytes);
    assert!(!path.exists());
}

#[test]
fn test_space_saved_matches_sizes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("table.tsv");
    let contents = "id\tname\tvalue\n".repeat(2_000);
    fs::write(&path, &contents).unwrap();
    let original_size = contents.len() as i64;

    let result = Transformer::new().compress(&path);
    let compressed_size = fs::metadata(temp.path().join("table.tsv.zz")).unwrap().len() as i64;

    assert_eq!(result.space_saved, original_size - compressed_size);
    let expected_ratio = (original_size - compressed_size) as f64 / original_size as f64 * 100.0;
    assert!((result.ratio - expected_ratio).abs() < 1e-9);
}

#[test]
fn test_incompressible_data_reports_negative_savings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("random.bin");
    fs::write(&path, pseudo_random(4096, 42)).unwrap();

    let result = Transformer::new().compress(&path);

    assert!(result.success);
    assert!(result.space_saved < 0);
    assert!(result.ratio < 0.0);
}

#[test]
fn test_batch_totals_sum_over_files() {
    let temp = TempDir::new().unwrap();
    let mut paths = Vec::new();
    let mut expected_saved = 0i64;

    for i in 0..5 {
        let path = temp.path().join(format!("part{i}.txt"));
        fs::write(&path, format!("chunk {i}\n").repeat(100 * (i + 1))).unwrap();
        paths.push(path);
    }

    let summary = run_batch(&Transformer::new(), OperationKind::Compress, &paths, |r| {
        assert!(r.success);
    });

    for path in &paths {
        let compressed = path.with_file_name(format!(
            "{}.zz",
            path.file_name().unwrap().to_string_lossy()
        ));
        let before = fs::read(&compressed)
            .map(|b| coldcompress_ops::inflate(&b).unwrap().len())
            .unwrap() as i64;
        let after = fs::metadata(&compressed).unwrap().len() as i64;
        expected_saved += before - after;
    }

    assert_eq!(summary.files_processed, 5);
    assert_eq!(summary.space_saved, expected_saved);
    assert_eq!(summary.bytes_before as i64 - summary.bytes_after as i64, expected_saved);
}

#[test]
fn test_stale_file_scenario_end_to_end() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let now = reference_now();

    write_aged(&root.join("forty.txt"), &b"forty days old ".repeat(64), now, Duration::from_secs(40 * DAY));
    write_aged(&root.join("twenty.txt"), b"twenty", now, Duration::from_secs(20 * DAY));
    write_aged(&root.join("five.txt"), b"five", now, Duration::from_secs(5 * DAY));

    let selector = Selector::with_config(ScanConfig::builder().reference_time(now).build().unwrap());
    let selection = selector
        .find_candidates_for_compression(root, threshold_from_days(30))
        .unwrap();
    assert_eq!(selection.paths(), vec![root.join("forty.txt")]);

    let summary = run_batch(
        &Transformer::new(),
        OperationKind::Compress,
        &selection.paths(),
        |_| {},
    );

    assert_eq!(summary.files_processed, 1);
    assert!(root.join("forty.txt.zz").exists());
    assert!(!root.join("forty.txt").exists());
    assert!(root.join("twenty.txt").exists());
    assert!(root.join("five.txt").exists());

    let stats = selector.folder_stats(root).unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.compressed_files, 1);
}

#[test]
fn test_decompress_batch_restores_tree() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    let files = [
        root.join("a.txt"),
        root.join("nested/b.txt"),
        root.join("nested/deeper/c.txt"),
    ];
    for (i, file) in files.iter().enumerate() {
        fs::write(file, format!("file number {i}\n").repeat(50)).unwrap();
    }

    let transformer = Transformer::new();
    run_batch(&transformer, OperationKind::Compress, &files, |_| {});

    let selector = Selector::new();
    let selection = selector.find_candidates_for_decompression(root).unwrap();
    assert_eq!(selection.len(), 3);

    let summary = run_batch(
        &transformer,
        OperationKind::Decompress,
        &selection.paths(),
        |_| {},
    );

    assert_eq!(summary.files_processed, 3);
    assert_eq!(summary.space_saved, 0);
    for (i, file) in files.iter().enumerate() {
        assert_eq!(
            fs::read_to_string(file).unwrap(),
            format!("file number {i}\n").repeat(50)
        );
    }
    assert_eq!(selector.folder_stats(root).unwrap().compressed_files, 0);
}

#[test]
fn test_lower_level_still_round_trips() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fast.txt");
    fs::write(&path, b"level one is fine too ".repeat(40)).unwrap();

    let transformer = Transformer::with_config(
        TransformConfig::builder()
            .compression_level(1u32)
            .build()
            .unwrap(),
    );
    let compressed = transformer.compress(&path).transformed_path.unwrap();
    assert!(transformer.decompress(&compressed).success);
    assert_eq!(fs::read(&path).unwrap(), b"level one is fine too ".repeat(40));
}
