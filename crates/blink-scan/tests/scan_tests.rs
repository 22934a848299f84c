use blink_scan::{JwalkScanner, Platform, ScanConfig, ScanError, WarningKind, scan};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const DAY: u64 = 24 * 60 * 60;

fn write_file(path: &Path, size: usize, days_since_access: u64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; size]).unwrap();
    let accessed = SystemTime::now() - Duration::from_secs(days_since_access * DAY);
    filetime::set_file_atime(path, FileTime::from_system_time(accessed)).unwrap();
}

fn posix_config(root: &Path) -> ScanConfig {
    let mut config = ScanConfig::new(root);
    config.platform = Platform::Posix;
    config.exclude_names.clear();
    config
}

fn file_names(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.as_ref().file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_only_stale_files_are_candidates() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("a.txt"), 500, 40);
    write_file(&temp.path().join("b.txt"), 2_000_000, 5);

    let result = scan(&posix_config(temp.path())).unwrap();

    let names = file_names(result.candidates.iter().map(|c| &c.record.path));
    assert_eq!(names, vec!["a.txt"]);
    assert_eq!(result.total_files(), 2);
}

#[test]
fn test_log_bucket_totals_and_pop_order() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("small.log"), 100, 0);
    write_file(&temp.path().join("nested/big.log"), 300, 0);

    let mut result = scan(&posix_config(temp.path())).unwrap();
    let bucket = result.index.get_mut(".log").unwrap();

    assert_eq!(bucket.total_size(), 400);
    assert_eq!(bucket.pop_largest().unwrap().size, 300);
    assert_eq!(bucket.pop_largest().unwrap().size, 100);
    assert!(bucket.pop_largest().is_none());
}

#[test]
fn test_aggregates_account_for_every_byte() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("notes.txt"), 10, 1);
    write_file(&root.join("Makefile"), 2_048, 1);
    write_file(&root.join("media/clip.mp4"), 200_000, 90);
    write_file(&root.join("media/raw/clip.MP4"), 1_500_000, 60);
    write_file(&root.join("empty.dat"), 0, 1);

    let result = scan(&posix_config(root)).unwrap();

    let bucketed: u64 = result.index.iter().map(|b| b.total_size()).sum();
    assert_eq!(bucketed + result.index.extensionless_bytes(), result.total_bytes());
    assert_eq!(result.total_bytes(), 10 + 2_048 + 200_000 + 1_500_000);

    let bin_count: u64 = result.histogram.bins().iter().map(|b| b.count).sum();
    assert_eq!(bin_count, result.total_files());
    assert_eq!(
        result.histogram.to_cumulative().last().unwrap().count,
        result.total_files()
    );
    let pct: f64 = result.histogram.to_percentages().iter().map(|p| p.count_percent).sum();
    assert!((pct - 100.0).abs() < 1e-9);

    // Case is preserved, so the two clips land in different buckets.
    assert_eq!(result.index.get(".mp4").unwrap().len(), 1);
    assert_eq!(result.index.get(".MP4").unwrap().len(), 1);
}

#[test]
fn test_candidates_are_ranked_and_capped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for i in 0..8 {
        write_file(&root.join(format!("old{i}.bin")), 100_000 * (i + 1), 31 + i as u64);
    }
    write_file(&root.join("fresh.bin"), 9_000_000, 2);

    let mut config = posix_config(root);
    config.top_k = 5;
    let result = scan(&config).unwrap();

    assert_eq!(result.candidates.len(), 5);
    assert!(result
        .candidates
        .windows(2)
        .all(|w| w[0].priority >= w[1].priority));
    assert!(result
        .candidates
        .iter()
        .all(|c| c.record.staleness_days.unwrap() > 30));
    assert_eq!(
        file_names([&result.candidates[0].record.path]),
        vec!["old7.bin"]
    );
}

#[test]
fn test_repeated_scans_are_identical() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for i in 0..20 {
        // Same size and age everywhere, so only the path breaks ties.
        write_file(&root.join(format!("d{}/f{i}.tmp", i % 4)), 4096, 45);
    }

    let config = posix_config(root);
    let first = scan(&config).unwrap();
    let second = scan(&config).unwrap();

    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.histogram, second.histogram);
    let paths: Vec<_> = first.candidates.iter().map(|c| c.record.path.clone()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}

#[test]
fn test_hidden_directories_are_not_visited() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join(".cache/blob.bin"), 5_000, 100);
    write_file(&root.join(".env"), 10, 100);
    write_file(&root.join("Library/Caches/db.sqlite"), 7_000, 100);
    write_file(&root.join("keep.txt"), 3, 100);

    let mut config = posix_config(root);
    config.exclude_names = vec!["Library".to_string()];
    let result = scan(&config).unwrap();

    assert_eq!(result.total_files(), 1);
    assert_eq!(result.stats.total_dirs, 0);
    assert_eq!(file_names(result.candidates.iter().map(|c| &c.record.path)), vec!["keep.txt"]);

    config.include_hidden = true;
    let result = scan(&config).unwrap();
    assert_eq!(result.total_files(), 3);
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let err = scan(&ScanConfig::new(temp.path().join("nope"))).unwrap_err();
    assert!(matches!(err, ScanError::NotFound { .. }));
}

#[test]
fn test_cancelled_scan_returns_no_result() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("a/b/c.txt"), 10, 40);

    let token = CancellationToken::new();
    token.cancel();
    let err = JwalkScanner::new()
        .with_cancel(token)
        .scan(&posix_config(temp.path()))
        .unwrap_err();
    assert!(matches!(err, ScanError::Cancelled));
}

#[test]
fn test_deadline_is_enforced() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("a.txt"), 10, 40);

    let mut config = posix_config(temp.path());
    config.deadline = Some(Duration::ZERO);
    let err = scan(&config).unwrap_err();
    assert!(matches!(err, ScanError::DeadlineExceeded { .. }));
}

#[test]
fn test_empty_tree() {
    let temp = TempDir::new().unwrap();
    let result = scan(&posix_config(temp.path())).unwrap();

    assert_eq!(result.total_files(), 0);
    assert!(result.candidates.is_empty());
    assert!(result.index.is_empty());
    assert!(result
        .histogram
        .to_percentages()
        .iter()
        .all(|p| p.count_percent == 0.0 && p.bytes_percent == 0.0));
}

#[test]
fn test_report_serializes() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("a.txt"), 500, 40);
    write_file(&temp.path().join("b.log"), 1_500, 40);

    let result = scan(&posix_config(temp.path())).unwrap();
    let report = result.report(10, 3);
    assert_eq!(report.histogram.len(), 11);
    assert_eq!(report.histogram[0].bin, "0-1KB");
    assert_eq!(report.extensions[0].extension, ".log");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["total_files"], 2);
    assert_eq!(json["candidates"].as_array().unwrap().len(), 2);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_counted_not_followed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("real/data.txt"), 100, 1);
    std::os::unix::fs::symlink(root.join("real"), root.join("real/loop")).unwrap();
    std::os::unix::fs::symlink(root.join("real/data.txt"), root.join("alias.txt")).unwrap();

    let result = scan(&posix_config(root)).unwrap();
    assert_eq!(result.total_files(), 1);
    assert_eq!(result.stats.total_symlinks, 2);
}

#[cfg(unix)]
#[test]
fn test_special_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("plain.txt"), 42, 1);
    let _listener = std::os::unix::net::UnixListener::bind(root.join("app.sock")).unwrap();

    let result = scan(&posix_config(root)).unwrap();
    assert_eq!(result.total_files(), 1);
    assert_eq!(result.stats.skipped_entries, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::UnsupportedFileType);
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped_with_warning() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("ok.txt"), 10, 1);
    write_file(&root.join("locked/inside.txt"), 20, 1);
    let locked = root.join("locked");
    set_mode(&locked, 0o000);

    // Permission bits are not enforced for a privileged user.
    if fs::read_dir(&locked).is_ok() {
        set_mode(&locked, 0o755);
        return;
    }

    let result = scan(&posix_config(root));
    set_mode(&locked, 0o755);
    let result = result.unwrap();

    assert_eq!(result.total_files(), 1);
    assert_eq!(result.stats.total_dirs, 1);
    assert_eq!(result.stats.skipped_entries, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::PermissionDenied);
    assert!(result.warnings[0].path.ends_with("locked"));
}

#[cfg(unix)]
#[test]
fn test_unstattable_file_is_skipped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("ok.txt"), 10, 1);
    write_file(&root.join("noexec/f.txt"), 20, 1);
    let noexec = root.join("noexec");
    // Listing is allowed, but stat of the children is not.
    set_mode(&noexec, 0o644);

    if fs::symlink_metadata(noexec.join("f.txt")).is_ok() {
        set_mode(&noexec, 0o755);
        return;
    }

    let result = scan(&posix_config(root));
    set_mode(&noexec, 0o755);
    let result = result.unwrap();

    assert_eq!(result.total_files(), 1);
    assert_eq!(result.stats.skipped_entries, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::PermissionDenied);
}
