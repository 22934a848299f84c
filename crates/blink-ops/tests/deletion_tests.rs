use blink_ops::{DeleteFailureKind, DeleteMode, DeletionEvent, start_deletion};
use std::fs;
use tempfile::TempDir;

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(future)
}

#[test]
fn test_background_deletion_streams_events() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.log");
    let b = temp.path().join("b.log");
    let dir = temp.path().join("subdir");
    fs::write(&a, [0u8; 100]).unwrap();
    fs::write(&b, [0u8; 300]).unwrap();
    fs::create_dir(&dir).unwrap();

    let events = run(async {
        let mut rx = start_deletion(vec![a.clone(), dir.clone(), b.clone()], DeleteMode::Permanent);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    let progress = events
        .iter()
        .filter(|e| matches!(e, DeletionEvent::Progress(_)))
        .count();
    assert_eq!(progress, 3);

    let failures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            DeletionEvent::Failed(err) => Some(err),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, DeleteFailureKind::NotAFile);

    let Some(DeletionEvent::Complete(report)) = events.last() else {
        panic!("last event must be Complete");
    };
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.bytes_freed, 400);
    assert!(!a.exists() && !b.exists() && dir.exists());
}

#[test]
fn test_empty_batch_completes() {
    let events = run(async {
        let mut rx = start_deletion(Vec::new(), DeleteMode::Permanent);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], DeletionEvent::Complete(r) if r.is_success()));
}
