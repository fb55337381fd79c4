//! Integration tests for the manager over the native backend.
//!
//! Each test builds its own directory tree in a `TempDir` and its own
//! `FileManager`, so they run independently.

use std::fs;
use std::sync::{Arc, Once};

use filemux::{
    CacheMode, ErrorKind, FileManager, MemoryBackend, NativeBackend, OpenMode, SeekOrigin,
    SharedHandle,
};
use tempfile::TempDir;

// ============================================================================
// Shared test setup
// ============================================================================

/// Route `tracing` output to the test harness (`RUST_LOG=filemux=trace`).
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A directory with `a.txt` ("abcd") and `b.txt` ("xyz").
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "abcd").unwrap();
    fs::write(dir.path().join("b.txt"), "xyz").unwrap();
    dir
}

fn manager_over(dir: &TempDir, capacity: usize) -> FileManager {
    init_tracing();
    let mut manager = FileManager::new(capacity);
    manager.register(NativeBackend::new(dir.path()));
    manager
}

/// Read a handle from its current cursor to the end.
fn drain(handle: &SharedHandle) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 1024];
    let mut remaining = handle.size() as usize;
    while remaining > 0 {
        let want = remaining.min(buf.len());
        let n = handle.read(&mut buf[..want]).unwrap();
        out.extend_from_slice(&buf[..n]);
        remaining -= n;
    }
    out
}

// ============================================================================
// Probing
// ============================================================================

#[test]
fn open_without_backends_fails() {
    init_tracing();
    let mut manager = FileManager::new(4);
    for name in ["a.txt", "never/opened.bin", ""] {
        let err = manager.open_read(name).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoBackendsRegistered);
    }
}

#[test]
fn open_unresolvable_name_fails() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);
    manager.register(MemoryBackend::new());

    let err = manager.open_read("c.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSuchFile);
    assert!(err.kind().is_recoverable());
    assert_eq!(manager.cache_len(), 0);
}

#[test]
fn memory_backend_fills_native_gaps() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);
    let overlay = MemoryBackend::new();
    overlay.insert("a.txt", b"shadowed".to_vec());
    overlay.insert("generated.txt", b"gen".to_vec());
    manager.register(overlay);

    let native = manager.open_read("a.txt").unwrap();
    assert_eq!(drain(&native), b"abcd");
    let generated = manager.open_read("generated.txt").unwrap();
    assert_eq!(drain(&generated), b"gen");
    assert!(manager.exists("generated.txt"));
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn cached_open_returns_same_handle_at_offset_zero() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    let first = manager.open_read("a.txt").unwrap();
    let mut buf = [0u8; 3];
    assert_eq!(first.read(&mut buf).unwrap(), 3);

    let second = manager.open_read("a.txt").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    // The cursor is shared: the cache hit rewound it for both holders.
    assert_eq!(first.seek(0, SeekOrigin::Current).unwrap(), 0);
    assert_eq!(drain(&second), b"abcd");
}

#[test]
fn no_cache_gives_independent_cursors() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    let first = manager.open("a.txt", OpenMode::ReadOnly, CacheMode::NoCache).unwrap();
    let second = manager.open("a.txt", OpenMode::ReadOnly, CacheMode::NoCache).unwrap();
    let mut buf = [0u8; 2];
    first.read(&mut buf).unwrap();
    assert_eq!(second.seek(0, SeekOrigin::Current).unwrap(), 0);
    assert!(!manager.is_cached("a.txt"));
}

#[test]
fn cache_never_exceeds_capacity() {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("{i}.dat")), [i as u8]).unwrap();
    }
    let mut manager = manager_over(&dir, 3);

    for i in 0..10 {
        manager.open_read(&format!("{i}.dat")).unwrap();
        assert!(manager.cache_len() <= 3);
        assert!(manager.is_cached(&format!("{i}.dat")));
    }
    assert_eq!(manager.cache_len(), 3);
}

#[test]
fn clean_counts() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        fs::write(dir.path().join(format!("{i}.dat")), [i as u8]).unwrap();
    }
    let mut manager = manager_over(&dir, 8);
    for i in 0..5 {
        manager.open_read(&format!("{i}.dat")).unwrap();
    }

    assert!(manager.clean(Some(2)));
    assert_eq!(manager.cache_len(), 3);
    assert!(manager.clean(None));
    assert_eq!(manager.cache_len(), 0);
}

#[test]
fn capacity_one_purges_and_reprobes() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 1);

    let a = manager.open_read("a.txt").unwrap();
    assert!(manager.is_cached("a.txt"));

    let b = manager.open_read("b.txt").unwrap();
    assert!(manager.is_cached("b.txt"));
    assert!(!manager.is_cached("a.txt"));
    assert_eq!(drain(&b), b"xyz");

    let a_again = manager.open_read("a.txt").unwrap();
    assert!(!Arc::ptr_eq(&a, &a_again));
    assert_eq!(drain(&a_again), b"abcd");
    assert!(manager.is_cached("a.txt"));
    assert_eq!(manager.cache_len(), 1);
}

#[test]
fn cache_hit_keeps_original_mode() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    manager.open_read("a.txt").unwrap();
    let handle = manager.open("a.txt", OpenMode::WriteOnly, CacheMode::Cache).unwrap();
    assert_eq!(handle.mode(), OpenMode::ReadOnly);
    assert_eq!(handle.write(b"oops").unwrap_err().kind(), ErrorKind::WriteOnReadOnly);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"abcd");
}

// ============================================================================
// Handles
// ============================================================================

#[test]
fn write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager_over(&dir, 8);

    for len in [0usize, 1, 4096, 3 * 4096 + 17] {
        let name = format!("round-{len}.bin");
        let data: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();

        let writer = manager.open(&name, OpenMode::WriteOnly, CacheMode::NoCache).unwrap();
        let mut written = 0;
        while written < data.len() {
            written += writer.write(&data[written..]).unwrap();
        }
        assert_eq!(writer.write(&[]).unwrap(), 0);
        assert_eq!(writer.size(), 0);
        drop(writer);

        let reader = manager.open_read(&name).unwrap();
        assert_eq!(reader.size(), len as u64);
        assert_eq!(drain(&reader), data);
    }
}

#[test]
fn mmap_matches_read() {
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 253) as u8).collect();
    fs::write(dir.path().join("blob.bin"), &data).unwrap();
    let mut manager = manager_over(&dir, 2);

    let handle = manager.open_read("blob.bin").unwrap();
    let mapped = handle.mmap().unwrap();
    assert_eq!(mapped.len() as u64, handle.size());

    handle.reset().unwrap();
    let read = drain(&handle);
    assert_eq!(mapped, &read[..]);

    // A second mapping call reuses the first.
    let again = manager.open_read("blob.bin").unwrap();
    assert_eq!(again.mmap().unwrap().as_ptr(), mapped.as_ptr());
}

#[test]
fn cleaned_mapped_handle_can_be_rewritten() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    let handle = manager.open_read("a.txt").unwrap();
    assert_eq!(handle.mmap().unwrap(), b"abcd");
    drop(handle);
    assert!(manager.clean(None));

    let writer = manager.open("a.txt", OpenMode::WriteOnly, CacheMode::NoCache).unwrap();
    writer.write(b"rewritten").unwrap();
    drop(writer);

    let handle = manager.open_read("a.txt").unwrap();
    assert_eq!(handle.mmap().unwrap(), b"rewritten");
}

#[test]
fn mmap_rejects_writable_handles() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    let rw = manager.open("a.txt", OpenMode::ReadWrite, CacheMode::NoCache).unwrap();
    assert_eq!(rw.mmap().unwrap_err().kind(), ErrorKind::MapForWriteNotSupported);
    let wo = manager.open("c.txt", OpenMode::WriteOnly, CacheMode::NoCache).unwrap();
    assert_eq!(wo.mmap().unwrap_err().kind(), ErrorKind::MapForWriteNotSupported);
}

#[test]
fn mode_mismatch_leaves_state_alone() {
    let dir = fixture();
    let mut manager = manager_over(&dir, 4);

    let ro = manager.open_read("a.txt").unwrap();
    let mut buf = [0u8; 1];
    ro.read(&mut buf).unwrap();
    assert_eq!(ro.write(b"zz").unwrap_err().kind(), ErrorKind::WriteOnReadOnly);
    assert_eq!(ro.seek(0, SeekOrigin::Current).unwrap(), 1);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"abcd");

    let wo = manager.open("w.txt", OpenMode::WriteOnly, CacheMode::NoCache).unwrap();
    wo.write(b"12").unwrap();
    assert_eq!(wo.read(&mut buf).unwrap_err().kind(), ErrorKind::ReadOnWriteOnly);
    assert_eq!(wo.seek(0, SeekOrigin::Current).unwrap(), 2);
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn list_directory_scenarios() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("f"), "").unwrap();
    let manager = manager_over(&dir, 1);

    let err = manager.list_directory("missing/path").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);

    let listing = manager.list_directory(".").unwrap();
    assert_eq!(listing.subdirs, vec!["sub".to_string()]);
    assert_eq!(listing.files, vec!["f".to_string()]);
}

#[test]
fn list_directory_uses_first_listable_backend() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("maps")).unwrap();
    fs::write(dir.path().join("maps/native.map"), "").unwrap();
    let mut manager = manager_over(&dir, 1);

    let overlay = MemoryBackend::new();
    overlay.insert("maps/memory.map", b"".to_vec());
    overlay.insert("levels/one.lvl", b"".to_vec());
    manager.register(overlay);

    let maps = manager.list_directory("maps").unwrap();
    assert_eq!(maps.files, vec!["native.map".to_string()]);

    let levels = manager.list_directory("levels").unwrap();
    assert_eq!(levels.files, vec!["one.lvl".to_string()]);
}
