use std::sync::Arc;
use std::thread;

use tfs_types::{OpenFlags, BLOCK_SIZE, INODE_BLOCK_COUNT, MAX_OPEN_FILES};

use crate::Fs;

fn fresh_fs() -> Fs {
    Fs::init().expect("fs init")
}

#[test]
fn round_trip_small_write_read() {
    let fs = fresh_fs();
    let h = fs.open("/a", OpenFlags::CREAT).unwrap();
    let n = fs.write(h, b"hello").unwrap();
    assert_eq!(n, 5);
    fs.close(h).unwrap();

    let h = fs.open("/a", OpenFlags::empty()).unwrap();
    let data = fs.read(h, 64).unwrap();
    assert_eq!(data, b"hello");
    fs.close(h).unwrap();
}

#[test]
fn round_trip_full_file_size() {
    let fs = fresh_fs();
    let content: Vec<u8> = (0..INODE_BLOCK_COUNT * BLOCK_SIZE)
        .map(|i| (i % 251) as u8)
        .collect();

    let h = fs.open("/big", OpenFlags::CREAT).unwrap();
    let written = fs.write(h, &content).unwrap();
    assert_eq!(written, content.len());
    fs.close(h).unwrap();

    let h = fs.open("/big", OpenFlags::empty()).unwrap();
    let read_back = fs.read(h, content.len()).unwrap();
    assert_eq!(read_back, content);
    fs.close(h).unwrap();
}

#[test]
fn truncate_resets_size_and_reads() {
    let fs = fresh_fs();
    let h = fs.open("/b", OpenFlags::CREAT).unwrap();
    fs.write(h, &vec![1u8; 2048]).unwrap();
    fs.close(h).unwrap();

    let h = fs.open("/b", OpenFlags::TRUNC).unwrap();
    let data = fs.read(h, 1).unwrap();
    assert!(data.is_empty());
    fs.write(h, b"x").unwrap();
    fs.close(h).unwrap();

    let h = fs.open("/b", OpenFlags::empty()).unwrap();
    let data = fs.read(h, 64).unwrap();
    assert_eq!(data, b"x");
    fs.close(h).unwrap();
}

#[test]
fn append_extends_from_current_size() {
    let fs = fresh_fs();
    let h = fs.open("/c", OpenFlags::CREAT).unwrap();
    fs.write(h, b"AA").unwrap();
    fs.close(h).unwrap();

    let h = fs.open("/c", OpenFlags::APPEND).unwrap();
    fs.write(h, b"BB").unwrap();
    fs.close(h).unwrap();

    let h = fs.open("/c", OpenFlags::empty()).unwrap();
    let data = fs.read(h, 64).unwrap();
    assert_eq!(data, b"AABB");
    fs.close(h).unwrap();
}

#[test]
fn create_is_idempotent_on_existing_name() {
    let fs = fresh_fs();
    let h1 = fs.open("/d", OpenFlags::CREAT).unwrap();
    fs.write(h1, b"hello").unwrap();
    fs.close(h1).unwrap();

    let h2 = fs.open("/d", OpenFlags::CREAT).unwrap();
    let data = fs.read(h2, 64).unwrap();
    assert_eq!(data, b"hello", "re-opening with CREAT must not truncate an existing file");
    fs.close(h2).unwrap();
}

#[test]
fn open_without_creat_on_missing_name_fails() {
    let fs = fresh_fs();
    assert!(fs.open("/missing", OpenFlags::empty()).is_err());
}

#[test]
fn open_file_table_capacity_is_enforced() {
    let fs = fresh_fs();
    let mut handles = Vec::new();
    for i in 0..MAX_OPEN_FILES {
        let name = format!("/f{i}");
        handles.push(fs.open(&name, OpenFlags::CREAT).unwrap());
    }
    assert_eq!(fs.open("/overflow", OpenFlags::CREAT).unwrap_err().to_string().is_empty(), false);

    // The table being full does not disturb the handles already open.
    for h in handles {
        fs.write(h, b"x").unwrap();
        fs.close(h).unwrap();
    }
}

#[test]
fn concurrent_create_produces_a_single_inode() {
    let fs = Arc::new(fresh_fs());
    let threads: Vec<_> = (0..16)
        .map(|_| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || fs.open("/race", OpenFlags::CREAT).unwrap())
        })
        .collect();

    let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
    assert_eq!(fs.lookup("/race").is_ok(), true);

    for h in handles {
        fs.close(h).unwrap();
    }
    // A second create must still resolve to the same, single inode: writes
    // from one handle are visible to a freshly opened one.
    let h = fs.open("/race", OpenFlags::CREAT).unwrap();
    fs.write(h, b"only-one").unwrap();
    fs.close(h).unwrap();
    let h = fs.open("/race", OpenFlags::empty()).unwrap();
    assert_eq!(fs.read(h, 64).unwrap(), b"only-one");
    fs.close(h).unwrap();
}

#[test]
fn concurrent_writes_to_disjoint_ranges_are_all_preserved() {
    let fs = Arc::new(fresh_fs());
    let h0 = fs.open("/shared", OpenFlags::CREAT).unwrap();
    fs.write(h0, &vec![0u8; BLOCK_SIZE * 4]).unwrap();
    fs.close(h0).unwrap();

    let threads: Vec<_> = (0..4)
        .map(|i| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                let h = fs.open("/shared", OpenFlags::empty()).unwrap();
                // advance the independent handle's offset into this thread's
                // private range before writing.
                let _ = fs.read(h, i * BLOCK_SIZE).unwrap();
                let chunk = vec![(b'A' + i as u8); BLOCK_SIZE];
                fs.write(h, &chunk).unwrap();
                fs.close(h).unwrap();
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let h = fs.open("/shared", OpenFlags::empty()).unwrap();
    let data = fs.read(h, BLOCK_SIZE * 4).unwrap();
    fs.close(h).unwrap();
    for i in 0..4usize {
        let expected = b'A' + i as u8;
        assert!(data[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE]
            .iter()
            .all(|&b| b == expected));
    }
}

#[test]
fn shutdown_waits_for_open_handles_to_close() {
    let fs = Arc::new(fresh_fs());
    let h = fs.open("/held", OpenFlags::CREAT).unwrap();

    let fs2 = Arc::clone(&fs);
    let closer = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(50));
        fs2.close(h).unwrap();
    });

    fs.destroy_after_all_closed().unwrap();
    closer.join().unwrap();
    assert!(fs.open("/after-shutdown", OpenFlags::CREAT).is_err());
}
