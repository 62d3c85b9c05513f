use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use duralog::{AppendOptions, Appender, CacheOptions, FileCache, LineEnding};

const PAYLOAD: usize = 200;

fn shared_appender(capacity: usize) -> (Arc<FileCache>, Appender) {
    let cache = Arc::new(FileCache::new(CacheOptions {
        capacity,
        ..CacheOptions::default()
    }));

    let appender = Appender::new(cache.clone(), AppendOptions {
        line_ending: LineEnding::Lf,
        lock_timeout: Duration::from_secs(5),
        ..AppendOptions::default()
    });

    (cache, appender)
}

fn numbered_line(ident: usize, seq: usize) -> String {
    format!("{:02} {:06} {}", ident, seq, "x".repeat(PAYLOAD))
}

// Reads the whole file back and checks that the lines group into strictly
// increasing 0..count sequences per writer, with none of them torn.
fn verify_interleaving(path: &Path, writers: usize, count: usize) {
    let content = fs::read_to_string(path).unwrap();
    let mut next = vec![0usize; writers];
    let mut total = 0;

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let ident: usize = fields.next().unwrap().parse().unwrap();
        let seq: usize = fields.next().unwrap().parse().unwrap();

        assert_eq!("x".repeat(PAYLOAD), fields.next().unwrap());
        assert!(fields.next().is_none());
        assert_eq!(next[ident], seq, "writer {} went out of order", ident);

        next[ident] += 1;
        total += 1;
    }

    assert_eq!(writers * count, total);
}

#[test]
fn concurrent_threads_never_tear_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.log");
    let (_, appender) = shared_appender(1);
    let appender = Arc::new(appender);

    let threads: Vec<_> = (0..8)
        .map(|ident| {
            let appender = appender.clone();
            let path = path.clone();

            thread::spawn(move || {
                for seq in 0..100 {
                    appender.append(&path, numbered_line(ident, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();

    for thread in threads {
        thread.join().unwrap();
    }

    verify_interleaving(&path, 8, 100);
}

// Runs only when re-executed by concurrent_processes_never_tear_lines; a
// plain test run passes straight through it.
#[test]
fn append_worker_entry() {
    let path = match env::var("DURALOG_APPEND_WORKER") {
        Ok(path) => path,
        Err(..) => return,
    };

    let ident: usize = env::var("DURALOG_APPEND_IDENT").unwrap().parse().unwrap();
    let count: usize = env::var("DURALOG_APPEND_COUNT").unwrap().parse().unwrap();
    let (_, appender) = shared_appender(1);

    for seq in 0..count {
        appender.append(Path::new(&path), numbered_line(ident, seq).as_bytes()).unwrap();
    }
}

#[test]
fn concurrent_processes_never_tear_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.log");

    let writers = 4;
    let count = 200;

    let children: Vec<_> = (0..writers)
        .map(|ident| {
            Command::new(env::current_exe().unwrap())
                .arg("append_worker_entry")
                .arg("--exact")
                .arg("--test-threads")
                .arg("1")
                .env("DURALOG_APPEND_WORKER", &path)
                .env("DURALOG_APPEND_IDENT", ident.to_string())
                .env("DURALOG_APPEND_COUNT", count.to_string())
                .spawn()
                .unwrap()
        })
        .collect();

    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    verify_interleaving(&path, writers, count);
}

#[test]
fn tiny_cache_survives_path_alternation() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.log");
    let b = dir.path().join("b.log");
    let (cache, appender) = shared_appender(1);

    for i in 0..20 {
        appender.append(&a, format!("a{}", i).as_bytes()).unwrap();
        appender.append(&b, format!("b{}", i).as_bytes()).unwrap();

        assert!(cache.len() <= 1);
    }

    let a_lines: Vec<String> = (0..20).map(|i| format!("a{}", i)).collect();
    let b_lines: Vec<String> = (0..20).map(|i| format!("b{}", i)).collect();

    assert_eq!(a_lines, fs::read_to_string(&a).unwrap().lines().collect::<Vec<_>>());
    assert_eq!(b_lines, fs::read_to_string(&b).unwrap().lines().collect::<Vec<_>>());
}

#[test]
fn rotation_by_rename_is_healed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let rotated = dir.path().join("app.log.1");
    let (_, appender) = shared_appender(1);

    appender.append(&path, b"before").unwrap();
    fs::rename(&path, &rotated).unwrap();

    appender.append(&path, b"after").unwrap();

    assert_eq!("before\n", fs::read_to_string(&rotated).unwrap());
    assert_eq!("after\n", fs::read_to_string(&path).unwrap());
}
