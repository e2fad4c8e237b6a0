//! Live zone scenarios: real handlers feeding a registry through the
//! event channel, the way the application loop drives them.

#![cfg(unix)]

use std::time::{Duration, Instant};

use core_events::{ZoneEvent, zone_event_channel};
use core_zones::{ZoneConfig, ZoneManager, ZoneSpec};
use crossbeam_channel::Receiver;

fn spec(name: &str, config: ZoneConfig) -> ZoneSpec {
    ZoneSpec {
        name: name.to_string(),
        x: 0,
        y: 0,
        width: 42,
        height: 7,
        config,
        bookmark: None,
        description: None,
    }
}

/// Drain events into the manager until `pred` holds or the timeout ends.
fn pump_until(
    mgr: &mut ZoneManager,
    rx: &Receiver<ZoneEvent>,
    timeout: Duration,
    mut pred: impl FnMut(&ZoneManager) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(ev) = rx.recv_timeout(Duration::from_millis(50)) {
            mgr.apply_event(ev);
        }
        if pred(mgr) {
            return true;
        }
    }
    false
}

fn buffer_text(mgr: &ZoneManager, name: &str) -> Vec<String> {
    mgr.get(name)
        .map(|z| z.buffer.lines().map(|l| l.text()).collect())
        .unwrap_or_default()
}

#[test]
fn watch_zone_refreshes_pauses_and_resumes() {
    let (tx, rx) = zone_event_channel();
    let mut mgr = ZoneManager::new(tx, false);
    // A counter that changes every run: nanoseconds since the epoch.
    let err = mgr
        .create(spec(
            "ticker",
            ZoneConfig::Watch {
                command: "date +%N".to_string(),
                refresh_secs: Some(0.2),
                watch_path: None,
                auto_scroll: true,
                max_lines: 10,
            },
        ))
        .unwrap();
    assert!(err.is_none(), "{err:?}");

    // Two distinct contents within the window.
    let mut seen = std::collections::HashSet::new();
    let ok = pump_until(&mut mgr, &rx, Duration::from_secs(10), |mgr| {
        for line in buffer_text(mgr, "ticker") {
            if !line.is_empty() {
                seen.insert(line);
            }
        }
        seen.len() >= 2
    });
    assert!(ok, "expected at least two distinct refreshes");

    // Pause: drain in-flight events, then verify content stops changing.
    mgr.pause("ticker").unwrap();
    std::thread::sleep(Duration::from_millis(300));
    while let Ok(ev) = rx.try_recv() {
        mgr.apply_event(ev);
    }
    let frozen = buffer_text(&mgr, "ticker");
    std::thread::sleep(Duration::from_millis(500));
    while let Ok(ev) = rx.try_recv() {
        mgr.apply_event(ev);
    }
    assert_eq!(frozen, buffer_text(&mgr, "ticker"), "paused zone changed");

    // Resume: content moves again.
    mgr.resume("ticker").unwrap();
    let moved = pump_until(&mut mgr, &rx, Duration::from_secs(10), |mgr| {
        buffer_text(mgr, "ticker") != frozen
    });
    assert!(moved, "resumed zone should refresh again");
    mgr.delete("ticker").unwrap();
}

#[test]
fn fifo_zone_receives_external_writer_lines() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.fifo");
    let (tx, rx) = zone_event_channel();
    let mut mgr = ZoneManager::new(tx, false);
    let err = mgr
        .create(spec(
            "in",
            ZoneConfig::Fifo {
                path: path.clone(),
                auto_scroll: true,
                max_lines: 10,
            },
        ))
        .unwrap();
    assert!(err.is_none(), "{err:?}");

    let mut writer = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    writer.write_all(b"A\nB\nC\n").unwrap();
    drop(writer);

    let ok = pump_until(&mut mgr, &rx, Duration::from_secs(10), |mgr| {
        buffer_text(mgr, "in").len() >= 3
    });
    assert!(ok, "fifo lines not delivered");
    assert_eq!(buffer_text(&mgr, "in"), vec!["A", "B", "C"]);
    assert_eq!(mgr.get("in").unwrap().buffer.scroll_offset, 0);

    // Delete releases the pipe we created.
    mgr.delete("in").unwrap();
    assert!(!path.exists(), "fifo file should be removed on delete");
}

#[test]
fn deleted_zone_events_do_not_resurrect_state() {
    let (tx, rx) = zone_event_channel();
    let mut mgr = ZoneManager::new(tx, false);
    mgr.create(spec(
        "short",
        ZoneConfig::Pipe {
            command: "printf 'x\\n'".to_string(),
            auto_scroll: true,
            max_lines: 10,
        },
    ))
    .unwrap();
    // Delete immediately; the pipe's events may still be queued.
    mgr.delete("short").unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Ok(ev) = rx.recv_timeout(Duration::from_millis(50)) {
            mgr.apply_event(ev);
        }
    }
    assert!(mgr.is_empty());
}

#[test]
fn pipe_zone_caps_buffer_at_max_lines() {
    let (tx, rx) = zone_event_channel();
    let mut mgr = ZoneManager::new(tx, false);
    mgr.create(spec(
        "burst",
        ZoneConfig::Pipe {
            command: "seq 1 50".to_string(),
            auto_scroll: true,
            max_lines: 10,
        },
    ))
    .unwrap();
    let ok = pump_until(&mut mgr, &rx, Duration::from_secs(10), |mgr| {
        mgr.get("burst")
            .is_some_and(|z| matches!(z.state, core_events::ZoneRunState::Stopped))
    });
    assert!(ok, "pipe should finish");
    let lines = buffer_text(&mgr, "burst");
    assert_eq!(lines.len(), 10, "buffer capped at max_lines");
    assert_eq!(lines.last().map(String::as_str), Some("50"));
    mgr.delete("burst").unwrap();
}
