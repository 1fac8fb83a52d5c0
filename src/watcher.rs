//! Config-file watcher.
//!
//! Watches the parent directory of the config file (editors typically
//! replace files rather than write them in place), filters events down to
//! the watched file, and bridges them into a tokio watch channel. The
//! debouncer coalesces rapid successive writes into one event.
//!
//! Pure plumbing: no resolution logic lives here.

use notify_debouncer_mini::{DebouncedEvent, DebouncedEventKind, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Event emitted for the watched config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// The file was written, created, or replaced.
    Changed(PathBuf),
    /// The underlying watcher reported an error.
    Error(String),
}

/// Watcher tuning.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce window for coalescing rapid changes.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

/// Handle to a running file watcher.
pub struct FileWatcherHandle {
    events: watch::Receiver<Option<FileEvent>>,
    _task: tokio::task::JoinHandle<()>,
}

impl FileWatcherHandle {
    /// Wait for the next event. Returns `None` when the watcher task has
    /// stopped.
    pub async fn next_event(&mut self) -> Option<FileEvent> {
        loop {
            if self.events.changed().await.is_err() {
                return None;
            }
            let event = self.events.borrow_and_update().clone();
            if event.is_some() {
                return event;
            }
        }
    }
}

/// Start watching the given config file.
///
/// Must be called within a tokio runtime: the bridge between the blocking
/// notify callback and the async channel runs on the blocking pool.
pub fn start_file_watcher(
    file: PathBuf,
    config: WatcherConfig,
) -> Result<FileWatcherHandle, notify::Error> {
    let (event_tx, event_rx) = watch::channel(None);
    let (notify_tx, notify_rx) = mpsc::channel();

    let mut debouncer = new_debouncer(config.debounce, notify_tx)?;
    let dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    info!(
        dir = %dir.display(),
        file = %file.display(),
        "watching config file"
    );
    debouncer
        .watcher()
        .watch(&dir, notify::RecursiveMode::NonRecursive)?;

    let task = tokio::task::spawn_blocking(move || {
        // Keep the debouncer alive for the lifetime of the bridge.
        let _debouncer = debouncer;
        forward_events(notify_rx, event_tx, &file);
    });

    Ok(FileWatcherHandle {
        events: event_rx,
        _task: task,
    })
}

fn forward_events(
    rx: mpsc::Receiver<Result<Vec<DebouncedEvent>, notify::Error>>,
    tx: watch::Sender<Option<FileEvent>>,
    file: &Path,
) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                if let Some(event) = classify_events(events, file) {
                    debug!(?event, "config file change detected");
                    if tx.send(Some(event)).is_err() {
                        info!("config watcher receiver dropped, stopping");
                        return;
                    }
                }
            }
            Ok(Err(err)) => {
                let _ = tx.send(Some(FileEvent::Error(err.to_string())));
            }
            Err(_) => {
                info!("config watcher channel closed, stopping");
                return;
            }
        }
    }
}

/// Collapse a debounced batch into at most one event for the watched file.
fn classify_events(events: Vec<DebouncedEvent>, file: &Path) -> Option<FileEvent> {
    events.into_iter().find_map(|event| {
        if !matches!(
            event.kind,
            DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
        ) {
            return None;
        }
        if paths_match(&event.path, file) {
            Some(FileEvent::Changed(event.path))
        } else {
            None
        }
    })
}

/// The notify backend may report absolute paths for a watch configured with
/// a relative one; fall back to comparing file names when the full paths
/// differ.
fn paths_match(event_path: &Path, file: &Path) -> bool {
    if event_path == file {
        return true;
    }
    match (event_path.file_name(), file.file_name()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
