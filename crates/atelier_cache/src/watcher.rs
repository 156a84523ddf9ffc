//! File system watcher feeding cache invalidation
//!
//! The watcher only reports; the host forwards each change as a URI to
//! whatever evicts cache entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(feature = "file-watcher")]
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Error while setting up a watch
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    Create(String),
    #[error("Failed to watch {path:?}: {reason}")]
    Watch { path: PathBuf, reason: String },
}

/// A file change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path to the changed file
    pub path: PathBuf,
    /// Type of change
    pub kind: FileChangeKind,
}

impl FileChange {
    /// The path as a cache key
    pub fn uri(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// Type of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
}

/// Extensions reported by default
const DEFAULT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "hdr", "ktx2", // Textures
    "gltf", "glb", "obj", "fbx", // Models
    "json", // Scenes
];

/// Watches directories and reports changed resource files.
pub struct FileWatcher {
    #[cfg(feature = "file-watcher")]
    watcher: notify::RecommendedWatcher,
    #[cfg(feature = "file-watcher")]
    rx: crossbeam_channel::Receiver<notify::Result<Event>>,

    /// Last report per path
    debounce: HashMap<PathBuf, Instant>,
    debounce_duration: Duration,
    extensions: Vec<String>,
    watch_dirs: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher
    #[cfg(feature = "file-watcher")]
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|e| WatchError::Create(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            debounce: HashMap::new(),
            debounce_duration: Duration::from_millis(100),
            extensions: default_extensions(),
            watch_dirs: Vec::new(),
        })
    }

    /// Create an inert watcher (no file-watcher feature)
    #[cfg(not(feature = "file-watcher"))]
    pub fn new() -> Result<Self, WatchError> {
        Ok(Self {
            debounce: HashMap::new(),
            debounce_duration: Duration::from_millis(100),
            extensions: default_extensions(),
            watch_dirs: Vec::new(),
        })
    }

    /// Watch a directory recursively
    #[cfg(feature = "file-watcher")]
    pub fn watch(&mut self, dir: impl AsRef<Path>) -> Result<(), WatchError> {
        let path = dir.as_ref().to_path_buf();

        self.watcher
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|e| WatchError::Watch {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        log::info!("Watching directory: {:?}", path);
        self.watch_dirs.push(path);
        Ok(())
    }

    /// Record a directory (no file-watcher feature)
    #[cfg(not(feature = "file-watcher"))]
    pub fn watch(&mut self, dir: impl AsRef<Path>) -> Result<(), WatchError> {
        self.watch_dirs.push(dir.as_ref().to_path_buf());
        Ok(())
    }

    /// Drain pending events
    #[cfg(feature = "file-watcher")]
    pub fn poll(&mut self) -> Vec<FileChange> {
        let mut changes = Vec::new();
        let now = Instant::now();

        while let Ok(result) = self.rx.try_recv() {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    log::warn!("File watcher error: {}", err);
                    continue;
                }
            };

            let kind = match event.kind {
                EventKind::Create(_) => FileChangeKind::Created,
                EventKind::Modify(_) => FileChangeKind::Modified,
                EventKind::Remove(_) => FileChangeKind::Deleted,
                _ => continue,
            };

            for path in event.paths {
                if path.is_dir() || !self.is_watched_file(&path) {
                    continue;
                }
                if let Some(last) = self.debounce.get(&path) {
                    if now.duration_since(*last) < self.debounce_duration {
                        continue;
                    }
                }

                self.debounce.insert(path.clone(), now);
                changes.push(FileChange { path, kind });
            }
        }

        self.debounce
            .retain(|_, time| now.duration_since(*time) < Duration::from_secs(5));

        changes
    }

    /// Drain pending events (always empty without the file-watcher feature)
    #[cfg(not(feature = "file-watcher"))]
    pub fn poll(&mut self) -> Vec<FileChange> {
        Vec::new()
    }

    /// Check if a path has one of the reported extensions
    pub fn is_watched_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }

    /// Replace the reported extensions (without dots, case-insensitive)
    pub fn set_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
    }

    /// Get the list of watched directories
    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    /// Set debounce duration
    pub fn set_debounce(&mut self, duration: Duration) {
        self.debounce_duration = duration;
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}
