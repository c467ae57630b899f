use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use super::error::FeedError;
use super::snapshot::Snapshot;

const FILE_PREFIX: &str = "adsb_data_";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percent: f64,
}

/// Plays back recorded `adsb_data_<n>.json` snapshots in numeric order.
pub struct JsonReplay {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
}

impl JsonReplay {
    pub fn open(dir: &Path, looping: bool) -> Result<Self, FeedError> {
        if !dir.is_dir() {
            return Err(FeedError::DirectoryNotFound(dir.display().to_string()));
        }

        let mut files: Vec<(u64, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(suffix) = stem.strip_prefix(FILE_PREFIX) {
                files.push((suffix.parse().unwrap_or(0), path.clone()));
            }
        }
        files.sort();

        if files.is_empty() {
            log::warn!("No {}*.json files in {}", FILE_PREFIX, dir.display());
        } else {
            log::info!("Found {} replay files in {}", files.len(), dir.display());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            files: files.into_iter().map(|(_, path)| path).collect(),
            cursor: 0,
            looping,
        })
    }

    /// Next readable snapshot. Unreadable files are logged and skipped.
    /// Returns `None` once the files are exhausted and looping is off.
    pub fn read_next(&mut self) -> Option<Snapshot> {
        if self.files.is_empty() {
            return None;
        }

        if self.cursor >= self.files.len() {
            if !self.looping {
                return None;
            }
            log::info!("Replay rewound to the first file");
            self.cursor = 0;
        }

        while self.cursor < self.files.len() {
            let path = &self.files[self.cursor];
            self.cursor += 1;

            match read_snapshot(path) {
                Ok(snapshot) => {
                    log::debug!(
                        "Read {} ({} aircraft)",
                        path.display(),
                        snapshot.aircraft.len()
                    );
                    return Some(snapshot);
                }
                Err(e) => log::error!("Skipping replay file: {}", e),
            }
        }

        None
    }

    pub fn progress(&self) -> Progress {
        let total = self.files.len();
        let percent = if total > 0 {
            self.cursor as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Progress {
            current: self.cursor,
            total,
            percent,
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        log::info!("Replay reset to the first file");
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.files.len()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, FeedError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| FeedError::Json {
        file: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn snapshot_with(now: f64) -> String {
        format!(r#"{{"now": {}, "aircraft": []}}"#, now)
    }

    #[test]
    fn files_are_read_in_numeric_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "adsb_data_10.json", &snapshot_with(10.0));
        write(&dir, "adsb_data_2.json", &snapshot_with(2.0));
        write(&dir, "adsb_data_1.json", &snapshot_with(1.0));
        write(&dir, "notes.json", &snapshot_with(99.0));
        write(&dir, "adsb_data_3.txt", &snapshot_with(99.0));

        let mut replay = JsonReplay::open(dir.path(), false).unwrap();
        assert_eq!(replay.files().len(), 3);

        let order: Vec<f64> = std::iter::from_fn(|| replay.read_next())
            .map(|s| s.now.unwrap())
            .collect();
        assert_eq!(order, vec![1.0, 2.0, 10.0]);
        assert!(replay.is_finished());
        assert!(replay.read_next().is_none());
    }

    #[test]
    fn broken_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "adsb_data_1.json", "{ not json");
        write(&dir, "adsb_data_2.json", &snapshot_with(2.0));

        let mut replay = JsonReplay::open(dir.path(), false).unwrap();
        assert_eq!(replay.read_next().unwrap().now, Some(2.0));
        assert!(replay.read_next().is_none());
    }

    #[test]
    fn looping_rewinds() {
        let dir = TempDir::new().unwrap();
        write(&dir, "adsb_data_1.json", &snapshot_with(1.0));
        write(&dir, "adsb_data_2.json", &snapshot_with(2.0));

        let mut replay = JsonReplay::open(dir.path(), true).unwrap();
        let order: Vec<f64> = (0..5)
            .filter_map(|_| replay.read_next())
            .map(|s| s.now.unwrap())
            .collect();
        assert_eq!(order, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
        assert!(!replay.is_finished());
    }

    #[test]
    fn progress_and_reset() {
        let dir = TempDir::new().unwrap();
        for i in 1..=4 {
            write(&dir, &format!("adsb_data_{}.json", i), &snapshot_with(i as f64));
        }

        let mut replay = JsonReplay::open(dir.path(), false).unwrap();
        replay.read_next();
        assert_eq!(
            replay.progress(),
            Progress {
                current: 1,
                total: 4,
                percent: 25.0
            }
        );

        replay.reset();
        assert_eq!(replay.progress().current, 0);
        assert_eq!(replay.read_next().unwrap().now, Some(1.0));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = JsonReplay::open(&dir.path().join("absent"), false);
        assert!(matches!(result, Err(FeedError::DirectoryNotFound(_))));
    }
}
