use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::foundation::core::RunId;
use crate::foundation::error::{BoardgifError, BoardgifResult};

/// Scratch files belonging to one sequence index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedArtifact {
    pub index: usize,
    /// Intermediate vector description written by the renderer.
    pub vector_path: PathBuf,
    /// Raster file produced by the converter and read by the encode stage.
    pub raster_path: PathBuf,
}

/// Outcome of a cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    /// Registered but never created (or already gone).
    pub missing: usize,
    pub failed: usize,
}

/// Per-run scratch namespace.
///
/// Every path handed out by [`ScratchSpace::stage`] is registered immediately and deleted by
/// [`ScratchSpace::cleanup`], which also runs on drop. Deletion is best-effort; "not found" is
/// not an error.
#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
    run_id: RunId,
    registered: Mutex<Vec<PathBuf>>,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>, run_id: RunId) -> BoardgifResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            BoardgifError::scratch(format!("create scratch dir '{}': {e}", root.display()))
        })?;
        Ok(Self {
            root,
            run_id,
            registered: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// File-name prefix shared by every artifact of this run.
    pub fn file_prefix(&self) -> String {
        file_prefix(&self.run_id)
    }

    /// Derive (and register for cleanup) the scratch paths for `index`.
    pub fn stage(&self, index: usize) -> StagedArtifact {
        let base = format!("{}{index:03}", self.file_prefix());
        let artifact = StagedArtifact {
            index,
            vector_path: self.root.join(format!("{base}.svg")),
            raster_path: self.root.join(format!("{base}.png")),
        };
        let mut reg = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        reg.push(artifact.vector_path.clone());
        reg.push(artifact.raster_path.clone());
        artifact
    }

    pub fn registered_len(&self) -> usize {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delete every registered path. Safe to call more than once.
    pub fn cleanup(&self) -> CleanupReport {
        let paths = std::mem::take(
            &mut *self
                .registered
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut report = CleanupReport::default();
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => report.missing += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch file");
                }
            }
        }
        if report.removed + report.failed > 0 {
            tracing::debug!(
                run_id = %self.run_id,
                removed = report.removed,
                failed = report.failed,
                "scratch cleaned"
            );
        }
        report
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

pub(crate) fn file_prefix(run_id: &RunId) -> String {
    format!("boardgif-{run_id}-")
}

/// Files under `root` that belong to `run_id`.
pub fn files_for_run(root: &Path, run_id: &RunId) -> Vec<PathBuf> {
    let prefix = file_prefix(run_id);
    let Ok(rd) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    rd.flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "boardgif_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn paths_are_deterministic_and_distinct() {
        let dir = temp_dir("scratch_paths");
        let run = RunId::new("game1-run").unwrap();
        let s = ScratchSpace::new(&dir, run).unwrap();

        let a = s.stage(7);
        assert_eq!(a.vector_path, dir.join("boardgif-game1-run-007.svg"));
        assert_eq!(a.raster_path, dir.join("boardgif-game1-run-007.png"));
        assert_ne!(s.stage(8).raster_path, a.raster_path);
        assert_eq!(s.registered_len(), 4);

        drop(s);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cleanup_removes_created_and_ignores_missing() {
        let dir = temp_dir("scratch_cleanup");
        let run = RunId::new("r1").unwrap();
        let s = ScratchSpace::new(&dir, run.clone()).unwrap();

        let a = s.stage(0);
        let _b = s.stage(1);
        std::fs::write(&a.raster_path, b"x").unwrap();
        std::fs::write(&a.vector_path, b"x").unwrap();
        assert_eq!(files_for_run(&dir, &run).len(), 2);

        let report = s.cleanup();
        assert_eq!(report.removed, 2);
        assert_eq!(report.missing, 2);
        assert_eq!(report.failed, 0);
        assert!(files_for_run(&dir, &run).is_empty());
        assert_eq!(s.cleanup(), CleanupReport::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn drop_cleans_up() {
        let dir = temp_dir("scratch_drop");
        let run = RunId::new("r2").unwrap();
        {
            let s = ScratchSpace::new(&dir, run.clone()).unwrap();
            let a = s.stage(3);
            std::fs::write(&a.raster_path, b"x").unwrap();
        }
        assert!(files_for_run(&dir, &run).is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn other_runs_are_untouched() {
        let dir = temp_dir("scratch_isolation");
        let keep = ScratchSpace::new(&dir, RunId::new("keep").unwrap()).unwrap();
        let kept = keep.stage(0);
        std::fs::write(&kept.raster_path, b"x").unwrap();
        {
            let other = ScratchSpace::new(&dir, RunId::new("other").unwrap()).unwrap();
            std::fs::write(other.stage(0).raster_path, b"x").unwrap();
        }
        assert!(kept.raster_path.is_file());
        drop(keep);
        std::fs::remove_dir_all(&dir).ok();
    }
}
