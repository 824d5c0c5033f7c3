/// Per-import scratch directories under the configured scratch root
use assembly_core::{AssemblyError, AssemblyResult, ImportConfig, ScratchRetention};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Source of the unique suffix of each scratch directory
pub type UuidGenerator = Arc<dyn Fn() -> Uuid + Send + Sync>;

/// Factory for scratch directories; cheap to clone into workers
#[derive(Clone)]
pub struct ScratchSpace {
    root: PathBuf,
    retention: ScratchRetention,
    uuid_gen: UuidGenerator,
}

impl std::fmt::Debug for ScratchSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchSpace")
            .field("root", &self.root)
            .field("retention", &self.retention)
            .finish()
    }
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>, retention: ScratchRetention) -> Self {
        Self {
            root: root.into(),
            retention,
            uuid_gen: Arc::new(Uuid::new_v4),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.scratch_dir.clone(), config.scratch_retention)
    }

    /// Replace the uuid source, e.g. with a deterministic sequence in tests
    pub fn with_uuid_generator(mut self, uuid_gen: UuidGenerator) -> Self {
        self.uuid_gen = uuid_gen;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> ScratchRetention {
        self.retention
    }

    /// Create `<root>/<prefix>_<uuid>` outside of any session
    pub fn create_dir(&self, prefix: &str) -> AssemblyResult<PathBuf> {
        let dir = self.root.join(format!("{}_{}", prefix, (self.uuid_gen)()));
        fs::create_dir_all(&dir)?;
        debug!("Created scratch directory {}", dir.display());
        Ok(dir)
    }

    /// Start tracking the directories of one import call
    pub fn session(&self) -> ScratchSession {
        ScratchSession {
            space: self.clone(),
            dirs: Vec::new(),
            succeeded: false,
        }
    }
}

/// Directories created by one import call.
///
/// The retention policy is applied when the session is dropped.
#[derive(Debug)]
pub struct ScratchSession {
    space: ScratchSpace,
    dirs: Vec<PathBuf>,
    succeeded: bool,
}

impl ScratchSession {
    /// Create a fresh `import_fasta_<uuid>` directory
    pub fn create_dir(&mut self) -> AssemblyResult<PathBuf> {
        let dir = self.space.create_dir("import_fasta")?;
        self.dirs.push(dir.clone());
        Ok(dir)
    }

    /// Place `src` in a fresh session directory under its own file name
    pub fn stage_file(&mut self, src: &Path) -> AssemblyResult<PathBuf> {
        let file_name = src.file_name().ok_or_else(|| {
            AssemblyError::InvalidInput(format!("Not a file path: {}", src.display()))
        })?;
        let dest = self.create_dir()?.join(file_name);
        link_or_copy(src, &dest)?;
        Ok(dest)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn mark_success(&mut self) {
        self.succeeded = true;
    }

    fn should_remove(&self) -> bool {
        match self.space.retention {
            ScratchRetention::Keep => false,
            ScratchRetention::RemoveOnSuccess => self.succeeded,
            ScratchRetention::RemoveAlways => true,
        }
    }
}

impl Drop for ScratchSession {
    fn drop(&mut self) {
        if !self.should_remove() {
            return;
        }
        for dir in &self.dirs {
            if let Err(e) = fs::remove_dir_all(dir) {
                warn!("Failed to remove scratch directory {}: {}", dir.display(), e);
            }
        }
    }
}

/// Hard link `src` to `dest`, falling back to a copy across filesystems
fn link_or_copy(src: &Path, dest: &Path) -> AssemblyResult<()> {
    if let Err(e) = fs::hard_link(src, dest) {
        debug!(
            "Hard link of {} failed ({}), copying instead",
            src.display(),
            e
        );
        fs::copy(src, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;

    fn counting_space(root: &Path, retention: ScratchRetention) -> ScratchSpace {
        let counter = Arc::new(AtomicU64::new(1));
        ScratchSpace::new(root, retention).with_uuid_generator(Arc::new(move || {
            Uuid::from_u128(counter.fetch_add(1, Ordering::SeqCst) as u128)
        }))
    }

    #[test]
    fn test_dirs_use_injected_uuids() {
        let tmp = TempDir::new().unwrap();
        let space = counting_space(tmp.path(), ScratchRetention::Keep);
        let mut session = space.session();

        let first = session.create_dir().unwrap();
        let second = session.create_dir().unwrap();
        assert_eq!(
            first,
            tmp.path().join("import_fasta_00000000-0000-0000-0000-000000000001")
        );
        assert_eq!(
            second,
            tmp.path().join("import_fasta_00000000-0000-0000-0000-000000000002")
        );
        assert!(first.is_dir() && second.is_dir());
    }

    #[test]
    fn test_stage_file_leaves_source_intact() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("in.fa");
        fs::write(&src, ">a\nACGT\n").unwrap();
        let space = counting_space(&tmp.path().join("scratch"), ScratchRetention::Keep);
        let mut session = space.session();

        let staged = session.stage_file(&src).unwrap();
        assert_eq!(staged.parent(), Some(session.dirs()[0].as_path()));
        assert_eq!(staged.file_name().unwrap(), "in.fa");
        assert_eq!(fs::read_to_string(&staged).unwrap(), ">a\nACGT\n");
        assert!(src.exists());
    }

    #[test]
    fn test_keep_retention() {
        let tmp = TempDir::new().unwrap();
        let space = counting_space(tmp.path(), ScratchRetention::Keep);
        let dir = {
            let mut session = space.session();
            session.create_dir().unwrap()
        };
        assert!(dir.exists());
    }

    #[test]
    fn test_remove_on_success_keeps_failed_imports() {
        let tmp = TempDir::new().unwrap();
        let space = counting_space(tmp.path(), ScratchRetention::RemoveOnSuccess);

        let failed = {
            let mut session = space.session();
            session.create_dir().unwrap()
        };
        let succeeded = {
            let mut session = space.session();
            let dir = session.create_dir().unwrap();
            session.mark_success();
            dir
        };
        assert!(failed.exists());
        assert!(!succeeded.exists());
    }

    #[test]
    fn test_remove_always() {
        let tmp = TempDir::new().unwrap();
        let space = counting_space(tmp.path(), ScratchRetention::RemoveAlways);
        let dir = {
            let mut session = space.session();
            session.create_dir().unwrap()
        };
        assert!(!dir.exists());
    }
}
