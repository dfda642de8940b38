//! Temporary artifacts exchanged between the steps.
//!
//! Each artifact owns its path: the file is removed when the value is dropped,
//! so an early return on an error cleans up whatever the failing step has allocated.
//! On the success path the artifacts are released explicitly to surface a failed removal.
use crate::errors::{PolishError, Result};
use definitions::ArtifactKind;
use log::*;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

const PREFIX: &str = "polisher.";

/// The directory where the temporary artifacts of a run live.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: Option<&Path>) -> Self {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };
        Self { dir }
    }
    pub fn dir(&self) -> &Path {
        &self.dir
    }
    /// Allocate a fresh, uniquely named artifact in the workspace.
    pub fn allocate(&self, kind: ArtifactKind) -> Result<TempArtifact> {
        TempArtifact::create_in(&self.dir, kind)
    }
}

#[derive(Debug)]
pub struct TempArtifact {
    kind: ArtifactKind,
    path: TempPath,
}

impl TempArtifact {
    /// Create an empty file with a unique name in `dir`.
    pub fn create_in(dir: &Path, kind: ArtifactKind) -> Result<Self> {
        let prefix = format!("{}{}.", PREFIX, kind.prefix());
        let path = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(kind.suffix())
            .tempfile_in(dir)
            .map_err(|e| PolishError::resource(format!("{} in {}", kind, dir.display()), e))?
            .into_temp_path();
        trace!("ALLOC\t{}\t{}", kind, path.display());
        Ok(Self { kind, path })
    }
    /// Take over a path written by an external tool, e.g., an index next to its input.
    /// The file does not need to exist yet.
    pub fn adopt<P: Into<PathBuf>>(path: P, kind: ArtifactKind) -> Self {
        Self {
            kind,
            path: TempPath::from_path(path),
        }
    }
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// Remove the file. A file that was never written is fine.
    pub fn release(self) -> Result<()> {
        let display = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => {
                trace!("CLEAN\t{}\t{}", self.kind, display);
                Ok(())
            }
            Err(why) if why.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(why) => Err(PolishError::resource(
                format!("{} {}", self.kind, display),
                why,
            )),
        }
    }
    /// Atomically move the artifact to `dest`. It must be on the same filesystem.
    pub fn persist(self, dest: &Path) -> Result<()> {
        let kind = self.kind;
        self.path.persist(dest).map_err(|why| {
            PolishError::resource(format!("{} -> {}", kind, dest.display()), why.error)
        })?;
        debug!("PERSIST\t{}\t{}", kind, dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }
    #[test]
    fn allocate_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(Some(dir.path()));
        let stream = ws.allocate(ArtifactKind::AlignmentStream).unwrap();
        let other = ws.allocate(ArtifactKind::AlignmentStream).unwrap();
        assert_ne!(stream.path(), other.path());
        assert!(stream.path().exists());
        assert!(stream.path().starts_with(dir.path()));
        let name = stream.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("polisher.stream."), "{}", name);
        assert!(name.ends_with(".sam"), "{}", name);
        assert_eq!(entries(dir.path()), 2);
        stream.release().unwrap();
        assert_eq!(entries(dir.path()), 1);
        drop(other);
        assert_eq!(entries(dir.path()), 0);
    }
    #[test]
    fn adopted_path() {
        let dir = tempfile::tempdir().unwrap();
        let bai = dir.path().join("store.sorted.bam.bai");
        let never_written = TempArtifact::adopt(&bai, ArtifactKind::AlignmentIndex);
        never_written.release().unwrap();
        std::fs::write(&bai, b"BAI\x01").unwrap();
        let written = TempArtifact::adopt(&bai, ArtifactKind::AlignmentIndex);
        assert_eq!(written.kind(), ArtifactKind::AlignmentIndex);
        drop(written);
        assert!(!bai.exists());
    }
    #[test]
    fn persist_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("final.fasta");
        std::fs::write(&dest, ">old\nAAAA\n").unwrap();
        let consensus = TempArtifact::create_in(dir.path(), ArtifactKind::Consensus).unwrap();
        std::fs::write(consensus.path(), ">new\nACGT\n").unwrap();
        consensus.persist(&dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), ">new\nACGT\n");
        assert_eq!(entries(dir.path()), 1);
    }
    #[test]
    fn allocation_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");
        let ws = Workspace::new(Some(missing.as_path()));
        match ws.allocate(ArtifactKind::Variants) {
            Err(PolishError::Resource { what, .. }) => assert!(what.contains("variants")),
            res => panic!("{:?}", res),
        }
    }
}
