//! Link the base-called reads to the raw signals by `nanopolish index`.
use crate::errors::Result;
use crate::tool::{Invocation, ToolRunner};
use definitions::PipelineState;
use log::*;
use std::path::{Path, PathBuf};

/// The reads, optionally indexed against their raw signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSet {
    pub fastq: PathBuf,
    pub signal_index: Option<SignalIndex>,
}

impl ReadSet {
    pub fn new<P: Into<PathBuf>>(fastq: P) -> Self {
        Self {
            fastq: fastq.into(),
            signal_index: None,
        }
    }
    pub fn path(&self) -> &Path {
        &self.fastq
    }
}

/// The read database written next to the reads. It belongs to the reads directory and is never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalIndex {
    pub signal_archive: PathBuf,
    pub index: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SignalIndexer<'a> {
    program: &'a str,
}

impl<'a> SignalIndexer<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }
    pub fn index<R: ToolRunner>(
        &self,
        runner: &mut R,
        reads: &ReadSet,
        signal_archive: &Path,
    ) -> Result<SignalIndex> {
        debug!("START\tIndexing {:?} against {:?}", reads.path(), signal_archive);
        let invocation = Invocation::new(PipelineState::Indexing, self.program)
            .arg("index")
            .arg("-d")
            .arg(signal_archive)
            .arg(reads.path());
        runner.run(&invocation)?;
        let mut index = reads.path().as_os_str().to_os_string();
        index.push(".index");
        let index = PathBuf::from(index);
        if !index.exists() {
            warn!("{} exited cleanly but {:?} is missing", self.program, index);
        }
        Ok(SignalIndex {
            signal_archive: signal_archive.to_path_buf(),
            index,
        })
    }
}
