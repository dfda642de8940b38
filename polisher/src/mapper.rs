//! Invoke minimap2 to align the reads to the current reference.
use crate::artifact::TempArtifact;
use crate::errors::Result;
use crate::signal_index::ReadSet;
use crate::tool::{Invocation, ToolRunner};
use definitions::{ArtifactKind, Pass, PipelineState};
use log::*;
use std::path::Path;

/// The preset of minimap2 for nanopore reads.
pub const LONG_READ_PRESET: &str = "map-ont";

/// The gap-extension penalty derived from the gap-open penalty.
/// Never below one, so that a gap-open penalty of one does not produce a zero extension.
pub fn gap_extension_penalty(gap_open: u32) -> u32 {
    (gap_open / 2).max(1)
}

/// SAM records written by the aligner. Removed at the end of the pass.
#[derive(Debug)]
pub struct AlignmentStream {
    file: TempArtifact,
}

impl AlignmentStream {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
    pub fn release(self) -> Result<()> {
        self.file.release()
    }
}

#[derive(Debug, Clone)]
pub struct ReadMapper<'a> {
    program: &'a str,
    threads: usize,
}

impl<'a> ReadMapper<'a> {
    pub fn new(program: &'a str, threads: usize) -> Self {
        Self { program, threads }
    }
    /// Align `reads` to `reference` and write the alignments into `output`, overwriting it.
    pub fn map<R: ToolRunner>(
        &self,
        runner: &mut R,
        pass: Pass,
        reference: &Path,
        reads: &ReadSet,
        gap_open: u32,
        output: TempArtifact,
    ) -> Result<AlignmentStream> {
        debug_assert_eq!(output.kind(), ArtifactKind::AlignmentStream);
        let gap_extend = gap_extension_penalty(gap_open);
        debug!("START\tMapping\t{pass}\tO={gap_open}\tE={gap_extend}\t{reference:?}");
        let invocation = Invocation::new(PipelineState::Map(pass), self.program)
            .args(["-x", LONG_READ_PRESET])
            .arg("-O")
            .arg(gap_open.to_string())
            .arg("-E")
            .arg(gap_extend.to_string())
            .arg("-a")
            .arg("-t")
            .arg(self.threads.to_string())
            .arg(reference)
            .arg(reads.path())
            .stdout_to(output.path());
        runner.run(&invocation)?;
        Ok(AlignmentStream { file: output })
    }
}
