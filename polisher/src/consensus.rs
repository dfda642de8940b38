//! Call variants by nanopolish and apply them to the reference.
use crate::artifact::{TempArtifact, Workspace};
use crate::errors::Result;
use crate::prepare::AlignmentStore;
use crate::signal_index::ReadSet;
use crate::tool::{Invocation, ToolRunner};
use definitions::{ArtifactKind, Pass, PipelineState};
use log::*;
use std::path::Path;

/// Upper bound of the haplotypes explored by the variant caller.
pub const MAX_HAPLOTYPES: usize = 3000;
/// Worker threads of the variant caller.
pub const VARIANT_WORKERS: usize = 32;
pub const PLOIDY: usize = 1;

#[derive(Debug, Clone)]
pub struct ConsensusCaller<'a> {
    program: &'a str,
}

impl<'a> ConsensusCaller<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }
    /// Call the variants of the reads against `reference` and write the corrected reference into `output`.
    #[allow(clippy::too_many_arguments)]
    pub fn call<R: ToolRunner>(
        &self,
        runner: &mut R,
        pass: Pass,
        reference: &Path,
        reads: &ReadSet,
        store: &AlignmentStore,
        workspace: &Workspace,
        output: &TempArtifact,
    ) -> Result<()> {
        let state = PipelineState::Call(pass);
        debug!("START\tCalling\t{pass}\t{:?}", reference);
        if let Some(index) = reads.signal_index.as_ref() {
            trace!("SIGNAL\t{:?}", index.index);
        }
        let variants = workspace.allocate(ArtifactKind::Variants)?;
        let call = Invocation::new(state, self.program)
            .arg("variants")
            .arg("--max-haplotypes")
            .arg(MAX_HAPLOTYPES.to_string())
            .args(["--faster", "--fix-homopolymers", "--snps"])
            .arg("-t")
            .arg(VARIANT_WORKERS.to_string())
            .arg("-p")
            .arg(PLOIDY.to_string())
            .arg("--reads")
            .arg(reads.path())
            .arg("--bam")
            .arg(store.path())
            .arg("--genome")
            .arg(reference)
            .stdout_to(variants.path());
        runner.run(&call)?;
        let to_fasta = Invocation::new(state, self.program)
            .arg("vcf2fasta")
            .arg("-g")
            .arg(reference)
            .arg(variants.path())
            .stdout_to(output.path());
        runner.run(&to_fasta)?;
        variants.release()
    }
}
