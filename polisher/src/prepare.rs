//! Compress, sort, and index the alignments by samtools.
use crate::artifact::{TempArtifact, Workspace};
use crate::errors::Result;
use crate::mapper::AlignmentStream;
use crate::tool::{Invocation, ToolRunner};
use definitions::{ArtifactKind, Pass, PipelineState};
use log::*;
use std::path::Path;

/// Sorted BAM file with its index. Both are removed at the end of the pass.
#[derive(Debug)]
pub struct AlignmentStore {
    bam: TempArtifact,
    index: TempArtifact,
}

impl AlignmentStore {
    pub fn path(&self) -> &Path {
        self.bam.path()
    }
    pub fn index_path(&self) -> &Path {
        self.index.path()
    }
    pub fn release(self) -> Result<()> {
        let Self { bam, index } = self;
        let bam = bam.release();
        index.release()?;
        bam
    }
}

#[derive(Debug, Clone)]
pub struct AlignmentPreparer<'a> {
    program: &'a str,
    threads: usize,
}

impl<'a> AlignmentPreparer<'a> {
    pub fn new(program: &'a str, threads: usize) -> Self {
        Self { program, threads }
    }
    /// Turn the alignment stream into a sorted and indexed store.
    /// Unmapped and secondary alignments are kept as they are.
    pub fn prepare<R: ToolRunner>(
        &self,
        runner: &mut R,
        pass: Pass,
        stream: &AlignmentStream,
        workspace: &Workspace,
    ) -> Result<AlignmentStore> {
        let state = PipelineState::Prepare(pass);
        debug!("START\tPreparing\t{pass}\t{:?}", stream.path());
        // Compress.
        let compressed = workspace.allocate(ArtifactKind::CompressedAlignment)?;
        let view = Invocation::new(state, self.program)
            .args(["view", "-b"])
            .arg(stream.path())
            .stdout_to(compressed.path());
        runner.run(&view)?;
        // Sort.
        let bam = workspace.allocate(ArtifactKind::AlignmentStore)?;
        let sort_prefix = bam.path().with_extension("tmp");
        let sort = Invocation::new(state, self.program)
            .arg("sort")
            .arg("-@")
            .arg(self.threads.to_string())
            .arg("-T")
            .arg(&sort_prefix)
            .arg(compressed.path())
            .stdout_to(bam.path());
        runner.run(&sort)?;
        // Index.
        let mut bai = bam.path().as_os_str().to_os_string();
        bai.push(ArtifactKind::AlignmentIndex.suffix());
        let index = TempArtifact::adopt(bai, ArtifactKind::AlignmentIndex);
        let index_invocation = Invocation::new(state, self.program)
            .arg("index")
            .arg(bam.path());
        runner.run(&index_invocation)?;
        compressed.release()?;
        Ok(AlignmentStore { bam, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PolishError;
    use crate::mapper::ReadMapper;
    use crate::mocks::MockRunner;
    use crate::signal_index::ReadSet;
    fn stream_of(runner: &mut MockRunner, ws: &Workspace, pass: Pass) -> AlignmentStream {
        let output = ws.allocate(ArtifactKind::AlignmentStream).unwrap();
        let reads = ReadSet::new("/data/reads.fq");
        ReadMapper::new("minimap2", 1)
            .map(runner, pass, Path::new("/data/ref.fa"), &reads, 4, output)
            .unwrap()
    }
    #[test]
    fn prepare_store() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(Some(dir.path()));
        let mut runner = MockRunner::new();
        let stream = stream_of(&mut runner, &ws, Pass::First);
        let preparer = AlignmentPreparer::new("samtools", 2);
        let store = preparer
            .prepare(&mut runner, Pass::First, &stream, &ws)
            .unwrap();
        let subcommands: Vec<_> = runner.invocations[1..]
            .iter()
            .map(|inv| inv.subcommand().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(subcommands, vec!["view", "sort", "index"]);
        let view = &runner.invocations[1];
        let sort = &runner.invocations[2];
        let index = &runner.invocations[3];
        // Each step reads what the previous one wrote.
        assert_eq!(view.args.last().unwrap(), stream.path().as_os_str());
        assert_eq!(sort.args.last().unwrap(), view.stdout.as_ref().unwrap().as_os_str());
        assert_eq!(sort.value_of("-@").unwrap(), "2");
        assert_eq!(sort.stdout.as_deref(), Some(store.path()));
        assert_eq!(index.args.last().unwrap(), store.path().as_os_str());
        assert!(index.stdout.is_none());
        // The compressed intermediate is gone, the store and its index are there.
        assert!(!view.stdout.as_ref().unwrap().exists());
        assert!(store.path().exists());
        assert!(store.index_path().exists());
        assert!(store
            .index_path()
            .to_string_lossy()
            .ends_with(".sorted.bam.bai"));
        store.release().unwrap();
        stream.release().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
    #[test]
    fn failure_in_each_step_cleans_up() {
        for step in ["view", "sort", "index"] {
            let dir = tempfile::tempdir().unwrap();
            let ws = Workspace::new(Some(dir.path()));
            let state = PipelineState::Prepare(Pass::Third);
            let mut runner = MockRunner::failing_at_step(state, step);
            let stream = stream_of(&mut runner, &ws, Pass::Third);
            let preparer = AlignmentPreparer::new("samtools", 1);
            match preparer.prepare(&mut runner, Pass::Third, &stream, &ws) {
                Err(PolishError::ExternalTool { state: failed, command, .. }) => {
                    assert_eq!(failed, state);
                    assert!(command.starts_with(&format!("samtools {}", step)));
                }
                res => panic!("{:?}", res),
            }
            // Only the stream, owned by the caller, is left.
            let left: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|e| e.unwrap().path())
                .collect();
            assert_eq!(left, vec![stream.path().to_path_buf()], "{}", step);
        }
    }
}
