//! Pipeline -- refine a consensus sequence in three passes.
//!
//! Each pass maps the reads to the current reference, sorts and indexes the alignments, and calls a new consensus.
//! The first pass uses the user's reference with the standard gap penalty,
//! the second remaps to the first consensus with the lower penalty to tolerate indels,
//! and the third remaps to the second consensus with the standard penalty again.
//! The third consensus is written next to the output and renamed into place only when everything succeeded.
use crate::artifact::{TempArtifact, Workspace};
use crate::consensus::ConsensusCaller;
use crate::errors::{PolishError, Result};
use crate::inputs::Inputs;
use crate::mapper::ReadMapper;
use crate::prepare::AlignmentPreparer;
use crate::signal_index::{ReadSet, SignalIndexer};
use crate::tool::{CountingRunner, ProcessRunner, ToolRunner};
use definitions::{ArtifactKind, Pass, PipelineConfig, PipelineState, ToolPaths};
use log::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What happened in a successful run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PipelineReport {
    pub output: PathBuf,
    /// Visited states in order, ending with Done.
    pub states: Vec<PipelineState>,
    /// Gap-open penalties in the order of the mapping steps.
    pub gap_open_penalties: Vec<u32>,
    /// Number of external programs launched.
    pub invocations: usize,
    pub signal_index: Option<PathBuf>,
}

/// Validate the configuration and run the pipeline with the real tools.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    let mut runner = ProcessRunner::new();
    run_pipeline_with(config, &mut runner)
}

/// Validate the configuration and run the pipeline with `runner`.
/// A configuration error is returned before the runner is used at all.
pub fn run_pipeline_with<R: ToolRunner>(
    config: &PipelineConfig,
    runner: &mut R,
) -> Result<PipelineReport> {
    let inputs = Inputs::validate(config)?;
    info!(
        "START\tRefining {:?} with {:?} (gap-open {:?})",
        inputs.reference, inputs.reads, inputs.penalties
    );
    IterativeConsensusPipeline::new(&inputs, &config.tools, runner).run()
}

pub struct IterativeConsensusPipeline<'a, R: ToolRunner> {
    inputs: &'a Inputs,
    tools: &'a ToolPaths,
    runner: CountingRunner<'a, R>,
    workspace: Workspace,
    state: Option<PipelineState>,
    states: Vec<PipelineState>,
    gap_open_penalties: Vec<u32>,
}

impl<'a, R: ToolRunner> IterativeConsensusPipeline<'a, R> {
    pub fn new(inputs: &'a Inputs, tools: &'a ToolPaths, runner: &'a mut R) -> Self {
        let workspace = Workspace::new(inputs.temp_dir.as_deref());
        debug!("WORKSPACE\t{}", workspace.dir().display());
        Self {
            inputs,
            tools,
            runner: CountingRunner::new(runner),
            workspace,
            state: None,
            states: vec![],
            gap_open_penalties: vec![],
        }
    }
    pub fn run(mut self) -> Result<PipelineReport> {
        match self.execute() {
            Ok(signal_index) => {
                self.transition(PipelineState::Done);
                info!("DONE\t{}", self.inputs.output.display());
                Ok(PipelineReport {
                    output: self.inputs.output.clone(),
                    states: self.states,
                    gap_open_penalties: self.gap_open_penalties,
                    invocations: self.runner.count(),
                    signal_index,
                })
            }
            Err(why) => {
                self.fail(&why);
                Err(why)
            }
        }
    }
    fn transition(&mut self, to: PipelineState) {
        match self.state {
            Some(from) => {
                debug_assert!(from.can_move_to(to), "{} -> {}", from, to);
                info!("STATE\t{} -> {}", from, to);
            }
            None => {
                debug_assert_eq!(PipelineState::start(self.inputs.raw_signal.is_some()), to);
                info!("STATE\t{}", to);
            }
        }
        self.state = Some(to);
        self.states.push(to);
    }
    fn fail(&mut self, why: &PolishError) {
        let from = match self.state {
            Some(state) => state.to_string(),
            None => "START".to_string(),
        };
        match why.state() {
            Some(at) if Some(at) != self.state => {
                info!("STATE\t{} -> {}\t(at {})", from, PipelineState::Failed, at)
            }
            _ => info!("STATE\t{} -> {}", from, PipelineState::Failed),
        }
        self.state = Some(PipelineState::Failed);
        self.states.push(PipelineState::Failed);
    }
    fn execute(&mut self) -> Result<Option<PathBuf>> {
        let inputs = self.inputs;
        let mut reads = ReadSet::new(&inputs.reads);
        if let Some(signal) = inputs.raw_signal.as_ref() {
            self.transition(PipelineState::Indexing);
            let indexer = SignalIndexer::new(&self.tools.nanopolish);
            reads.signal_index = Some(indexer.index(&mut self.runner, &reads, signal)?);
        }
        let first = self.refine(Pass::First, &inputs.reference, &reads)?;
        let second = self.refine(Pass::Second, first.path(), &reads)?;
        first.release()?;
        let third = self.refine(Pass::Third, second.path(), &reads)?;
        second.release()?;
        third.persist(&inputs.output)?;
        Ok(reads.signal_index.map(|index| index.index))
    }
    /// One pass. The alignments are removed before returning, the consensus is handed to the caller.
    fn refine(&mut self, pass: Pass, reference: &Path, reads: &ReadSet) -> Result<TempArtifact> {
        let (inputs, tools) = (self.inputs, self.tools);
        let gap_open = inputs.penalties.gap_open(pass);
        self.transition(PipelineState::Map(pass));
        self.gap_open_penalties.push(gap_open);
        let output = self.workspace.allocate(ArtifactKind::AlignmentStream)?;
        let mapper = ReadMapper::new(&tools.minimap2, inputs.threads);
        let stream = mapper.map(&mut self.runner, pass, reference, reads, gap_open, output)?;
        self.transition(PipelineState::Prepare(pass));
        let preparer = AlignmentPreparer::new(&tools.samtools, inputs.threads);
        let store = preparer.prepare(&mut self.runner, pass, &stream, &self.workspace)?;
        self.transition(PipelineState::Call(pass));
        let consensus = if pass.is_last() {
            TempArtifact::create_in(&inputs.output_dir(), ArtifactKind::Consensus)?
        } else {
            self.workspace.allocate(ArtifactKind::Consensus)?
        };
        let caller = ConsensusCaller::new(&tools.nanopolish);
        caller.call(
            &mut self.runner,
            pass,
            reference,
            reads,
            &store,
            &self.workspace,
            &consensus,
        )?;
        store.release()?;
        stream.release()?;
        Ok(consensus)
    }
}
