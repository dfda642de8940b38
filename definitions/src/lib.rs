//! Definitions -- A tiny interface for the consensus refinement pipeline.
//! The configuration, the states of the pipeline, and the kinds of the temporary artifacts are shared between the library and the CLI through the structures defined here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_STANDARD_GAP_PENALTY: u32 = 4;
pub const DEFAULT_THREADS: usize = 1;

/// The configuration of the pipeline.
/// The inputs are optional here so that a missing one is reported by the validation step,
/// not by the deserializer. The lower gap penalty has no default: the caller must decide it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// The reference sequence (FASTA) used in the first pass.
    #[serde(default)]
    pub reference: Option<PathBuf>,
    /// The reads (FASTQ).
    #[serde(default)]
    pub reads: Option<PathBuf>,
    /// The archive of the raw signals. If given, the reads are indexed before the first pass.
    #[serde(default)]
    pub raw_signal: Option<PathBuf>,
    /// The path to the final consensus sequence.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_standard_gap_penalty")]
    pub standard_gap_penalty: u32,
    pub lower_gap_penalty: u32,
    /// Threads for the aligner and the sorter.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// The directory where the temporary artifacts are allocated.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default)]
    pub tools: ToolPaths,
    #[serde(default)]
    pub verbose: usize,
}

fn default_standard_gap_penalty() -> u32 {
    DEFAULT_STANDARD_GAP_PENALTY
}

fn default_threads() -> usize {
    DEFAULT_THREADS
}

impl PipelineConfig {
    pub fn new(lower_gap_penalty: u32) -> Self {
        Self {
            reference: None,
            reads: None,
            raw_signal: None,
            output: None,
            standard_gap_penalty: DEFAULT_STANDARD_GAP_PENALTY,
            lower_gap_penalty,
            threads: DEFAULT_THREADS,
            temp_dir: None,
            tools: ToolPaths::default(),
            verbose: 0,
        }
    }
    pub fn gap_penalties(&self) -> GapPenalties {
        GapPenalties::new(self.standard_gap_penalty, self.lower_gap_penalty)
    }
}

/// Executables of the external tools.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ToolPaths {
    pub minimap2: String,
    pub samtools: String,
    pub nanopolish: String,
}

impl std::default::Default for ToolPaths {
    fn default() -> Self {
        Self {
            minimap2: "minimap2".to_string(),
            samtools: "samtools".to_string(),
            nanopolish: "nanopolish".to_string(),
        }
    }
}

/// One of the three refinement passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Pass {
    First,
    Second,
    Third,
}

impl Pass {
    pub const ALL: [Pass; 3] = [Pass::First, Pass::Second, Pass::Third];
    /// 1-origin number of the pass.
    pub fn number(&self) -> usize {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
            Pass::Third => 3,
        }
    }
    pub fn next(&self) -> Option<Pass> {
        match self {
            Pass::First => Some(Pass::Second),
            Pass::Second => Some(Pass::Third),
            Pass::Third => None,
        }
    }
    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PASS{}", self.number())
    }
}

/// The gap-open penalties of the passes.
/// Relaxed in the second pass, tightened again in the third.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GapPenalties {
    pub standard: u32,
    pub lower: u32,
}

impl GapPenalties {
    pub fn new(standard: u32, lower: u32) -> Self {
        Self { standard, lower }
    }
    pub fn gap_open(&self, pass: Pass) -> u32 {
        match pass {
            Pass::First | Pass::Third => self.standard,
            Pass::Second => self.lower,
        }
    }
}

/// The states of the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Indexing,
    Map(Pass),
    Prepare(Pass),
    Call(Pass),
    Done,
    Failed,
}

impl PipelineState {
    /// The first state. Indexing is visited only when the raw signals are available.
    pub fn start(with_signal: bool) -> Self {
        if with_signal {
            PipelineState::Indexing
        } else {
            PipelineState::Map(Pass::First)
        }
    }
    /// The successor on the success path. Terminal states have none.
    pub fn next(&self) -> Option<Self> {
        use PipelineState::*;
        match *self {
            Indexing => Some(Map(Pass::First)),
            Map(pass) => Some(Prepare(pass)),
            Prepare(pass) => Some(Call(pass)),
            Call(pass) => match pass.next() {
                Some(next) => Some(Map(next)),
                None => Some(Done),
            },
            Done | Failed => None,
        }
    }
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
    /// Whether `to` is a legal transition from this state.
    /// Failed is reachable from every non-terminal state.
    pub fn can_move_to(&self, to: PipelineState) -> bool {
        match to {
            PipelineState::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Indexing => write!(f, "INDEXING"),
            PipelineState::Map(pass) => write!(f, "{pass}_MAP"),
            PipelineState::Prepare(pass) => write!(f, "{pass}_PREPARE"),
            PipelineState::Call(pass) => write!(f, "{pass}_CALL"),
            PipelineState::Done => write!(f, "DONE"),
            PipelineState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Kinds of the temporary artifacts exchanged between the steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    AlignmentStream,
    CompressedAlignment,
    AlignmentStore,
    AlignmentIndex,
    Variants,
    Consensus,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::AlignmentStream => "stream",
            ArtifactKind::CompressedAlignment => "compressed",
            ArtifactKind::AlignmentStore => "store",
            ArtifactKind::AlignmentIndex => "store_index",
            ArtifactKind::Variants => "variants",
            ArtifactKind::Consensus => "consensus",
        }
    }
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::AlignmentStream => ".sam",
            ArtifactKind::CompressedAlignment => ".bam",
            ArtifactKind::AlignmentStore => ".sorted.bam",
            ArtifactKind::AlignmentIndex => ".bai",
            ArtifactKind::Variants => ".vcf",
            ArtifactKind::Consensus => ".fasta",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}
