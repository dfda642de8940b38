//! A stand-in for the external tools.
//!
//! [MockRunner] records every invocation and writes small, deterministic artifacts where the real tools would write theirs.
use crate::errors::{PolishError, Result};
use crate::tool::{Invocation, ToolRunner};
use definitions::{Pass, PipelineState};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const MOCK_CONSENSUS_LEN: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    pub invocations: Vec<Invocation>,
    fail_at: Option<(PipelineState, Option<String>)>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }
    /// Fail the first invocation issued in `state`.
    pub fn failing_at(state: PipelineState) -> Self {
        Self {
            invocations: vec![],
            fail_at: Some((state, None)),
        }
    }
    /// Fail the invocation of `subcommand` issued in `state`.
    pub fn failing_at_step(state: PipelineState, subcommand: &str) -> Self {
        Self {
            invocations: vec![],
            fail_at: Some((state, Some(subcommand.to_string()))),
        }
    }
    /// The consensus `vcf2fasta` emits in `pass`.
    pub fn mock_consensus(pass: Pass) -> String {
        let seq: Vec<u8> = b"ACGT"
            .iter()
            .cycle()
            .skip(pass.number())
            .take(MOCK_CONSENSUS_LEN)
            .copied()
            .collect();
        let mut fasta = format!(">mock_consensus_pass{}\n", pass.number());
        for line in seq.chunks(60) {
            fasta.push_str(&String::from_utf8_lossy(line));
            fasta.push('\n');
        }
        fasta
    }
    /// Gap-open penalties passed to the aligner, in the invocation order.
    pub fn gap_open_penalties(&self) -> Vec<u32> {
        self.invocations
            .iter()
            .filter(|inv| matches!(inv.state, PipelineState::Map(_)))
            .filter_map(|inv| inv.value_of("-O"))
            .filter_map(|value| value.to_str().and_then(|v| v.parse().ok()))
            .collect()
    }
    /// The number of invocations whose first argument is `subcommand`.
    pub fn count(&self, subcommand: &str) -> usize {
        self.invocations
            .iter()
            .filter(|inv| inv.subcommand() == Some(OsStr::new(subcommand)))
            .count()
    }
    pub fn find(&self, state: PipelineState, subcommand: &str) -> Option<&Invocation> {
        self.invocations
            .iter()
            .find(|inv| inv.state == state && inv.subcommand() == Some(OsStr::new(subcommand)))
    }
    /// Every path mentioned by the invocations.
    pub fn touched_paths(&self) -> Vec<PathBuf> {
        self.invocations
            .iter()
            .flat_map(|inv| {
                let args = inv.args.iter().map(PathBuf::from);
                args.chain(inv.stdout.clone())
                    .filter(|p| p.is_absolute())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
    fn should_fail(&self, invocation: &Invocation) -> bool {
        match self.fail_at.as_ref() {
            Some((state, sub)) if *state == invocation.state => match sub {
                Some(sub) => invocation.subcommand() == Some(OsStr::new(sub)),
                None => {
                    let issued = self.invocations.iter().filter(|i| i.state == *state);
                    issued.count() == 1
                }
            },
            _ => false,
        }
    }
    fn stdout_of(invocation: &Invocation) -> Vec<u8> {
        let subcommand = invocation.subcommand().and_then(|s| s.to_str());
        match (invocation.state, subcommand) {
            (PipelineState::Map(pass), _) => format!(
                "@HD\tVN:1.6\tSO:unsorted\n@SQ\tSN:mock\tLN:{}\n@PG\tID:mock\tPN:minimap2\tCL:pass{}\n",
                MOCK_CONSENSUS_LEN,
                pass.number()
            )
            .into_bytes(),
            (PipelineState::Prepare(_), Some("view")) => b"BAM\x01compressed".to_vec(),
            (PipelineState::Prepare(_), Some("sort")) => b"BAM\x01sorted".to_vec(),
            (PipelineState::Call(_), Some("variants")) => {
                b"##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n".to_vec()
            }
            (PipelineState::Call(pass), Some("vcf2fasta")) => {
                Self::mock_consensus(pass).into_bytes()
            }
            _ => vec![],
        }
    }
}

fn write(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| PolishError::resource(format!("{}", path.display()), e))
}

impl ToolRunner for MockRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.invocations.push(invocation.clone());
        if self.should_fail(invocation) {
            if let Some(path) = invocation.stdout.as_ref() {
                write(path, b"partial")?;
            }
            return Err(PolishError::ExternalTool {
                state: invocation.state,
                command: invocation.command_line(),
                status: "exit status: 1".to_string(),
                stderr: "mock failure".to_string(),
            });
        }
        if let Some(path) = invocation.stdout.as_ref() {
            write(path, &Self::stdout_of(invocation))?;
        }
        // Side-cars written next to the input.
        let subcommand = invocation.subcommand().and_then(|s| s.to_str());
        let target = invocation.args.last().map(PathBuf::from);
        match (invocation.state, subcommand, target) {
            (PipelineState::Prepare(_), Some("index"), Some(store)) => {
                let mut bai = store.into_os_string();
                bai.push(".bai");
                write(Path::new(&bai), b"BAI\x01")?;
            }
            (PipelineState::Indexing, Some("index"), Some(reads)) => {
                let mut index = reads.into_os_string();
                index.push(".index");
                write(Path::new(&index), b"mock readdb\n")?;
            }
            _ => {}
        }
        Ok(())
    }
}
