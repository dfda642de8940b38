//! Validation of the configuration. Nothing is launched before these checks pass.
use crate::errors::{PolishError, Result};
use definitions::{GapPenalties, PipelineConfig};
use log::*;
use std::path::{Path, PathBuf};

/// The validated inputs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub reference: PathBuf,
    pub reads: PathBuf,
    pub raw_signal: Option<PathBuf>,
    pub output: PathBuf,
    pub penalties: GapPenalties,
    pub threads: usize,
    pub temp_dir: Option<PathBuf>,
}

impl Inputs {
    pub fn validate(config: &PipelineConfig) -> Result<Self> {
        let reference = required(config.reference.as_ref(), "--reference")?;
        let reads = required(config.reads.as_ref(), "a fastq file --reads")?;
        let output = required(config.output.as_ref(), "an --output file")?;
        check_readable_file(&reference, "reference")?;
        check_readable_file(&reads, "reads")?;
        if let Some(signal) = config.raw_signal.as_ref() {
            check_readable(signal, "raw signal archive")?;
        }
        check_output(&output, &[&reference, &reads])?;
        if config.standard_gap_penalty == 0 || config.lower_gap_penalty == 0 {
            return Err(PolishError::configuration(format!(
                "gap penalties should be positive (standard {}, lower {})",
                config.standard_gap_penalty, config.lower_gap_penalty
            )));
        }
        if config.standard_gap_penalty <= config.lower_gap_penalty {
            warn!(
                "The lower gap penalty ({}) is not below the standard one ({}).",
                config.lower_gap_penalty, config.standard_gap_penalty
            );
        }
        if config.threads == 0 {
            return Err(PolishError::configuration("threads should be positive"));
        }
        if let Some(dir) = config.temp_dir.as_ref() {
            if !dir.is_dir() {
                return Err(PolishError::configuration(format!(
                    "temporary directory {:?} is not a directory",
                    dir
                )));
            }
        }
        Ok(Self {
            reference,
            reads,
            raw_signal: config.raw_signal.clone(),
            output,
            penalties: config.gap_penalties(),
            threads: config.threads,
            temp_dir: config.temp_dir.clone(),
        })
    }
    /// The directory which will contain the output.
    pub fn output_dir(&self) -> PathBuf {
        parent_dir(&self.output)
    }
}

fn required(path: Option<&PathBuf>, what: &str) -> Result<PathBuf> {
    path.cloned()
        .ok_or_else(|| PolishError::configuration(format!("Need {}.", what)))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn check_readable_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        return Err(PolishError::configuration(format!(
            "{} {:?} does not exist or is not a file",
            what, path
        )));
    }
    check_readable(path, what)
}

fn check_readable(path: &Path, what: &str) -> Result<()> {
    let readable = if path.is_dir() {
        std::fs::read_dir(path).map(|_| ())
    } else {
        std::fs::File::open(path).map(|_| ())
    };
    readable.map_err(|why| {
        PolishError::configuration(format!("{} {:?} is not readable: {}", what, path, why))
    })
}

fn check_output(output: &Path, inputs: &[&Path]) -> Result<()> {
    if output.is_dir() {
        return Err(PolishError::configuration(format!(
            "output {:?} is a directory",
            output
        )));
    }
    let dir = parent_dir(output);
    if !dir.is_dir() {
        return Err(PolishError::configuration(format!(
            "the directory of the output {:?} does not exist",
            output
        )));
    }
    if output.exists() {
        let output = canonical(output);
        if inputs.iter().any(|input| canonical(input) == output) {
            return Err(PolishError::configuration(format!(
                "output {:?} would overwrite an input",
                output
            )));
        }
    }
    Ok(())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
