use clap::Parser;
use definitions::PipelineConfig;
use polisher::{PolishError, Result};
use std::path::{Path, PathBuf};

/// The lower gap penalty of the second pass, when the user does not give one.
pub const DEFAULT_LOWER_GAP_PENALTY: u32 = 3;

#[derive(Parser, Debug, Clone)]
#[command(name = "polisher")]
#[command(author = "Bansho Masutani <ban-m@g.ecc.u-tokyo.ac.jp>")]
#[command(version, about = "Refine a consensus sequence from nanopore reads in three passes (minimap2, samtools, nanopolish).", long_about = None)]
pub struct Args {
    /// Reference sequence (FASTA) used in the first pass.
    #[arg(short, long, value_name = "FASTA", required_unless_present = "profile")]
    pub reference: Option<PathBuf>,
    /// Reads (FASTQ).
    #[arg(short = 'q', long, value_name = "FASTQ", required_unless_present = "profile")]
    pub reads: Option<PathBuf>,
    /// Archive of the raw signals. If given, the reads are indexed against it first.
    #[arg(short = 's', long, value_name = "DIR")]
    pub raw_signal: Option<PathBuf>,
    /// The final consensus sequence (FASTA). Replaced only when the whole pipeline succeeds.
    #[arg(short, long, value_name = "FASTA", required_unless_present = "profile")]
    pub output: Option<PathBuf>,
    // The options below have no clap defaults, so that they can override a profile.
    /// Gap-open penalty of the first and the third pass [default: 4]
    #[arg(long, value_name = "INT")]
    pub standard_gap_penalty: Option<u32>,
    /// Gap-open penalty of the second pass [default: 3]
    #[arg(long, value_name = "INT")]
    pub lower_gap_penalty: Option<u32>,
    /// Number of threads of minimap2 and samtools sort [default: 1]
    #[arg(short, long, value_name = "INT")]
    pub threads: Option<usize>,
    /// Directory for the temporary files.
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,
    /// [default: minimap2]
    #[arg(long, value_name = "PROGRAM")]
    pub minimap2: Option<String>,
    /// [default: samtools]
    #[arg(long, value_name = "PROGRAM")]
    pub samtools: Option<String>,
    /// [default: nanopolish]
    #[arg(long, value_name = "PROGRAM")]
    pub nanopolish: Option<String>,
    /// Write a summary of the run in JSON.
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,
    /// TOML configuration file. See example.toml for an example.
    /// Penalties, threads, the temporary directory and the programs given as flags take precedence.
    #[arg(
        short,
        long,
        value_name = "TOML",
        conflicts_with_all = ["reference", "reads", "raw_signal", "output"]
    )]
    pub profile: Option<PathBuf>,
    /// Debug mode. Repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match self.profile.as_ref() {
            Some(profile) => load_profile(profile)?,
            None => {
                let mut config = PipelineConfig::new(DEFAULT_LOWER_GAP_PENALTY);
                config.reference = self.reference.clone();
                config.reads = self.reads.clone();
                config.raw_signal = self.raw_signal.clone();
                config.output = self.output.clone();
                config
            }
        };
        if let Some(penalty) = self.standard_gap_penalty {
            config.standard_gap_penalty = penalty;
        }
        if let Some(penalty) = self.lower_gap_penalty {
            config.lower_gap_penalty = penalty;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(dir) = self.temp_dir.as_ref() {
            config.temp_dir = Some(dir.clone());
        }
        let tools = &mut config.tools;
        for (program, flag) in [
            (&mut tools.minimap2, &self.minimap2),
            (&mut tools.samtools, &self.samtools),
            (&mut tools.nanopolish, &self.nanopolish),
        ] {
            if let Some(flag) = flag {
                *program = flag.clone();
            }
        }
        config.verbose = config.verbose.max(self.verbose as usize);
        Ok(config)
    }
}

pub fn load_profile(path: &Path) -> Result<PipelineConfig> {
    let file = std::fs::read_to_string(path).map_err(|why| {
        PolishError::configuration(format!("could not read profile {:?}: {}", path, why))
    })?;
    toml::from_str(&file)
        .map_err(|why| PolishError::configuration(format!("invalid profile {:?}: {}", path, why)))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults() {
        let args =
            Args::try_parse_from(["polisher", "-r", "ref.fa", "-q", "reads.fq", "-o", "out.fa"])
                .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.reference, Some(PathBuf::from("ref.fa")));
        assert_eq!(config.reads, Some(PathBuf::from("reads.fq")));
        assert_eq!(config.output, Some(PathBuf::from("out.fa")));
        assert_eq!(config.raw_signal, None);
        assert_eq!(config.standard_gap_penalty, 4);
        assert_eq!(config.lower_gap_penalty, 3);
        assert_eq!(config.threads, 1);
        assert_eq!(config.tools, definitions::ToolPaths::default());
        assert_eq!(config.verbose, 0);
    }
    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "polisher",
            "--reference",
            "ref.fa",
            "--reads",
            "reads.fq",
            "--raw-signal",
            "fast5",
            "--output",
            "out.fa",
            "--standard-gap-penalty",
            "6",
            "--lower-gap-penalty",
            "1",
            "-t",
            "8",
            "--temp-dir",
            "/scratch",
            "--nanopolish",
            "/opt/bin/nanopolish",
            "-vv",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.raw_signal, Some(PathBuf::from("fast5")));
        assert_eq!(config.gap_penalties(), definitions::GapPenalties::new(6, 1));
        assert_eq!(config.threads, 8);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/scratch")));
        assert_eq!(config.tools.nanopolish, "/opt/bin/nanopolish");
        assert_eq!(config.tools.samtools, "samtools");
        assert_eq!(config.verbose, 2);
    }
    #[test]
    fn required_inputs() {
        assert!(Args::try_parse_from(["polisher", "-q", "reads.fq", "-o", "out.fa"]).is_err());
        assert!(Args::try_parse_from(["polisher", "-r", "ref.fa", "-o", "out.fa"]).is_err());
        assert!(Args::try_parse_from(["polisher", "-r", "ref.fa", "-q", "reads.fq"]).is_err());
        assert!(Args::try_parse_from(["polisher", "-p", "profile.toml"]).is_ok());
        assert!(
            Args::try_parse_from(["polisher", "-p", "profile.toml", "-r", "ref.fa"]).is_err()
        );
    }
    #[test]
    fn flags_override_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile.toml");
        let toml = "reference = \"ref.fa\"\nreads = \"reads.fq\"\noutput = \"out.fa\"\n\
                    lower_gap_penalty = 3\nthreads = 4\nverbose = 1\n\n\
                    [tools]\nsamtools = \"/opt/samtools\"\n";
        std::fs::write(&profile, toml).unwrap();
        let profile = profile.to_str().unwrap();
        // Without flags the profile wins.
        let args = Args::try_parse_from(["polisher", "-p", profile]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.gap_penalties(), definitions::GapPenalties::new(4, 3));
        assert_eq!(config.threads, 4);
        assert_eq!(config.tools.samtools, "/opt/samtools");
        assert_eq!(config.verbose, 1);
        let args = Args::try_parse_from([
            "polisher",
            "-p",
            profile,
            "--lower-gap-penalty",
            "1",
            "--standard-gap-penalty",
            "9",
            "-t",
            "16",
            "--temp-dir",
            "/scratch",
            "--samtools",
            "samtools-1.19",
            "-vv",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.gap_penalties(), definitions::GapPenalties::new(9, 1));
        assert_eq!(config.threads, 16);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/scratch")));
        assert_eq!(config.tools.samtools, "samtools-1.19");
        assert_eq!(config.tools.minimap2, "minimap2");
        assert_eq!(config.reference, Some(PathBuf::from("ref.fa")));
        assert_eq!(config.verbose, 2);
    }
    #[test]
    fn example_profile() {
        let config: PipelineConfig = toml::from_str(include_str!("../../example.toml")).unwrap();
        assert_eq!(config.standard_gap_penalty, 4);
        assert_eq!(config.lower_gap_penalty, 3);
        assert!(config.reference.is_some());
    }
    #[test]
    fn profile_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            load_profile(&missing),
            Err(PolishError::Configuration(_))
        ));
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "reference = \"ref.fa\"\n").unwrap();
        match load_profile(&broken) {
            Err(PolishError::Configuration(msg)) => assert!(msg.contains("lower_gap_penalty")),
            res => panic!("{:?}", res),
        }
        let args = Args::try_parse_from(["polisher", "-p", broken.to_str().unwrap()]).unwrap();
        assert!(args.to_config().is_err());
    }
}
