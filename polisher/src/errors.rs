use definitions::PipelineState;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolishError>;

#[derive(Debug, Error)]
pub enum PolishError {
    /// A required input is missing, unreadable, or invalid. Raised before any tool runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{state}: `{command}` failed ({status}): {stderr}")]
    ExternalTool {
        state: PipelineState,
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{state}: could not launch `{program}`: {source}")]
    ToolLaunch {
        state: PipelineState,
        program: String,
        source: std::io::Error,
    },

    /// A temporary artifact could not be allocated, removed, or persisted.
    #[error("resource error on {what}: {source}")]
    Resource {
        what: String,
        source: std::io::Error,
    },
}

impl PolishError {
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        PolishError::Configuration(message.into())
    }
    pub fn resource<S: Into<String>>(what: S, source: std::io::Error) -> Self {
        PolishError::Resource {
            what: what.into(),
            source,
        }
    }
    /// The state where the error happened, if it came from a tool.
    pub fn state(&self) -> Option<PipelineState> {
        match self {
            PolishError::ExternalTool { state, .. } | PolishError::ToolLaunch { state, .. } => {
                Some(*state)
            }
            _ => None,
        }
    }
    /// Exit code of the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            PolishError::Configuration(_) => 2,
            PolishError::ExternalTool { .. } | PolishError::ToolLaunch { .. } => 3,
            PolishError::Resource { .. } => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use definitions::Pass;
    #[test]
    fn display_names_the_step() {
        let err = PolishError::ExternalTool {
            state: PipelineState::Prepare(Pass::Second),
            command: "samtools sort in.bam".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "truncated file".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("PASS2_PREPARE"), "{}", message);
        assert!(message.contains("samtools sort in.bam"));
        assert!(message.contains("truncated file"));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.state(), Some(PipelineState::Prepare(Pass::Second)));
    }
    #[test]
    fn exit_codes() {
        assert_eq!(PolishError::configuration("Need a --reference.").exit_code(), 2);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(PolishError::resource("consensus", io).exit_code(), 4);
    }
}
