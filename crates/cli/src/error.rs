//! Process-level failures and their exit codes.

use std::process::ExitCode;

/// Why the router stopped. Each kind maps to a distinct exit code.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// Config file unreadable or invalid. Exit code 1.
    #[error("configuration error: {0:#}")]
    Config(anyhow::Error),

    /// The registry backend could not be built or queried. Exit code 2.
    #[error("discovery initialization failed: {0:#}")]
    Discovery(anyhow::Error),

    /// The membership subscription did not start. Exit code 3.
    #[error("membership subscription failed to start: {0:#}")]
    Subscription(anyhow::Error),

    /// A listener failed to bind or stopped with an error. Exit code 4.
    #[error("server error: {0:#}")]
    Server(anyhow::Error),
}

impl Failure {
    /// Process exit code for this failure.
    pub fn code(&self) -> u8 {
        match self {
            Failure::Config(_) => 1,
            Failure::Discovery(_) => 2,
            Failure::Subscription(_) => 3,
            Failure::Server(_) => 4,
        }
    }
}

impl From<&Failure> for ExitCode {
    fn from(failure: &Failure) -> Self {
        ExitCode::from(failure.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            Failure::Config(anyhow!("x")).code(),
            Failure::Discovery(anyhow!("x")).code(),
            Failure::Subscription(anyhow!("x")).code(),
            Failure::Server(anyhow!("x")).code(),
        ];
        assert_eq!(codes, [1, 2, 3, 4]);
    }

    #[test]
    fn test_message_includes_cause_chain() {
        let err = anyhow!("no such file").context("failed to read router.toml");
        let failure = Failure::Config(err);
        assert_eq!(
            failure.to_string(),
            "configuration error: failed to read router.toml: no such file"
        );
    }
}
