use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::{wire, DelegationError, LineItem, PricingEngine};
use crate::domain::value_objects::Money;

/// Runs an external calculator once per request.
#[derive(Clone, Debug)]
pub struct ProcessEngine {
    program: PathBuf,
    timeout: Duration,
}

impl ProcessEngine {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), timeout: Self::DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path { &self.program }
    pub fn timeout(&self) -> Duration { self.timeout }
}

impl PricingEngine for ProcessEngine {
    async fn compute(&self, items: &[LineItem]) -> Result<Money, DelegationError> {
        let args = wire::encode_args(items);
        debug!(program = %self.program.display(), args = args.len(), "spawning calculator");

        // The child is killed if the timeout drops the wait future.
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DelegationError::Spawn { program: self.program.clone(), source })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DelegationError::TimedOut(self.timeout))??;

        if !output.status.success() {
            return Err(DelegationError::ExitStatus {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        wire::parse_total(&String::from_utf8_lossy(&output.stdout))
    }
}
