use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::pricing::{OrderTotalCalculator, PricingPolicy, ProcessEngine};

/// Name of the delegated calculator binary looked up next to the service.
pub const CALCULATOR_BIN: &str = "price-calculator";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid { name: &'static str, expected: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub calculator_path: Option<PathBuf>,
    pub calculator_timeout: Duration,
    pub nats_url: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, SettingsError> {
        if let Err(err) = dotenvy::dotenv() {
            warn!("No .env loaded: {err}");
        }
        let mut settings = Self::from_lookup(|key| std::env::var(key).ok())?;
        if settings.calculator_path.is_none() {
            settings.calculator_path = sibling_calculator();
        }
        Ok(settings)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let default = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| SettingsError::Invalid { name: "PORT", expected: "a TCP port", value: v })?,
            None => default.port,
        };
        let calculator_timeout = match var("PRICE_CALCULATOR_TIMEOUT_MS") {
            Some(v) => match v.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(SettingsError::Invalid { name: "PRICE_CALCULATOR_TIMEOUT_MS", expected: "a positive number of milliseconds", value: v }),
            },
            None => default.calculator_timeout,
        };

        Ok(Self {
            port,
            calculator_path: var("PRICE_CALCULATOR_PATH").map(PathBuf::from),
            calculator_timeout,
            nats_url: var("NATS_URL"),
        })
    }

    /// Calculator with the standard policy, delegating when a calculator path is known.
    pub fn calculator(&self) -> OrderTotalCalculator<ProcessEngine> {
        match &self.calculator_path {
            Some(path) => {
                info!(calculator = %path.display(), timeout_ms = self.calculator_timeout.as_millis() as u64, "delegated pricing enabled");
                OrderTotalCalculator::with_delegate(PricingPolicy::STANDARD, ProcessEngine::new(path).with_timeout(self.calculator_timeout))
            }
            None => {
                warn!("no price calculator found, pricing locally");
                OrderTotalCalculator::new(PricingPolicy::STANDARD)
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { port: 8083, calculator_path: None, calculator_timeout: ProcessEngine::DEFAULT_TIMEOUT, nats_url: None }
    }
}

fn sibling_calculator() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.with_file_name(format!("{CALCULATOR_BIN}{}", std::env::consts::EXE_SUFFIX));
    candidate.is_file().then_some(candidate)
}
