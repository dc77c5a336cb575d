use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_RULES_PATH: &str = "config/rules.json";
const DEFAULT_MIN_TRAINING_SAMPLES: usize = 50;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the triage engine and its command-line host.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub rules: RuleSource,
    pub training: TrainingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat)?,
            Err(_) => LogFormat::Compact,
        };

        let inline_json = env::var("TRIAGE_RULES")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let path = env::var("TRIAGE_RULES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULES_PATH));

        let min_samples = match env::var("TRIAGE_MIN_TRAINING_SAMPLES") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidMinSamples)?,
            Err(_) => DEFAULT_MIN_TRAINING_SAMPLES,
        };

        let auto_train = match env::var("TRIAGE_AUTO_TRAIN") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidAutoTrain)?,
            Err(_) => true,
        };

        let seed = match env::var("TRIAGE_TRAINING_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed)?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level, format },
            rules: RuleSource {
                inline_json,
                path: Some(path),
            },
            training: TrainingConfig {
                min_samples,
                auto_train,
                seed,
            },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, no targets.
    #[default]
    Compact,
    /// Targets and thread ids included.
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Where rule definitions come from. The inline JSON wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSource {
    pub inline_json: Option<String>,
    pub path: Option<PathBuf>,
}

impl RuleSource {
    /// A source that always yields an empty rule set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn inline(json: impl Into<String>) -> Self {
        Self {
            inline_json: Some(json.into()),
            path: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            inline_json: None,
            path: Some(path.into()),
        }
    }
}

/// Knobs for the lazily trained classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingConfig {
    pub min_samples: usize,
    pub auto_train: bool,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_TRAINING_SAMPLES,
            auto_train: true,
            seed: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogFormat,
    InvalidMinSamples,
    InvalidAutoTrain,
    InvalidSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidLogFormat => write!(f, "APP_LOG_FORMAT must be compact or full"),
            ConfigError::InvalidMinSamples => {
                write!(f, "TRIAGE_MIN_TRAINING_SAMPLES must be a positive integer")
            }
            ConfigError::InvalidAutoTrain => {
                write!(f, "TRIAGE_AUTO_TRAIN must be true/false, yes/no, on/off or 1/0")
            }
            ConfigError::InvalidSeed => write!(f, "TRIAGE_TRAINING_SEED must be a valid u64"),
        }
    }
}

impl std::error::Error for ConfigError {}
