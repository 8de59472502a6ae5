// crates/newman-gate-config/src/config.rs
// ============================================================================
// Module: Newman Gate Configuration
// Description: Configuration loading and validation for Newman Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: newman-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! When neither an explicit path nor [`CONFIG_ENV_VAR`] is given, built-in
//! defaults are used. Invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use newman_gate_core::HandlerSettings;
use newman_gate_core::NewmanEngineConfig;
use newman_gate_core::RequiredFiles;
use newman_gate_core::extract::DEFAULT_MAX_EXTRACTED_BYTES;
use newman_gate_core::handler::DEFAULT_DOWNLOAD_PATH;
use newman_gate_core::handler::DEFAULT_EXTRACT_DIR;
use newman_gate_core::job::DEFAULT_BUILD_ARTIFACT_NAME;
use newman_gate_core::validate::DEFAULT_COLLECTION_FILE;
use newman_gate_core::validate::DEFAULT_ENVIRONMENT_FILE;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable used to point at a config file.
pub const CONFIG_ENV_VAR: &str = "NEWMAN_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default lifetime of presigned URLs in seconds.
pub(crate) const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 900;
/// Longest lifetime S3 accepts for a SigV4 presigned URL.
pub(crate) const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;
/// Maximum number of engine arguments or reporters.
pub(crate) const MAX_ENGINE_LIST_ENTRIES: usize = 32;
/// Maximum length of a log filter directive.
pub(crate) const MAX_LOG_LEVEL_LENGTH: usize = 512;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Newman Gate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewmanGateConfig {
    /// Build artifact layout.
    #[serde(default)]
    pub artifact: ArtifactConfig,
    /// Object storage access.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Newman process settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NewmanGateConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order: `path`, then [`CONFIG_ENV_VAR`], then built-in
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, not
    /// TOML, or describe an invalid configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.artifact.validate()?;
        self.storage.validate()?;
        self.engine.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// Build artifact layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtifactConfig {
    /// Logical name of the input artifact to test.
    #[serde(default = "default_artifact_name")]
    pub name: String,
    /// Download location of the archive.
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    /// Extraction directory.
    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,
    /// Archive entry path of the test collection.
    #[serde(default = "default_collection_file")]
    pub collection_file: String,
    /// Archive entry path of the environment definition.
    #[serde(default = "default_environment_file")]
    pub environment_file: String,
    /// Cap on total extracted bytes.
    #[serde(default = "default_max_extracted_bytes")]
    pub max_extracted_bytes: u64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            name: default_artifact_name(),
            download_path: default_download_path(),
            extract_dir: default_extract_dir(),
            collection_file: default_collection_file(),
            environment_file: default_environment_file(),
            max_extracted_bytes: default_max_extracted_bytes(),
        }
    }
}

impl ArtifactConfig {
    /// Validates artifact settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("artifact.name must be non-empty".to_string()));
        }
        validate_path_string("artifact.download_path", &self.download_path.to_string_lossy())?;
        validate_path_string("artifact.extract_dir", &self.extract_dir.to_string_lossy())?;
        if self.download_path.starts_with(&self.extract_dir) {
            return Err(ConfigError::Invalid(
                "artifact.download_path must not be inside artifact.extract_dir".to_string(),
            ));
        }
        validate_entry_name("artifact.collection_file", &self.collection_file)?;
        validate_entry_name("artifact.environment_file", &self.environment_file)?;
        if self.collection_file == self.environment_file {
            return Err(ConfigError::Invalid(
                "artifact.collection_file and artifact.environment_file must differ".to_string(),
            ));
        }
        if self.max_extracted_bytes == 0 {
            return Err(ConfigError::Invalid(
                "artifact.max_extracted_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the handler settings described by this section.
    #[must_use]
    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            artifact_name: self.name.clone(),
            download_path: self.download_path.clone(),
            extract_dir: self.extract_dir.clone(),
            required_files: RequiredFiles {
                collection: self.collection_file.clone(),
                environment: self.environment_file.clone(),
            },
            max_extracted_bytes: self.max_extracted_bytes,
        }
    }
}

// ============================================================================
// SECTION: Storage
// ============================================================================

/// Object storage access settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Optional region (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional S3-compatible endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Force path-style addressing.
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// Lifetime of presigned URLs in seconds.
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            force_path_style: false,
            allow_http: false,
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }
}

impl StorageConfig {
    /// Validates storage settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when storage settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ConfigError::Invalid("storage.region must be non-empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "storage.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "storage.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        if !(1 ..= MAX_PRESIGN_EXPIRY_SECS).contains(&self.presign_expiry_secs) {
            return Err(ConfigError::Invalid(format!(
                "storage.presign_expiry_secs must be between 1 and {MAX_PRESIGN_EXPIRY_SECS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Newman process settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Program to execute.
    #[serde(default = "default_engine_program")]
    pub program: PathBuf,
    /// Arguments placed before `run`.
    #[serde(default)]
    pub leading_args: Vec<String>,
    /// Reporters enabled in addition to `json`.
    #[serde(default = "default_engine_reporters")]
    pub reporters: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            leading_args: Vec::new(),
            reporters: default_engine_reporters(),
        }
    }
}

impl EngineConfig {
    /// Validates engine settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("engine.program", &self.program.to_string_lossy())?;
        if self.leading_args.len() > MAX_ENGINE_LIST_ENTRIES {
            return Err(ConfigError::Invalid(
                "engine.leading_args has too many entries".to_string(),
            ));
        }
        if self.reporters.len() > MAX_ENGINE_LIST_ENTRIES {
            return Err(ConfigError::Invalid("engine.reporters has too many entries".to_string()));
        }
        for reporter in &self.reporters {
            let trimmed = reporter.trim();
            if trimmed.is_empty() || trimmed.contains([',', ' ', '\t']) {
                return Err(ConfigError::Invalid(format!(
                    "engine.reporters entry is not a reporter name: '{reporter}'"
                )));
            }
        }
        Ok(())
    }

    /// Returns the newman engine settings described by this section.
    #[must_use]
    pub fn newman_config(&self) -> NewmanEngineConfig {
        NewmanEngineConfig {
            program: self.program.clone(),
            leading_args: self.leading_args.clone(),
            reporters: self.reporters.clone(),
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Line encoding.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let trimmed = self.level.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        if trimmed.len() > MAX_LOG_LEVEL_LENGTH {
            return Err(ConfigError::Invalid("logging.level exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument or environment.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    Ok(None)
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an archive entry name.
fn validate_entry_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    if value.starts_with('/') || value.contains('\\') {
        return Err(ConfigError::Invalid(format!("{field} must be a relative archive path")));
    }
    if value.split('/').any(|segment| segment == "..") {
        return Err(ConfigError::Invalid(format!("{field} must not contain '..'")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default artifact name.
fn default_artifact_name() -> String {
    DEFAULT_BUILD_ARTIFACT_NAME.to_string()
}

/// Default download path.
fn default_download_path() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_PATH)
}

/// Default extraction directory.
fn default_extract_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXTRACT_DIR)
}

/// Default collection entry path.
fn default_collection_file() -> String {
    DEFAULT_COLLECTION_FILE.to_string()
}

/// Default environment entry path.
fn default_environment_file() -> String {
    DEFAULT_ENVIRONMENT_FILE.to_string()
}

/// Default extraction cap.
const fn default_max_extracted_bytes() -> u64 {
    DEFAULT_MAX_EXTRACTED_BYTES
}

/// Default presigned URL lifetime.
const fn default_presign_expiry_secs() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

/// Default engine program.
fn default_engine_program() -> PathBuf {
    PathBuf::from("newman")
}

/// Default engine reporters.
fn default_engine_reporters() -> Vec<String> {
    vec!["cli".to_string()]
}

/// Default log filter.
fn default_log_level() -> String {
    "info".to_string()
}
