//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::InstanceSpec;
use crate::fleet::AcquireOptions;

/// Scaleway specific configuration derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SCW")]
pub struct ScalewayConfig {
    /// Access key assigned to the Scaleway application. Identifies the
    /// credentials in logs and debug output; API calls only need the secret
    /// key.
    pub access_key: Option<String>,
    /// Secret key used for authentication. This value is required.
    pub secret_key: String,
    /// Organisation identifier used to scope image lookups.
    pub default_organization_id: Option<String>,
    /// Project identifier used for billing and resource scoping.
    pub default_project_id: String,
    /// Preferred availability zone. Defaults to `fr-par-1`.
    #[ortho_config(default = "fr-par-1".to_owned())]
    pub default_zone: String,
    /// Commercial type for new instances. Defaults to `DEV1-S`.
    #[ortho_config(default = "DEV1-S".to_owned())]
    pub default_instance_type: String,
    /// Human-friendly image label (for example `Ubuntu 24.04 Noble Numbat`).
    #[ortho_config(default = "Ubuntu 24.04 Noble Numbat".to_owned())]
    pub default_image: String,
    /// CPU architecture used to select the correct image variant.
    #[ortho_config(default = "x86_64".to_owned())]
    pub default_architecture: String,
}

/// Provider-independent fleet defaults.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "FLOTILLA",
    discovery(
        app_name = "flotilla",
        env_var = "FLOTILLA_CONFIG_PATH",
        config_file_name = "flotilla.toml",
        dotfile_name = ".flotilla.toml",
        project_file_name = "flotilla.toml"
    )
)]
pub struct FleetConfig {
    /// Provider key (`scaleway` or `memory`).
    #[ortho_config(default = "scaleway".to_owned())]
    pub provider: String,
    /// Base name given to new servers.
    #[ortho_config(default = "vps".to_owned())]
    pub name: String,
    /// Convergence budget for one acquire call, in seconds.
    #[ortho_config(default = 900)]
    pub timeout_secs: u64,
    /// Delay between convergence polls, in seconds.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Whether new servers request a public IPv4 address.
    #[ortho_config(default = true)]
    pub public_ip: bool,
    /// Whether new servers enable IPv6.
    #[ortho_config(default = false)]
    pub ipv6: bool,
}

/// Everything needed to construct a provider.
///
/// `scaleway` stays `None` until a Scaleway provider is requested; the
/// provider factory then loads it from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Fleet defaults.
    pub fleet: FleetConfig,
    /// Preloaded Scaleway credentials and defaults.
    pub scaleway: Option<ScalewayConfig>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to flotilla.toml",
            metadata.description, metadata.env_var, metadata.toml_key
        )));
    }
    Ok(())
}

fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!(
            "{} must be greater than zero: set {} or {} in flotilla.toml",
            metadata.description, metadata.env_var, metadata.toml_key
        )));
    }
    Ok(())
}

impl ScalewayConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("flotilla")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the default [`InstanceSpec`] for Scaleway servers, taking the
    /// name and network flags from `fleet`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn instance_spec(&self, fleet: &FleetConfig) -> Result<InstanceSpec, ConfigError> {
        self.validate()?;
        InstanceSpec::builder()
            .name(&fleet.name)
            .image(&self.default_image)
            .region(&self.default_zone)
            .size(&self.default_instance_type)
            .public_ip(fleet.public_ip)
            .ipv6(fleet.ipv6)
            .build()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.secret_key,
            &FieldMetadata::new("Scaleway API secret key", "SCW_SECRET_KEY", "secret_key"),
        )?;
        require_field(
            &self.default_project_id,
            &FieldMetadata::new(
                "Scaleway project ID",
                "SCW_DEFAULT_PROJECT_ID",
                "default_project_id",
            ),
        )?;
        require_field(
            &self.default_image,
            &FieldMetadata::new("VM image", "SCW_DEFAULT_IMAGE", "default_image"),
        )?;
        require_field(
            &self.default_instance_type,
            &FieldMetadata::new(
                "instance type",
                "SCW_DEFAULT_INSTANCE_TYPE",
                "default_instance_type",
            ),
        )?;
        require_field(
            &self.default_zone,
            &FieldMetadata::new("availability zone", "SCW_DEFAULT_ZONE", "default_zone"),
        )?;
        require_field(
            &self.default_architecture,
            &FieldMetadata::new(
                "CPU architecture",
                "SCW_DEFAULT_ARCHITECTURE",
                "default_architecture",
            ),
        )
    }
}

impl FleetConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("flotilla")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks the provider key, base name, and durations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for empty strings and
    /// [`ConfigError::Invalid`] for zero durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.provider,
            &FieldMetadata::new("provider", "FLOTILLA_PROVIDER", "provider"),
        )?;
        require_field(
            &self.name,
            &FieldMetadata::new("server name", "FLOTILLA_NAME", "name"),
        )?;
        require_positive(
            self.timeout_secs,
            &FieldMetadata::new("timeout", "FLOTILLA_TIMEOUT_SECS", "timeout_secs"),
        )?;
        require_positive(
            self.poll_interval_secs,
            &FieldMetadata::new(
                "poll interval",
                "FLOTILLA_POLL_INTERVAL_SECS",
                "poll_interval_secs",
            ),
        )
    }

    /// Acquire options carrying the configured name and durations.
    #[must_use]
    pub fn acquire_options(&self) -> AcquireOptions {
        AcquireOptions::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_name(self.name.trim())
    }
}

impl Settings {
    /// Wraps fleet defaults; Scaleway settings load on demand.
    #[must_use]
    pub const fn new(fleet: FleetConfig) -> Self {
        Self {
            fleet,
            scaleway: None,
        }
    }

    /// Supplies Scaleway settings up front instead of loading them later.
    #[must_use]
    pub fn with_scaleway(mut self, config: ScalewayConfig) -> Self {
        self.scaleway = Some(config);
        self
    }

    /// Loads and validates the fleet defaults from files and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        let fleet = FleetConfig::load_without_cli_args()?;
        fleet.validate()?;
        Ok(Self::new(fleet))
    }

    /// Returns the preloaded Scaleway settings or loads them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn scaleway(&self) -> Result<ScalewayConfig, ConfigError> {
        let config = match &self.scaleway {
            Some(config) => config.clone(),
            None => ScalewayConfig::load_without_cli_args()?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unusable value.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
