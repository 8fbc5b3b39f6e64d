//! Mode resolution: which job manager implementation should run.
//!
//! Resolution is a pure function of a handful of environment values.
//! First match wins: disabled, then hosted, then platform, then local.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Opt-out switch; any truthy token disables background execution.
pub const ENV_DISABLED: &str = "LISTING_JOBS_DISABLED";
/// Explicit opt-in for the hosted scheduler.
pub const ENV_HOSTED_ENABLED: &str = "HOSTED_SCHEDULER_ENABLED";
/// Hosted scheduler credential.
pub const ENV_HOSTED_API_KEY: &str = "HOSTED_SCHEDULER_API_KEY";
/// Hosted scheduler endpoint.
pub const ENV_HOSTED_API_URL: &str = "HOSTED_SCHEDULER_API_URL";
/// Runtime environment name; the hosted scheduler requires `production`.
pub const ENV_APP_ENV: &str = "APP_ENV";
/// Set by the managed platform when it provides native cron.
pub const ENV_PLATFORM_MARKER: &str = "PLATFORM_CRON";

/// Selected job manager strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// No background execution at all
    Disabled,
    /// External durable scheduling service
    Hosted,
    /// Platform-native cron
    Platform,
    /// In-process timers
    Local,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Disabled => "disabled",
            Mode::Hosted => "hosted",
            Mode::Platform => "platform",
            Mode::Local => "local",
        };
        f.write_str(s)
    }
}

/// Accepts `1`, `true`, `yes`, `on` in any case, ignoring surrounding whitespace.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Connection details for the hosted scheduler.
#[derive(Debug, Clone)]
pub struct HostedSchedulerSettings {
    pub api_url: String,
    pub api_key: SecretString,
}

/// Raw environment values the resolver looks at.
///
/// Tests build this directly; the process uses [`ModeInputs::from_env`].
#[derive(Debug, Clone, Default)]
pub struct ModeInputs {
    pub disabled: Option<String>,
    pub hosted_enabled: Option<String>,
    pub hosted_api_key: Option<SecretString>,
    pub hosted_api_url: Option<String>,
    pub app_env: Option<String>,
    pub platform_marker: Option<String>,
}

impl ModeInputs {
    /// Read the inputs from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the inputs through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            disabled: lookup(ENV_DISABLED),
            hosted_enabled: lookup(ENV_HOSTED_ENABLED),
            hosted_api_key: lookup(ENV_HOSTED_API_KEY).map(SecretString::from),
            hosted_api_url: lookup(ENV_HOSTED_API_URL),
            app_env: lookup(ENV_APP_ENV),
            platform_marker: lookup(ENV_PLATFORM_MARKER),
        }
    }

    fn is_disabled(&self) -> bool {
        self.disabled.as_deref().is_some_and(is_truthy)
    }

    fn is_production(&self) -> bool {
        self.app_env
            .as_deref()
            .is_some_and(|env| env.trim().eq_ignore_ascii_case("production"))
    }

    fn is_on_platform(&self) -> bool {
        self.platform_marker
            .as_deref()
            .is_some_and(|marker| !marker.trim().is_empty())
    }

    fn api_key(&self) -> Option<&SecretString> {
        self.hosted_api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }

    fn api_url(&self) -> Option<&str> {
        self.hosted_api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Hosted scheduler details, if every piece is present and enabled
    /// in a production runtime.
    pub fn hosted_settings(&self) -> Option<HostedSchedulerSettings> {
        let enabled = self.hosted_enabled.as_deref().is_some_and(is_truthy);
        if !enabled || !self.is_production() {
            return None;
        }
        let api_key = self.api_key()?;
        let api_url = self.api_url()?;
        Some(HostedSchedulerSettings {
            api_url: api_url.to_string(),
            api_key: api_key.clone(),
        })
    }

    /// Some hosted scheduler setting is present but the set is incomplete.
    fn hosted_partially_configured(&self) -> bool {
        let any = self.hosted_enabled.as_deref().is_some_and(is_truthy)
            || self.api_key().is_some()
            || self.api_url().is_some();
        any && self.hosted_settings().is_none()
    }
}

/// Pick the job manager mode for the given inputs.
pub fn resolve_mode_from(inputs: &ModeInputs) -> Mode {
    if inputs.is_disabled() {
        return Mode::Disabled;
    }

    if inputs.hosted_settings().is_some() {
        return Mode::Hosted;
    }

    if inputs.hosted_partially_configured() {
        warn!(
            enabled = inputs.hosted_enabled.as_deref().is_some_and(is_truthy),
            api_key = inputs.api_key().is_some(),
            api_url = inputs.api_url().is_some(),
            production = inputs.is_production(),
            "Hosted scheduler partially configured, falling back"
        );
    }

    if inputs.is_on_platform() {
        return Mode::Platform;
    }

    Mode::Local
}

/// Pick the job manager mode for the current process environment.
pub fn resolve_mode() -> Mode {
    let mode = resolve_mode_from(&ModeInputs::from_env());
    info!(mode = %mode, "Resolved job manager mode");
    mode
}
