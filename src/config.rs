//! Configuration management for the root-check panel.
//!
//! Configuration can be set via environment variables:
//! - `ROOTCHECK_STEPS_PER_RESULT` - Optional. Progress steps per check result. Defaults to `10`.
//! - `ROOTCHECK_STEP_DELAY_MS` - Optional. Delay between progress steps. Defaults to `50`.
//! - `ROOTCHECK_DETECTOR_TIMEOUT_SECS` - Optional. Detector timeout, `0` disables it. Defaults to `60`.
//! - `ROOTCHECK_DETECTOR_COMMAND` - Optional. External detector program. Unset uses the demo detector.
//! - `ROOTCHECK_DETECTOR_ARGS` - Optional. Whitespace-separated detector arguments.
//! - `ROOTCHECK_MORE_INFO_URL` - Optional. Page opened by the "More info" actions.
//! - `ROOTCHECK_JSON_EVENTS` - Optional. Print presentation events as JSON lines. Defaults to `false`.
//! - `ROOTCHECK_EVENT_BUFFER` - Optional. Presentation event channel capacity. Defaults to `256`.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::reveal::RevealSettings;
use crate::util::{env_var_bool, env_var_trimmed, split_args};

/// Project page opened by the navigation actions unless overridden.
pub const DEFAULT_MORE_INFO_URL: &str = "https://github.com/scottyab/rootbeer";

const DEFAULT_STEPS_PER_RESULT: u32 = 10;
const DEFAULT_STEP_DELAY_MS: u64 = 50;
const DEFAULT_DETECTOR_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Where check results come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorSource {
    /// Built-in detector returning a canned result list.
    Demo,
    /// External program printing a JSON report on stdout.
    Command { program: String, args: Vec<String> },
}

/// Panel configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Progress steps spent on each check result
    pub steps_per_result: u32,

    /// Delay between two progress steps
    pub step_delay: Duration,

    /// Upper bound on a single detector call (`None` = unbounded)
    pub detector_timeout: Option<Duration>,

    /// Detector selection
    pub detector: DetectorSource,

    /// Page opened by "More info" and the direct menu action
    pub more_info_url: Url,

    /// Emit JSON lines instead of drawing
    pub json_events: bool,

    /// Capacity of the presentation event channel
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps_per_result: DEFAULT_STEPS_PER_RESULT,
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            detector_timeout: Some(Duration::from_secs(DEFAULT_DETECTOR_TIMEOUT_SECS)),
            detector: DetectorSource::Demo,
            more_info_url: default_more_info_url(),
            json_events: false,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse,
    /// is out of range, or the more-info URL is not an absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let steps_per_result: u32 =
            parse_env("ROOTCHECK_STEPS_PER_RESULT", DEFAULT_STEPS_PER_RESULT)?;
        if steps_per_result == 0 {
            return Err(ConfigError::InvalidValue(
                "ROOTCHECK_STEPS_PER_RESULT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let step_delay_ms: u64 = parse_env("ROOTCHECK_STEP_DELAY_MS", DEFAULT_STEP_DELAY_MS)?;

        let timeout_secs: u64 = parse_env(
            "ROOTCHECK_DETECTOR_TIMEOUT_SECS",
            DEFAULT_DETECTOR_TIMEOUT_SECS,
        )?;
        let detector_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let detector = match env_var_trimmed("ROOTCHECK_DETECTOR_COMMAND") {
            Some(program) => DetectorSource::Command {
                program,
                args: env_var_trimmed("ROOTCHECK_DETECTOR_ARGS")
                    .map(|raw| split_args(&raw))
                    .unwrap_or_default(),
            },
            None => DetectorSource::Demo,
        };

        let more_info_url = match env_var_trimmed("ROOTCHECK_MORE_INFO_URL") {
            Some(raw) => parse_url("ROOTCHECK_MORE_INFO_URL", &raw)?,
            None => default_more_info_url(),
        };

        let event_buffer: usize = parse_env("ROOTCHECK_EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?;
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "ROOTCHECK_EVENT_BUFFER".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            steps_per_result,
            step_delay: Duration::from_millis(step_delay_ms),
            detector_timeout,
            detector,
            more_info_url,
            json_events: env_var_bool("ROOTCHECK_JSON_EVENTS", false),
            event_buffer,
        })
    }

    /// Reveal timing derived from this configuration.
    pub fn reveal_settings(&self) -> RevealSettings {
        RevealSettings::new(self.steps_per_result, self.step_delay)
    }
}

fn default_more_info_url() -> Url {
    Url::parse(DEFAULT_MORE_INFO_URL).expect("DEFAULT_MORE_INFO_URL is a valid URL")
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} is not an absolute URL", raw),
        ));
    }
    Ok(url)
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var_trimmed(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_animation() {
        let config = Config::default();
        assert_eq!(config.steps_per_result, 10);
        assert_eq!(config.step_delay, Duration::from_millis(50));
        assert_eq!(config.detector_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.detector, DetectorSource::Demo);
        assert_eq!(config.more_info_url.as_str(), DEFAULT_MORE_INFO_URL);
        assert!(!config.json_events);
    }

    #[test]
    fn reveal_settings_follow_config() {
        let config = Config {
            steps_per_result: 4,
            step_delay: Duration::from_millis(5),
            ..Config::default()
        };
        let settings = config.reveal_settings();
        assert_eq!(settings.steps_per_result(), 4);
        assert_eq!(settings.step_delay(), Duration::from_millis(5));
    }

    #[test]
    fn parse_env_reports_variable_name_on_bad_number() {
        std::env::set_var("ROOTCHECK_TEST_BAD_NUMBER", "ten");
        let err = parse_env::<u32>("ROOTCHECK_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("ROOTCHECK_TEST_BAD_NUMBER"));
    }

    #[test]
    fn parse_env_uses_default_when_unset() {
        let value = parse_env::<u64>("ROOTCHECK_TEST_UNSET_NUMBER", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn default_more_info_url_is_absolute() {
        let url = parse_url("DEFAULT_MORE_INFO_URL", DEFAULT_MORE_INFO_URL).unwrap();
        assert_eq!(url, default_more_info_url());
    }

    #[test]
    fn from_env_validates_zero_values() {
        std::env::set_var("ROOTCHECK_STEPS_PER_RESULT", "0");
        let err = Config::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue(ref name, _) if name == "ROOTCHECK_STEPS_PER_RESULT")
        );
        std::env::remove_var("ROOTCHECK_STEPS_PER_RESULT");

        std::env::set_var("ROOTCHECK_EVENT_BUFFER", "0");
        let err = Config::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue(ref name, _) if name == "ROOTCHECK_EVENT_BUFFER")
        );
        std::env::remove_var("ROOTCHECK_EVENT_BUFFER");

        std::env::set_var("ROOTCHECK_DETECTOR_TIMEOUT_SECS", "0");
        let config = Config::from_env().unwrap();
        assert_eq!(config.detector_timeout, None);
        std::env::remove_var("ROOTCHECK_DETECTOR_TIMEOUT_SECS");
    }

    #[test]
    fn parse_url_rejects_relative_and_opaque_urls() {
        assert!(parse_url("X", "not a url").is_err());
        assert!(parse_url("X", "mailto:someone@example.com").is_err());
        assert!(parse_url("X", "https://example.com/project").is_ok());
    }
}
