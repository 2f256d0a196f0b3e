//! Configuration types for nzb-password-detector
//!
//! NZBGet hands every option to scripts as environment variables: global options
//! as `NZBOP_*`, this script's options as `NZBPO_*`. [`Config::from_vars`] turns
//! such a variable map into the explicit structures below, which are then passed
//! to the probe and the orchestrator at construction.

use std::{collections::HashMap, path::PathBuf, time::Duration};
use tracing::warn;

use crate::error::{Error, Result};

/// Marker strings that reveal a password protected archive in unrar output.
///
/// The leading `*` is matched as a literal character, not as a wildcard.
pub const DEFAULT_PASSWORD_STRINGS: &str =
    "*,wrong password,The specified password is incorrect,encrypted headers,Incorrect password for";

/// Name of the directory below NZBGet's `TempDir` holding the tracker records
pub const TRACKER_DIR_NAME: &str = "PasswordDetector";

/// What to do with a job once a password is found
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PassAction {
    /// Only publish the has-password flag
    #[default]
    None,
    /// Pause the job so the user can enter a password
    Pause,
    /// Mark the job bad so NZBGet fails it and may pick a duplicate
    MarkBad,
}

impl PassAction {
    /// Parse the value of the `PassAction` script option
    ///
    /// Unrecognized values fall back to [`PassAction::None`].
    pub fn from_option(value: &str) -> Self {
        match value.trim() {
            "None" => PassAction::None,
            "Pause" => PassAction::Pause,
            "Mark Bad" => PassAction::MarkBad,
            other => {
                warn!(value = other, "unknown PassAction, no action will be taken");
                PassAction::None
            }
        }
    }
}

/// Detection behavior
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    /// Action when a password is found (`NZBPO_PASSACTION`, required)
    pub pass_action: PassAction,

    /// Comma separated marker strings (`NZBPO_PASSWORDSTRINGS`)
    pub password_strings: String,

    /// Log unrar command lines and output (`NZBPO_VERBOSE`)
    pub verbose: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pass_action: PassAction::Pause,
            password_strings: default_password_strings(),
            verbose: false,
        }
    }
}

/// External tool lookup
#[derive(Clone, Debug)]
pub struct ToolsConfig {
    /// NZBGet's `UnrarCmd` option, possibly with extra arguments
    pub unrar_cmd: Option<String>,

    /// Whether to search PATH for unrar if `unrar_cmd` does not name it (default: true)
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            unrar_cmd: None,
            search_path: true,
        }
    }
}

/// Where tested-file records live
#[derive(Clone, Debug)]
pub struct PersistenceConfig {
    /// NZBGet's `TempDir` option
    pub temp_dir: PathBuf,
}

impl PersistenceConfig {
    /// Directory holding one record per job
    pub fn tracker_dir(&self) -> PathBuf {
        self.temp_dir.join(TRACKER_DIR_NAME)
    }
}

/// Connection to NZBGet's control API
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// `ControlIP`; `0.0.0.0` is contacted as `127.0.0.1`
    pub control_ip: String,

    /// `ControlPort`
    pub control_port: u16,

    /// `ControlUsername`
    pub username: String,

    /// `ControlPassword`
    pub password: String,

    /// HTTP timeout for every call (default: 300s)
    pub timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            control_ip: default_control_ip(),
            control_port: default_control_port(),
            username: String::new(),
            password: String::new(),
            timeout: default_rpc_timeout(),
        }
    }
}

impl ControllerConfig {
    /// Host to connect to, with the wildcard bind address replaced by loopback
    pub fn connect_host(&self) -> &str {
        if self.control_ip == "0.0.0.0" {
            "127.0.0.1"
        } else {
            &self.control_ip
        }
    }

    /// JSON-RPC endpoint URL
    pub fn endpoint(&self) -> Result<url::Url> {
        let raw = format!(
            "http://{}:{}/jsonrpc",
            self.connect_host(),
            self.control_port
        );
        url::Url::parse(&raw).map_err(|e| {
            Error::config(
                format!("invalid control address {raw}: {e}"),
                "NZBOP_CONTROLIP",
            )
        })
    }
}

/// Main configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Detection behavior
    pub detector: DetectorConfig,
    /// External tool lookup
    pub tools: ToolsConfig,
    /// Tracker storage
    pub persistence: PersistenceConfig,
    /// Host control API
    pub controller: ControllerConfig,
}

impl Config {
    /// Build the configuration from NZBGet's environment variables
    ///
    /// Fails when `NZBOP_TEMPDIR` or `NZBPO_PASSACTION` is missing.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let temp_dir = vars
            .get("NZBOP_TEMPDIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| Error::config("option TempDir is missing", "NZBOP_TEMPDIR"))?;

        let pass_action = vars
            .get("NZBPO_PASSACTION")
            .map(|v| PassAction::from_option(v))
            .ok_or_else(|| {
                Error::config(
                    "option PassAction is missing in configuration file, please check script settings",
                    "NZBPO_PASSACTION",
                )
            })?;

        let password_strings = vars
            .get("NZBPO_PASSWORDSTRINGS")
            .cloned()
            .unwrap_or_else(default_password_strings);

        let verbose = vars
            .get("NZBPO_VERBOSE")
            .map(|v| is_yes(v))
            .unwrap_or(false);

        let control_port = match vars.get("NZBOP_CONTROLPORT") {
            Some(port) => port.trim().parse().map_err(|_| {
                Error::config(
                    format!("invalid ControlPort {port:?}"),
                    "NZBOP_CONTROLPORT",
                )
            })?,
            None => default_control_port(),
        };

        Ok(Self {
            detector: DetectorConfig {
                pass_action,
                password_strings,
                verbose,
            },
            tools: ToolsConfig {
                unrar_cmd: vars.get("NZBOP_UNRARCMD").cloned(),
                ..Default::default()
            },
            persistence: PersistenceConfig { temp_dir },
            controller: ControllerConfig {
                control_ip: vars
                    .get("NZBOP_CONTROLIP")
                    .cloned()
                    .unwrap_or_else(default_control_ip),
                control_port,
                username: vars.get("NZBOP_CONTROLUSERNAME").cloned().unwrap_or_default(),
                password: vars.get("NZBOP_CONTROLPASSWORD").cloned().unwrap_or_default(),
                ..Default::default()
            },
        })
    }
}

fn is_yes(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}

fn default_password_strings() -> String {
    DEFAULT_PASSWORD_STRINGS.to_string()
}

fn default_control_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_control_port() -> u16 {
    6789
}

fn default_rpc_timeout() -> Duration {
    Duration::from_secs(300)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn pass_action_parsing() {
        assert_eq!(PassAction::from_option("None"), PassAction::None);
        assert_eq!(PassAction::from_option("Pause"), PassAction::Pause);
        assert_eq!(PassAction::from_option("Mark Bad"), PassAction::MarkBad);
        assert_eq!(PassAction::from_option("Delete"), PassAction::None);
    }

    #[test]
    fn from_vars_reads_nzbget_options() {
        let config = Config::from_vars(&vars(&[
            ("NZBOP_TEMPDIR", "/var/nzbget/tmp"),
            ("NZBPO_PASSACTION", "Mark Bad"),
            ("NZBOP_UNRARCMD", "/usr/bin/unrar -ai"),
            ("NZBOP_CONTROLIP", "0.0.0.0"),
            ("NZBOP_CONTROLPORT", "6790"),
            ("NZBOP_CONTROLUSERNAME", "nzbget"),
            ("NZBOP_CONTROLPASSWORD", "tegbzn6789"),
        ]))
        .unwrap();

        assert_eq!(config.detector.pass_action, PassAction::MarkBad);
        assert_eq!(config.detector.password_strings, DEFAULT_PASSWORD_STRINGS);
        assert!(!config.detector.verbose);
        assert_eq!(
            config.persistence.tracker_dir(),
            PathBuf::from("/var/nzbget/tmp/PasswordDetector")
        );
        assert_eq!(config.tools.unrar_cmd.as_deref(), Some("/usr/bin/unrar -ai"));
        assert_eq!(config.controller.connect_host(), "127.0.0.1");
        assert_eq!(
            config.controller.endpoint().unwrap().as_str(),
            "http://127.0.0.1:6790/jsonrpc"
        );
        assert_eq!(config.controller.username, "nzbget");
    }

    #[test]
    fn from_vars_requires_pass_action() {
        let err = Config::from_vars(&vars(&[("NZBOP_TEMPDIR", "/tmp")])).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("NZBPO_PASSACTION")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn from_vars_requires_temp_dir() {
        let err = Config::from_vars(&vars(&[("NZBPO_PASSACTION", "Pause")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(k), .. } if k == "NZBOP_TEMPDIR"));
    }

    #[test]
    fn from_vars_optional_overrides() {
        let config = Config::from_vars(&vars(&[
            ("NZBOP_TEMPDIR", "/tmp"),
            ("NZBPO_PASSACTION", "Pause"),
            ("NZBPO_PASSWORDSTRINGS", "encrypted"),
            ("NZBPO_VERBOSE", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.detector.password_strings, "encrypted");
        assert!(config.detector.verbose);
        assert_eq!(config.controller.control_port, 6789);
    }

    #[test]
    fn unset_options_take_section_defaults() {
        let config = Config::from_vars(&vars(&[
            ("NZBOP_TEMPDIR", "/tmp"),
            ("NZBPO_PASSACTION", "None"),
        ]))
        .unwrap();

        let tools = ToolsConfig::default();
        assert_eq!(config.tools.unrar_cmd, tools.unrar_cmd);
        assert_eq!(config.tools.search_path, tools.search_path);
        assert!(config.tools.search_path);

        let controller = ControllerConfig::default();
        assert_eq!(config.controller.control_ip, controller.control_ip);
        assert_eq!(config.controller.timeout, Duration::from_secs(300));
        assert_eq!(config.controller.password, "");
        assert_eq!(config.detector.pass_action, PassAction::None);
    }

    #[test]
    fn from_vars_rejects_bad_port() {
        let err = Config::from_vars(&vars(&[
            ("NZBOP_TEMPDIR", "/tmp"),
            ("NZBPO_PASSACTION", "Pause"),
            ("NZBOP_CONTROLPORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(k), .. } if k == "NZBOP_CONTROLPORT"));
    }
}
