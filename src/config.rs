use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{Level, warn};

use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

const LOG_LEVEL_VAR: &str = "STORAGE_FIT_LOG_LEVEL";

/// Log level used when `RUST_LOG` does not say otherwise.
///
/// Read before the subscriber exists, so problems go to stderr directly.
pub fn log_level_from_env() -> Level {
    match env_string(LOG_LEVEL_VAR) {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            eprintln!("Could not interpret {LOG_LEVEL_VAR} ('{raw}') as log level. Using info.");
            Level::INFO
        }),
        None => Level::INFO,
    }
}

fn parse_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "STORAGE_FIT_API_HOST";
    const PORT_VAR: &'static str = "STORAGE_FIT_API_PORT";

    fn from_env() -> Self {
        let host_value =
            env_string(Self::HOST_VAR).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    Self::HOST_VAR,
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Configuration for the packing engine and the scenes built from its results.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
    visualization_scale: f64,
    include_scene: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
            visualization_scale: Self::DEFAULT_VISUALIZATION_SCALE,
            include_scene: false,
        }
    }
}

impl OptimizerConfig {
    pub const DEFAULT_VISUALIZATION_SCALE: f64 = 0.1;

    const MAX_ITEMS_VAR: &'static str = "STORAGE_FIT_MAX_ITEMS";
    const GENERAL_EPSILON_VAR: &'static str = "STORAGE_FIT_GENERAL_EPSILON";
    const SCALE_VAR: &'static str = "STORAGE_FIT_VISUALIZATION_SCALE";
    const INCLUDE_SCENE_VAR: &'static str = "STORAGE_FIT_INCLUDE_SCENE";

    fn from_env() -> Self {
        let max_expanded_items = load_usize(
            Self::MAX_ITEMS_VAR,
            PackingConfig::DEFAULT_MAX_EXPANDED_ITEMS,
        );

        let general_epsilon = load_f64_with_warning(
            Self::GENERAL_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            PackingConfig::is_valid_general_epsilon,
            "must be greater than 0 and at most 0.001",
            "Adjusted tolerances may let units touch or exceed the walls",
        );

        let visualization_scale = load_f64_with_warning(
            Self::SCALE_VAR,
            Self::DEFAULT_VISUALIZATION_SCALE,
            |value| value > 0.0 && value.is_finite(),
            "must be a positive number",
            "Custom visualization scale",
        );

        let include_scene = env_string(Self::INCLUDE_SCENE_VAR)
            .and_then(|raw| parse_bool(&raw, Self::INCLUDE_SCENE_VAR))
            .unwrap_or(false);

        let packing = PackingConfig::builder()
            .max_expanded_items(max_expanded_items)
            .general_epsilon(general_epsilon)
            .build();

        Self {
            packing,
            visualization_scale,
            include_scene,
        }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }

    /// Inches to scene units when a request does not choose its own scale.
    pub fn visualization_scale(&self) -> f64 {
        self.visualization_scale
    }

    /// Whether `/pack` responses carry a scene by default.
    pub fn include_scene(&self) -> bool {
        self.include_scene
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_positive_usize(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

fn load_usize(var_name: &str, default: usize) -> usize {
    match env_string(var_name) {
        Some(raw) => parse_positive_usize(&raw).unwrap_or_else(|| {
            warn!(
                "{} contains invalid value '{}': must be a positive integer. Using {}.",
                var_name, raw, default
            );
            default
        }),
        None => default,
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    resolve_f64(
        var_name,
        env_string(var_name).as_deref(),
        default,
        validator,
        invalid_hint,
        warning,
    )
}

fn resolve_f64(
    var_name: &str,
    raw: Option<&str>,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    warn!(
                        "{} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        warn!("{} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        // Case and whitespace are ignored
        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool(" Yes ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("off", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("  OFF ", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_positive_usize() {
        assert_eq!(parse_positive_usize("500"), Some(500));
        assert_eq!(parse_positive_usize(" 42 "), Some(42));
        assert_eq!(parse_positive_usize("0"), None);
        assert_eq!(parse_positive_usize("-3"), None);
        assert_eq!(parse_positive_usize("many"), None);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level(" WARN "), Some(Level::WARN));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_unset_variables_fall_back_to_defaults() {
        let name = "STORAGE_FIT_TEST_SURELY_UNSET_VARIABLE";
        assert_eq!(env_string(name), None);
        assert_eq!(load_usize(name, 7), 7);
        assert_eq!(
            load_f64_with_warning(name, 0.25, |v| v > 0.0, "must be positive", "changed"),
            0.25
        );
    }

    #[test]
    fn test_general_epsilon_outside_range_falls_back() {
        let resolve = |raw: &str| {
            resolve_f64(
                "STORAGE_FIT_GENERAL_EPSILON",
                Some(raw),
                PackingConfig::DEFAULT_GENERAL_EPSILON,
                PackingConfig::is_valid_general_epsilon,
                "out of range",
                "changed",
            )
        };

        assert_eq!(resolve("5.0"), PackingConfig::DEFAULT_GENERAL_EPSILON);
        assert_eq!(resolve("0"), PackingConfig::DEFAULT_GENERAL_EPSILON);
        assert_eq!(resolve("tiny"), PackingConfig::DEFAULT_GENERAL_EPSILON);
        assert_eq!(resolve("0.0005"), 0.0005);
    }

    #[test]
    fn test_default_optimizer_config() {
        let config = OptimizerConfig::default();
        assert_eq!(
            config.packing_config().max_expanded_items,
            PackingConfig::DEFAULT_MAX_EXPANDED_ITEMS
        );
        assert_eq!(config.visualization_scale(), 0.1);
        assert!(!config.include_scene());
    }
}
