// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into a
//! [`GateConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TOKEN_SIGNING_SECRET` | HMAC secret, at least 32 bytes | Required |
//! | `TOKEN_VALIDITY_SECS` | Token lifetime in seconds, at most one year | `3600` |
//! | `TOKEN_ISSUER` | Token `iss` claim | `relational-token-gate` |
//! | `TOKEN_AUDIENCE` | Token `aud` claim | `api.relational-token-gate` |
//! | `REVOCATION_STORE` | `memory` or `disabled` | `memory` |
//! | `REVOCATION_STORE_REQUIRED` | Fail closed on every route when the store is down | `false` |
//! | `REVOCATION_CHECK_TIMEOUT_MS` | Bound on one store round-trip | `200` |
//! | `REVOCATION_SWEEP_INTERVAL_SECS` | Expired-entry sweep period | `60` |
//! | `PUBLIC_ROUTES` | Comma-separated public path patterns | login, logout, validate, info, health, docs |
//! | `USER_DIRECTORY_FILE` | JSON user directory | None |
//! | `SEED_DEMO_USERS` | Add the demo accounts | `false` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key; HTTPS when both set | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::blacklist::DEFAULT_CHECK_TIMEOUT;
use crate::auth::policy::DEFAULT_PUBLIC_ROUTES;
use crate::auth::revocation::DEFAULT_SWEEP_INTERVAL;

pub const TOKEN_SIGNING_SECRET_ENV: &str = "TOKEN_SIGNING_SECRET";
pub const TOKEN_VALIDITY_SECS_ENV: &str = "TOKEN_VALIDITY_SECS";
pub const TOKEN_ISSUER_ENV: &str = "TOKEN_ISSUER";
pub const TOKEN_AUDIENCE_ENV: &str = "TOKEN_AUDIENCE";
pub const REVOCATION_STORE_ENV: &str = "REVOCATION_STORE";
pub const REVOCATION_STORE_REQUIRED_ENV: &str = "REVOCATION_STORE_REQUIRED";
pub const REVOCATION_CHECK_TIMEOUT_MS_ENV: &str = "REVOCATION_CHECK_TIMEOUT_MS";
pub const REVOCATION_SWEEP_INTERVAL_SECS_ENV: &str = "REVOCATION_SWEEP_INTERVAL_SECS";
pub const PUBLIC_ROUTES_ENV: &str = "PUBLIC_ROUTES";
pub const USER_DIRECTORY_FILE_ENV: &str = "USER_DIRECTORY_FILE";
pub const SEED_DEMO_USERS_ENV: &str = "SEED_DEMO_USERS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Shortest accepted signing secret, in bytes (HS256 key size).
pub const MIN_SECRET_LEN: usize = 32;

pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(3600);
/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_VALIDITY: Duration = Duration::from_secs(365 * 24 * 3600);
pub const DEFAULT_ISSUER: &str = "relational-token-gate";
pub const DEFAULT_AUDIENCE: &str = "api.relational-token-gate";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("TOKEN_SIGNING_SECRET is required")]
    MissingSecret,

    #[error("TOKEN_SIGNING_SECRET must be at least 32 bytes, got {0}")]
    SecretTooShort(usize),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// Revocation store backend, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationBackend {
    #[default]
    Memory,
    Disabled,
}

impl FromStr for RevocationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(RevocationBackend::Memory),
            "disabled" | "none" => Ok(RevocationBackend::Disabled),
            other => Err(format!("unknown revocation store {other:?} (expected memory or disabled)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected json or pretty)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub signing_secret: String,
    pub token_validity: Duration,
    pub issuer: String,
    pub audience: String,
    pub revocation_backend: RevocationBackend,
    pub revocation_store_required: bool,
    pub revocation_check_timeout: Duration,
    pub revocation_sweep_interval: Duration,
    pub public_routes: Vec<String>,
    pub user_directory_file: Option<PathBuf>,
    pub seed_demo_users: bool,
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl GateConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let signing_secret = get(TOKEN_SIGNING_SECRET_ENV).ok_or(ConfigError::MissingSecret)?;
        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort(signing_secret.len()));
        }

        let token_validity = match get(TOKEN_VALIDITY_SECS_ENV) {
            Some(raw) => {
                let secs = parse_positive(TOKEN_VALIDITY_SECS_ENV, &raw)?;
                if secs > MAX_TOKEN_VALIDITY.as_secs() {
                    return Err(invalid(
                        TOKEN_VALIDITY_SECS_ENV,
                        &raw,
                        &format!("must not exceed {} seconds", MAX_TOKEN_VALIDITY.as_secs()),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TOKEN_VALIDITY,
        };
        let revocation_check_timeout = match get(REVOCATION_CHECK_TIMEOUT_MS_ENV) {
            Some(raw) => Duration::from_millis(parse_positive(REVOCATION_CHECK_TIMEOUT_MS_ENV, &raw)?),
            None => DEFAULT_CHECK_TIMEOUT,
        };
        let revocation_sweep_interval = match get(REVOCATION_SWEEP_INTERVAL_SECS_ENV) {
            Some(raw) => Duration::from_secs(parse_positive(REVOCATION_SWEEP_INTERVAL_SECS_ENV, &raw)?),
            None => DEFAULT_SWEEP_INTERVAL,
        };

        let public_routes = match get(PUBLIC_ROUTES_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    if p.starts_with('/') {
                        Ok(p.to_string())
                    } else {
                        Err(invalid(PUBLIC_ROUTES_ENV, p, "patterns must start with '/'"))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_PUBLIC_ROUTES.iter().map(|p| p.to_string()).collect(),
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| invalid(PORT_ENV, &raw, &e.to_string()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            signing_secret,
            token_validity,
            issuer: get(TOKEN_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: get(TOKEN_AUDIENCE_ENV).unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            revocation_backend: parse_or_default(REVOCATION_STORE_ENV, get(REVOCATION_STORE_ENV))?,
            revocation_store_required: parse_flag(
                REVOCATION_STORE_REQUIRED_ENV,
                get(REVOCATION_STORE_REQUIRED_ENV),
            )?,
            revocation_check_timeout,
            revocation_sweep_interval,
            public_routes,
            user_directory_file: get(USER_DIRECTORY_FILE_ENV).map(PathBuf::from),
            seed_demo_users: parse_flag(SEED_DEMO_USERS_ENV, get(SEED_DEMO_USERS_ENV))?,
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            tls,
            log_format: parse_or_default(LOG_FORMAT_ENV, get(LOG_FORMAT_ENV))?,
        })
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_validity", &self.token_validity)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("revocation_backend", &self.revocation_backend)
            .field("revocation_store_required", &self.revocation_store_required)
            .field("revocation_check_timeout", &self.revocation_check_timeout)
            .field("revocation_sweep_interval", &self.revocation_sweep_interval)
            .field("public_routes", &self.public_routes)
            .field("user_directory_file", &self.user_directory_file)
            .field("seed_demo_users", &self.seed_demo_users)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(var, raw, "must be greater than zero")),
        Ok(value) => Ok(value),
        Err(e) => Err(invalid(var, raw, &e.to_string())),
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, &raw, "expected true or false")),
    }
}

fn parse_or_default<T>(var: &'static str, raw: Option<String>) -> Result<T, ConfigError>
where
    T: FromStr<Err = String> + Default,
{
    match raw {
        Some(raw) => raw.parse().map_err(|reason: String| invalid(var, &raw, &reason)),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config(vars: &[(&str, &str)]) -> Result<GateConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_with_only_a_secret() {
        let config = config(&[(TOKEN_SIGNING_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.token_validity, Duration::from_secs(3600));
        assert_eq!(config.issuer, "relational-token-gate");
        assert_eq!(config.audience, "api.relational-token-gate");
        assert_eq!(config.revocation_backend, RevocationBackend::Memory);
        assert!(!config.revocation_store_required);
        assert_eq!(config.revocation_check_timeout, Duration::from_millis(200));
        assert_eq!(config.revocation_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.public_routes.len(), DEFAULT_PUBLIC_ROUTES.len());
        assert!(!config.seed_demo_users);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.tls.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn secret_is_required_and_long_enough() {
        assert_eq!(config(&[]), Err(ConfigError::MissingSecret));
        assert_eq!(
            config(&[(TOKEN_SIGNING_SECRET_ENV, "short")]),
            Err(ConfigError::SecretTooShort(5))
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            (TOKEN_SIGNING_SECRET_ENV, SECRET),
            (TOKEN_VALIDITY_SECS_ENV, "900"),
            (REVOCATION_STORE_ENV, "disabled"),
            (REVOCATION_STORE_REQUIRED_ENV, "true"),
            (REVOCATION_CHECK_TIMEOUT_MS_ENV, "50"),
            (PUBLIC_ROUTES_ENV, "/api/health, /status/**"),
            (SEED_DEMO_USERS_ENV, "1"),
            (PORT_ENV, "9443"),
            (TLS_CERT_PATH_ENV, "/certs/server.pem"),
            (TLS_KEY_PATH_ENV, "/certs/server.key"),
            (LOG_FORMAT_ENV, "JSON"),
        ])
        .unwrap();

        assert_eq!(config.token_validity, Duration::from_secs(900));
        assert_eq!(config.revocation_backend, RevocationBackend::Disabled);
        assert!(config.revocation_store_required);
        assert_eq!(config.revocation_check_timeout, Duration::from_millis(50));
        assert_eq!(config.public_routes, vec!["/api/health", "/status/**"]);
        assert!(config.seed_demo_users);
        assert_eq!(config.port, 9443);
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "/certs/server.pem".into(),
                key: "/certs/server.key".into(),
            })
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (var, value) in [
            (TOKEN_VALIDITY_SECS_ENV, "0"),
            (TOKEN_VALIDITY_SECS_ENV, "-5"),
            (TOKEN_VALIDITY_SECS_ENV, "31536001"),
            (TOKEN_VALIDITY_SECS_ENV, "10000000000000"),
            (REVOCATION_STORE_ENV, "redis"),
            (REVOCATION_STORE_REQUIRED_ENV, "maybe"),
            (PUBLIC_ROUTES_ENV, "api/health"),
            (PORT_ENV, "70000"),
            (LOG_FORMAT_ENV, "xml"),
        ] {
            let result = config(&[(TOKEN_SIGNING_SECRET_ENV, SECRET), (var, value)]);
            assert!(
                matches!(result, Err(ConfigError::Invalid { var: v, .. }) if v == var),
                "{var}={value} gave {result:?}"
            );
        }
    }

    #[test]
    fn token_validity_is_capped_at_one_year() {
        let longest = config(&[
            (TOKEN_SIGNING_SECRET_ENV, SECRET),
            (TOKEN_VALIDITY_SECS_ENV, "31536000"),
        ])
        .unwrap();
        assert_eq!(longest.token_validity, MAX_TOKEN_VALIDITY);

        let err = config(&[
            (TOKEN_SIGNING_SECRET_ENV, SECRET),
            (TOKEN_VALIDITY_SECS_ENV, "31536001"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("must not exceed 31536000 seconds"), "{err}");
    }

    #[test]
    fn tls_needs_both_paths() {
        assert_eq!(
            config(&[
                (TOKEN_SIGNING_SECRET_ENV, SECRET),
                (TLS_CERT_PATH_ENV, "/certs/server.pem"),
            ]),
            Err(ConfigError::PartialTls)
        );
    }

    #[test]
    fn debug_redacts_the_secret() {
        let config = config(&[(TOKEN_SIGNING_SECRET_ENV, SECRET)]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
