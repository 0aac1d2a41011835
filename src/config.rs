// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] built from them once at startup. Nothing else in the crate
//! reads the environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SECRET_KEY` | HS256 signing secret for session tokens | Required |
//! | `MAIL_USERNAME` | SMTP username | Required |
//! | `MAIL_PASSWORD` | SMTP password | Required |
//! | `MAIL_FROM` | Sender address for reset emails | Required |
//! | `MAIL_FROM_NAME` | Sender display name | `Recover Exhala Password` |
//! | `MAIL_SERVER` | SMTP server (STARTTLS) | `smtp.gmail.com` |
//! | `MAIL_PORT` | SMTP port | `587` |
//! | `MAIL_DELIVERY` | `smtp`, or `log` to only log emails (development only) | `smtp` |
//! | `MONGO_URI` | MongoDB connection string | Unset: in-memory stores |
//! | `MONGO_DATABASE` | MongoDB database name | `exhalabackend` |
//! | `APP_ENV` | `production` or `development` | `development` |
//! | `FRONTEND_ORIGIN` | Origin allowed to send credentialed requests | `http://localhost:5137` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Empty values count as unset.

use std::{fmt, net::SocketAddr};

use url::Url;

use crate::{auth::CookiePolicy, telemetry::LogFormat};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the token signing secret.
///
/// Startup aborts when it is missing: without it no session can be issued
/// or verified.
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";

pub const MAIL_USERNAME_ENV: &str = "MAIL_USERNAME";
pub const MAIL_PASSWORD_ENV: &str = "MAIL_PASSWORD";
pub const MAIL_FROM_ENV: &str = "MAIL_FROM";
pub const MAIL_FROM_NAME_ENV: &str = "MAIL_FROM_NAME";
pub const MAIL_SERVER_ENV: &str = "MAIL_SERVER";
pub const MAIL_PORT_ENV: &str = "MAIL_PORT";

/// Selects how reset emails leave the process.
///
/// `log` is refused when `APP_ENV=production`.
pub const MAIL_DELIVERY_ENV: &str = "MAIL_DELIVERY";

pub const MONGO_URI_ENV: &str = "MONGO_URI";
pub const MONGO_DATABASE_ENV: &str = "MONGO_DATABASE";

/// Selects the session cookie policy.
///
/// `production` marks the cookie `Secure; SameSite=None` so that a front-end
/// on another HTTPS origin can send it. Anything else uses `SameSite=Lax`
/// without `Secure`, which works over plain HTTP on localhost.
pub const APP_ENV_ENV: &str = "APP_ENV";

pub const FRONTEND_ORIGIN_ENV: &str = "FRONTEND_ORIGIN";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAIL_FROM_NAME: &str = "Recover Exhala Password";
pub const DEFAULT_MAIL_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_MAIL_PORT: u16 = 587;
pub const DEFAULT_MONGO_DATABASE: &str = "exhalabackend";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5137";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Production,
    Development,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            AppEnv::Production
        } else {
            AppEnv::Development
        }
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        match self {
            AppEnv::Production => CookiePolicy::CrossSite,
            AppEnv::Development => CookiePolicy::SameSite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailDelivery {
    Smtp,
    Log,
}

impl MailDelivery {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "smtp" => Some(MailDelivery::Smtp),
            "log" => Some(MailDelivery::Log),
            _ => None,
        }
    }
}

/// SMTP server, credentials and sender identity.
#[derive(Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub from_name: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("from", &self.from)
            .field("from_name", &self.from_name)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub secret_key: String,
    pub mail: MailConfig,
    pub mail_delivery: MailDelivery,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub app_env: AppEnv,
    pub frontend_origin: String,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("secret_key", &"[redacted]")
            .field("mail", &self.mail)
            .field("mail_delivery", &self.mail_delivery)
            .field("mongo_uri", &self.mongo_uri.as_ref().map(|_| "[redacted]"))
            .field("mongo_database", &self.mongo_database)
            .field("app_env", &self.app_env)
            .field("frontend_origin", &self.frontend_origin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port_or = |name: &'static str, default: u16| match get(name) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = port_or(PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let secret_key = required(SECRET_KEY_ENV)?;

        let app_env = get(APP_ENV_ENV)
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Development);

        let mail = MailConfig {
            server: get(MAIL_SERVER_ENV).unwrap_or_else(|| DEFAULT_MAIL_SERVER.to_string()),
            port: port_or(MAIL_PORT_ENV, DEFAULT_MAIL_PORT)?,
            username: required(MAIL_USERNAME_ENV)?,
            password: required(MAIL_PASSWORD_ENV)?,
            from: required(MAIL_FROM_ENV)?,
            from_name: get(MAIL_FROM_NAME_ENV)
                .unwrap_or_else(|| DEFAULT_MAIL_FROM_NAME.to_string()),
        };

        let mail_delivery = match get(MAIL_DELIVERY_ENV) {
            Some(raw) => MailDelivery::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                name: MAIL_DELIVERY_ENV,
                reason: format!("expected `smtp` or `log`, got `{raw}`"),
            })?,
            None => MailDelivery::Smtp,
        };
        if mail_delivery == MailDelivery::Log && app_env == AppEnv::Production {
            return Err(ConfigError::Invalid {
                name: MAIL_DELIVERY_ENV,
                reason: "`log` delivery is not allowed in production".to_string(),
            });
        }

        let frontend_origin = get(FRONTEND_ORIGIN_ENV)
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string());
        parse_url(FRONTEND_ORIGIN_ENV, &frontend_origin)?;
        let frontend_origin = frontend_origin.trim_end_matches('/').to_string();

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason: format!("expected `json` or `pretty`, got `{raw}`"),
            })?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            secret_key,
            mail,
            mail_delivery,
            mongo_uri: get(MONGO_URI_ENV),
            mongo_database: get(MONGO_DATABASE_ENV)
                .unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string()),
            app_env,
            frontend_origin,
            log_format,
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("SECRET_KEY", "s3cret"),
        ("MAIL_USERNAME", "mailer"),
        ("MAIL_PASSWORD", "hunter2"),
        ("MAIL_FROM", "noreply@exhala.app"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.mail.from_name, "Recover Exhala Password");
        assert_eq!(config.mongo_database, "exhalabackend");
        assert_eq!(config.frontend_origin, "http://localhost:5137");
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.mongo_uri.is_none());
        assert_eq!(config.mail.server, "smtp.gmail.com");
        assert_eq!(config.mail.port, 587);
        assert_eq!(config.mail_delivery, MailDelivery::Smtp);
    }

    #[test]
    fn secret_key_is_required() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SECRET_KEY")
            .collect();
        assert!(matches!(load(&vars), Err(ConfigError::Missing("SECRET_KEY"))));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("SECRET_KEY", "  ");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("SECRET_KEY"))));
    }

    #[test]
    fn production_selects_cross_site_cookies() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("APP_ENV", "production"));
        let config = load(&vars).unwrap();
        assert_eq!(config.app_env.cookie_policy(), CookiePolicy::CrossSite);
        assert_eq!(AppEnv::Development.cookie_policy(), CookiePolicy::SameSite);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { name: "PORT", .. })));

        let mut vars = REQUIRED.to_vec();
        vars.push(("MAIL_PORT", "70000"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "MAIL_PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("MAIL_DELIVERY", "carrier-pigeon"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "MAIL_DELIVERY", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("FRONTEND_ORIGIN", "ftp://app.exhala.com"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "FRONTEND_ORIGIN", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("LOG_FORMAT", "xml"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn log_delivery_is_development_only() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MAIL_DELIVERY", "log"));
        assert_eq!(load(&vars).unwrap().mail_delivery, MailDelivery::Log);

        vars.push(("APP_ENV", "production"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "MAIL_DELIVERY", .. })
        ));
    }

    #[test]
    fn smtp_server_can_be_overridden() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MAIL_SERVER", "smtp.example.org"));
        vars.push(("MAIL_PORT", "2525"));
        let config = load(&vars).unwrap();
        assert_eq!(config.mail.server, "smtp.example.org");
        assert_eq!(config.mail.port, 2525);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("MONGO_URI", "mongodb://user:pw@db:27017"));
        let rendered = format!("{:?}", load(&vars).unwrap());
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("user:pw"));
    }

    #[test]
    fn frontend_origin_loses_trailing_slash() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("FRONTEND_ORIGIN", "https://app.exhala.com/"));
        assert_eq!(load(&vars).unwrap().frontend_origin, "https://app.exhala.com");
    }
}
