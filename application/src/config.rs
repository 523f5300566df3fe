//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use http::header::{self, HeaderValue, InvalidHeaderValue};
use serde::Deserialize;
use smart_default::SmartDefault;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins. `*` allows any.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

impl Cors {
    /// Builds the [`CorsLayer`] allowing the GraphQL requests from the
    /// configured origins.
    ///
    /// # Errors
    ///
    /// If any of the origins is not a valid header value.
    pub fn layer(&self) -> Result<CorsLayer, InvalidHeaderValue> {
        let origins = if self.origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                self.origins
                    .iter()
                    .map(|o| o.parse::<HeaderValue>())
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
        Ok(CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_origin(origins))
    }
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret verifying access tokens of callers.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Indicator whether deleting a `Payment` re-derives the statuses of the
    /// schedule entries it was matched against.
    pub refresh_schedule_on_payment_deletion: bool,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            refresh_schedule_on_payment_deletion,
            tasks: Tasks {
                refresh_overdue_schedules,
            },
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            refresh_schedule_on_payment_deletion,
            refresh_overdue_schedules:
                service::task::refresh_overdue_schedules::Config {
                    interval: refresh_overdue_schedules.interval,
                },
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `RefreshOverdueSchedules` task configuration.
    pub refresh_overdue_schedules: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time;

    use config::{File, FileFormat};

    use super::{Config, Cors};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn keeps_stale_schedule_and_hourly_refresh_by_default() {
        let service: service::Config = parse("").service.into();

        assert!(!service.refresh_schedule_on_payment_deletion);
        assert_eq!(
            service.refresh_overdue_schedules.interval,
            time::Duration::from_secs(60 * 60),
        );
    }

    #[test]
    fn validates_cors_origins() {
        let config = parse(
            r#"
            [server.cors]
            origins = ["https://landlord.example", "http://localhost:3000"]
            "#,
        );
        assert_eq!(config.server.cors.origins.len(), 2);
        assert!(config.server.cors.layer().is_ok());
        assert!(parse("").server.cors.layer().is_ok());

        let invalid = Cors {
            origins: vec!["https://landlord.example\n".to_owned()],
        };
        assert!(invalid.layer().is_err());
    }

    #[test]
    fn reads_service_section() {
        let config = parse(
            r#"
            [service]
            jwt_secret = "landlord"
            refresh_schedule_on_payment_deletion = true

            [service.tasks.refresh_overdue_schedules]
            interval = "15m"
            "#,
        );

        assert_eq!(config.service.jwt_secret, "landlord");
        assert_eq!(config.server.port, 8080);

        let service: service::Config = config.service.into();
        assert!(service.refresh_schedule_on_payment_deletion);
        assert_eq!(
            service.refresh_overdue_schedules.interval,
            time::Duration::from_secs(15 * 60),
        );
    }
}
