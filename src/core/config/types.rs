use jsonwebtoken::Algorithm;
use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) server: ServerSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) security: SecuritySettings,
    pub(super) cors: CorsSettings,
    pub(super) database: DatabaseSettings,
    pub(super) redis: RedisSettings,
    pub(super) storage: StorageSettings,
    pub(super) s3: S3Settings,
    pub(super) lab: LabSettings,
    pub(super) admin: AdminSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

/// Public paths and labels of the HTTP surface.
#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) version: String,
    pub(crate) api_v1_str: String,
    pub(crate) dashboard_path: String,
    pub(crate) login_path: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SecuritySettings {
    pub(crate) secret_key: String,
    pub(crate) access_token_expire_minutes: u64,
    pub(crate) algorithm: Algorithm,
}

#[derive(Debug, Clone)]
pub(crate) struct CorsSettings {
    pub(crate) origins: Vec<String>,
}

/// Either a full `DATABASE_URL` or the discrete `POSTGRES_*` parts.
#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) url: Option<String>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RedisSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) db: u16,
    pub(crate) password: String,
}

/// Limits applied to student photo uploads.
#[derive(Debug, Clone)]
pub(crate) struct StorageSettings {
    pub(crate) max_upload_size_mb: u64,
    pub(crate) allowed_image_extensions: Vec<String>,
    pub(crate) presigned_url_expire_minutes: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct S3Settings {
    pub(crate) endpoint: String,
    pub(crate) access_key: String,
    pub(crate) secret_key: String,
    pub(crate) bucket: String,
    pub(crate) region: String,
}

/// Knobs for the listing and dashboard views.
#[derive(Debug, Clone)]
pub(crate) struct LabSettings {
    pub(crate) page_size: i64,
    pub(crate) recent_workers_limit: i64,
    pub(crate) message_window_days: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct AdminSettings {
    pub(crate) first_superuser_email: String,
    pub(crate) first_superuser_password: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl DatabaseSettings {
    pub(crate) fn database_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl RedisSettings {
    pub(crate) fn redis_url(&self) -> String {
        let auth = if self.password.is_empty() {
            String::new()
        } else {
            format!(":{}@", self.password)
        };
        format!("redis://{auth}{}:{}/{}", self.host, self.port, self.db)
    }
}

impl S3Settings {
    /// Photo uploads are disabled unless both credentials are present.
    pub(crate) fn is_configured(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}
