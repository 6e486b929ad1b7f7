use super::parsing::{
    env_flag, env_number, env_optional, env_or_default, env_positive, parse_algorithm,
    parse_cors_origins, parse_environment, parse_image_extensions,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, Environment,
    LabSettings, RedisSettings, RuntimeSettings, S3Settings, SecuritySettings, ServerSettings,
    Settings, StorageSettings, TelemetrySettings,
};

impl Settings {
    /// Reads every section from the environment. Loading `.env` is up to the caller.
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let runtime = RuntimeSettings::from_env();

        let settings = Self {
            server: ServerSettings::from_env()?,
            api: ApiSettings::from_env(),
            security: SecuritySettings::from_env()?,
            cors: CorsSettings { origins: parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))? },
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            storage: StorageSettings::from_env()?,
            s3: S3Settings::from_env(),
            lab: LabSettings::from_env()?,
            admin: AdminSettings {
                first_superuser_email: env_or_default("FIRST_SUPERUSER_EMAIL", "admin@lab.local"),
                first_superuser_password: env_or_default("FIRST_SUPERUSER_PASSWORD", ""),
            },
            telemetry: TelemetrySettings {
                log_level: env_or_default("LAB_LOG_LEVEL", "info"),
                json: env_flag("LAB_LOG_JSON"),
                prometheus_enabled: env_flag("PROMETHEUS_ENABLED"),
            },
            runtime,
        };

        if settings.runtime.strict_config {
            settings.require_secrets()?;
        }

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn lab(&self) -> &LabSettings {
        &self.lab
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn require_secrets(&self) -> Result<(), ConfigError> {
        if self.database.url.is_none() && self.database.password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }
        Ok(())
    }
}

impl RuntimeSettings {
    fn from_env() -> Self {
        let raw = env_optional("LAB_ENV").or_else(|| env_optional("ENVIRONMENT"));
        let environment = parse_environment(raw.as_deref());
        // Production is always strict.
        let strict_config =
            env_flag("LAB_STRICT_CONFIG") || environment == Environment::Production;
        Self { environment, strict_config }
    }
}

impl ServerSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("LAB_HOST", "0.0.0.0");
        let port: u16 = env_number("LAB_PORT", 8000)?;
        if port == 0 {
            return Err(ConfigError::InvalidValue { field: "LAB_PORT", value: port.to_string() });
        }
        Ok(Self { host, port })
    }
}

impl ApiSettings {
    fn from_env() -> Self {
        Self {
            project_name: env_or_default("PROJECT_NAME", "Student Lab API"),
            version: env_or_default("VERSION", env!("CARGO_PKG_VERSION")),
            api_v1_str: env_or_default("API_V1_STR", "/api/v1"),
            dashboard_path: env_or_default("DASHBOARD_PATH", "/dashboard"),
            login_path: env_or_default("LOGIN_PATH", "/login"),
        }
    }
}

impl SecuritySettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: env_optional("SECRET_KEY").unwrap_or_else(load_or_create_secret_key),
            // One week.
            access_token_expire_minutes: env_number("ACCESS_TOKEN_EXPIRE_MINUTES", 10_080)?,
            algorithm: parse_algorithm(&env_or_default("ALGORITHM", "HS256"))?,
        })
    }
}

impl DatabaseSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_optional("DATABASE_URL"),
            host: env_or_default("POSTGRES_SERVER", "localhost"),
            port: env_number("POSTGRES_PORT", 5432)?,
            user: env_or_default("POSTGRES_USER", "lab"),
            password: env_or_default("POSTGRES_PASSWORD", ""),
            name: env_or_default("POSTGRES_DB", "student_lab"),
        })
    }
}

impl RedisSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("REDIS_HOST", "localhost"),
            port: env_number("REDIS_PORT", 6379)?,
            db: env_number("REDIS_DB", 0)?,
            password: env_or_default("REDIS_PASSWORD", ""),
        })
    }
}

impl StorageSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_upload_size_mb: env_number("MAX_UPLOAD_SIZE_MB", 5)?,
            allowed_image_extensions: parse_image_extensions(env_optional(
                "ALLOWED_IMAGE_EXTENSIONS",
            ))?,
            presigned_url_expire_minutes: env_number("PRESIGNED_URL_EXPIRE_MINUTES", 5)?,
        })
    }
}

impl S3Settings {
    fn from_env() -> Self {
        Self {
            endpoint: env_or_default("S3_ENDPOINT", "http://localhost:9000"),
            access_key: env_or_default("S3_ACCESS_KEY", ""),
            secret_key: env_or_default("S3_SECRET_KEY", ""),
            bucket: env_or_default("S3_BUCKET", "student-lab-photos"),
            region: env_or_default("S3_REGION", "us-east-1"),
        }
    }
}

impl LabSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            page_size: env_positive("PAGE_SIZE", 20)?,
            recent_workers_limit: env_positive("RECENT_WORKERS_LIMIT", 6)?,
            message_window_days: env_positive("MESSAGE_WINDOW_DAYS", 7)?,
        })
    }
}
