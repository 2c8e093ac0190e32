use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MONGODB_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "api_concerts_pictures";
pub const DEFAULT_COLLECTION: &str = "api_concerts_pictures";
pub const DEFAULT_SEED_FILE: &str = "data/pictures.json";

/// Authenticated connections always authenticate against `admin`.
const AUTH_SOURCE: &str = "admin";

#[derive(Debug, Clone)]
pub struct PictureConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub seed_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub initial_database: Option<String>,
    pub database: String,
    pub collection: String,
}

impl PictureConfig {
    /// Core settings from `configuration.*`/`APP__`, then the MongoDB and
    /// seed settings from the process environment.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_env(common)
    }

    pub fn from_env(common: core_config::Config) -> Result<Self, AppError> {
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let host = get("ME_CONFIG_MONGODB_SERVER").ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "Missing MongoDB server in the ME_CONFIG_MONGODB_SERVER variable"
            ))
        })?;

        let port = match get("MONGODB_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid MONGODB_PORT '{}': {}", raw, e))
            })?,
            None => DEFAULT_MONGODB_PORT,
        };

        Ok(PictureConfig {
            common,
            mongodb: MongoConfig {
                host,
                port,
                username: get("MONGO_INITDB_ROOT_USERNAME"),
                password: get("MONGO_INITDB_ROOT_PASSWORD").map(Secret::new),
                initial_database: get("MONGO_INITDB_DATABASE"),
                database: get("PICTURE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                collection: get("PICTURE_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            },
            seed_file: get("PICTURE_SEED_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_FILE)),
        })
    }
}

impl MongoConfig {
    /// Connection string for the driver. Credentials are only embedded when
    /// both username and password are present.
    pub fn connection_uri(&self) -> Secret<String> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Secret::new(format!(
                "mongodb://{}:{}@{}:{}/{}?authSource={}",
                urlencoding::encode(username),
                urlencoding::encode(password.expose_secret()),
                self.host,
                self.port,
                self.initial_database.as_deref().unwrap_or_default(),
                AUTH_SOURCE,
            )),
            _ => Secret::new(self.plain_uri()),
        }
    }

    /// Same shape as `connection_uri` with the password masked, for logs.
    pub fn redacted_uri(&self) -> String {
        match (&self.username, &self.password) {
            (Some(username), Some(_)) => format!(
                "mongodb://{}:****@{}:{}/{}?authSource={}",
                urlencoding::encode(username),
                self.host,
                self.port,
                self.initial_database.as_deref().unwrap_or_default(),
                AUTH_SOURCE,
            ),
            _ => self.plain_uri(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    fn plain_uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}
