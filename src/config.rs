use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub verify_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub admin_seed: Option<AdminSeedConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        // Operator-supplied secret only. A baked-in fallback would let anyone
        // forge tokens, so startup fails instead.
        let secret =
            std::env::var("JWT_SECRET").context("JWT_SECRET must be set; refusing to start")?;
        if secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 bytes");
        }

        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "aurikrex".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "aurikrex-users".into()),
            access_ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(120),
            verify_ttl_minutes: std::env::var("JWT_VERIFY_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };

        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL").ok(),
            api_token: std::env::var("MAIL_API_TOKEN").ok(),
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@aurikrex.academy".into()),
        };

        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
            bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
            access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
            secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        let admin_seed = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(AdminSeedConfig { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database_url,
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            jwt,
            mail,
            storage,
            admin_seed,
        })
    }
}
