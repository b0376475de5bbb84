use serde::Deserialize;
use std::env;
use std::time::Duration;

use url::Url;

use crate::constants::DEFAULT_TABLE_SHEET_ADDRESS;
use crate::integrations::headless::HeadlessJwt;
use crate::models::address::Address;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Headless state service
    pub headless_endpoint: String,
    pub headless_jwt_issuer: Option<String>,
    pub headless_jwt_secret: Option<String>,
    pub headless_timeout_secs: u64,

    // Rule tables
    pub table_sheet_address: String,

    // Requests
    pub request_timeout_secs: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            headless_endpoint: env::var("HEADLESS_ENDPOINT")?,
            headless_jwt_issuer: env::var("HEADLESS_JWT_ISSUER").ok().filter(|s| !s.is_empty()),
            headless_jwt_secret: env::var("HEADLESS_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            headless_timeout_secs: env::var("HEADLESS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            table_sheet_address: env::var("TABLE_SHEET_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_TABLE_SHEET_ADDRESS.to_string()),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.headless_endpoint.trim().is_empty() {
            anyhow::bail!("HEADLESS_ENDPOINT is empty");
        }
        let endpoint = Url::parse(self.headless_endpoint.trim())?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            anyhow::bail!("HEADLESS_ENDPOINT must be an http(s) URL");
        }
        if self.headless_jwt_issuer.is_some() != self.headless_jwt_secret.is_some() {
            anyhow::bail!("HEADLESS_JWT_ISSUER and HEADLESS_JWT_SECRET must be set together");
        }
        if self.headless_timeout_secs == 0 || self.request_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be > 0");
        }
        self.table_sheet_root()?;

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }
        if self.headless_jwt_secret.is_none() && !self.is_development() {
            tracing::warn!("Headless requests are sent without a bearer token");
        }

        Ok(())
    }

    pub fn table_sheet_root(&self) -> anyhow::Result<Address> {
        self.table_sheet_address
            .parse()
            .map_err(|e| anyhow::anyhow!("TABLE_SHEET_ADDRESS: {}", e))
    }

    pub fn headless_jwt(&self) -> Option<HeadlessJwt> {
        match (&self.headless_jwt_issuer, &self.headless_jwt_secret) {
            (Some(issuer), Some(secret)) => Some(HeadlessJwt {
                issuer: issuer.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        }
    }

    pub fn headless_timeout(&self) -> Duration {
        Duration::from_secs(self.headless_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }
}
