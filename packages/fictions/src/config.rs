use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub attachments_dir: String,
    pub fictions: FictionsConfig,
}

/// Domain tuning passed into the dependency container.
#[derive(Debug, Clone, PartialEq)]
pub struct FictionsConfig {
    /// Application name used in global ids (`gid://{app_name}/Fiction/1`).
    pub app_name: String,
    /// Base of mention links and of the URLs recognized as mentions.
    pub public_base_url: String,
    /// Minimum trigram similarity for the similar-fictions lookup.
    pub similarity_threshold: f64,
    pub similarity_limit: i64,
    /// Prefix of computed references (`FIC-FICT-2024-05-12`).
    pub reference_prefix: String,
}

impl Default for FictionsConfig {
    fn default() -> Self {
        Self {
            app_name: "fictions-app".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            similarity_threshold: 0.25,
            similarity_limit: 10,
            reference_prefix: "FIC".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = FictionsConfig::default();

        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url);
        let parsed = Url::parse(&public_base_url)
            .with_context(|| format!("PUBLIC_BASE_URL is not a valid URL: {}", public_base_url))?;
        if parsed.cannot_be_a_base() {
            anyhow::bail!("PUBLIC_BASE_URL must be an absolute http(s) URL");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "fictions".to_string()),
            attachments_dir: env::var("ATTACHMENTS_DIR")
                .unwrap_or_else(|_| "./storage".to_string()),
            fictions: FictionsConfig {
                app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
                similarity_threshold: match env::var("SIMILARITY_THRESHOLD") {
                    Ok(value) => value
                        .parse()
                        .context("SIMILARITY_THRESHOLD must be a number")?,
                    Err(_) => defaults.similarity_threshold,
                },
                similarity_limit: match env::var("SIMILARITY_LIMIT") {
                    Ok(value) => value
                        .parse()
                        .context("SIMILARITY_LIMIT must be a valid number")?,
                    Err(_) => defaults.similarity_limit,
                },
                reference_prefix: env::var("REFERENCE_PREFIX")
                    .unwrap_or(defaults.reference_prefix),
            },
        })
    }
}
