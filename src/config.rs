use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Base URL the verification links point at, without a trailing slash.
    pub public_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = optional("APP_HOST", "0.0.0.0");
        let port = optional("APP_PORT", "3000")
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;
        let database_url = required("DATABASE_URL")?;
        let public_url = optional("PUBLIC_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: optional("JWT_ISSUER", "codec"),
            audience: optional("JWT_AUDIENCE", "codec-users"),
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(8),
        };
        let mail = MailConfig {
            api_url: optional("MAIL_API_URL", "https://api.brevo.com/v3/smtp/email"),
            api_key: required("MAIL_API_KEY")?,
            sender_email: required("MAIL_SENDER_EMAIL")?,
            sender_name: optional("MAIL_SENDER_NAME", "Codec App"),
        };
        let ai = AiConfig {
            api_key: required("COHERE_API_KEY")?,
            base_url: optional("COHERE_BASE_URL", "https://api.cohere.com/v2/chat"),
            model: optional("COHERE_MODEL", "command-a-03-2025"),
        };
        Ok(Self {
            host,
            port,
            database_url,
            public_url,
            jwt,
            mail,
            ai,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    let value = std::env::var(key).with_context(|| format!("{key} is required"))?;
    let value = value.trim().to_string();
    anyhow::ensure!(!value.is_empty(), "{key} is required");
    Ok(value)
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.into())
}
