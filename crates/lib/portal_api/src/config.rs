//! API server configuration.

use url::Url;

use portal_core::identity::http::IdentityConfig;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3400").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Identity service connection settings.
    pub identity: IdentityConfig,
    /// Public base URL of the portal, used to build the recovery redirect
    /// the identity provider embeds in its emails.
    pub app_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                                |
    /// |------------------------|----------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3400`                       |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/portal`     |
    /// | `IDENTITY_URL`         | `http://localhost:9999/auth/v1/`       |
    /// | `IDENTITY_SERVICE_KEY` | (empty — admin calls will be rejected) |
    /// | `IDENTITY_ANON_KEY`    | (empty)                                |
    /// | `APP_URL`              | `http://localhost:3000`                |
    pub fn from_env() -> Self {
        let base_url = std::env::var("IDENTITY_URL")
            .ok()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| {
                Url::parse("http://localhost:9999/auth/v1/").expect("static url")
            });
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3400".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/portal".into()),
            identity: IdentityConfig {
                base_url,
                service_key: std::env::var("IDENTITY_SERVICE_KEY").unwrap_or_default(),
                anon_key: std::env::var("IDENTITY_ANON_KEY").unwrap_or_default(),
            },
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
        }
    }

    /// The redirect target embedded in invite and recovery emails.
    pub fn recovery_redirect(&self) -> String {
        format!("{}/auth/reset-password", self.app_url.trim_end_matches('/'))
    }
}
