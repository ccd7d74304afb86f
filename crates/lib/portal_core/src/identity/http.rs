//! HTTP implementation of [`IdentityProvider`].
//!
//! Targets the identity service's REST surface. Admin endpoints live under
//! `/admin` and require the service key; session endpoints authenticate with
//! the anon key plus the user's Bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{IdentityError, IdentityProvider, IdentitySession, IdentityUser};

/// How many accounts a single admin listing page may carry. The portal's
/// user population fits in one page.
const ADMIN_LIST_PAGE_SIZE: u32 = 1000;

/// Connection settings for the identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity service, e.g. `https://auth.example.com/auth/v1/`.
    pub base_url: Url,
    /// Privileged key for `/admin` operations. Never sent to browsers.
    pub service_key: String,
    /// Public key identifying this application on session operations.
    pub anon_key: String,
}

/// Reqwest-backed identity client.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    config: IdentityConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    email: String,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct AdminUserList {
    users: Vec<UserBody>,
}

/// Error payload shapes the provider is known to emit.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl HttpIdentityClient {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| IdentityError::Decode(format!("bad endpoint {path}: {e}")))
    }

    /// Admin request: service key in both `apikey` and `Authorization`.
    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// Session request: anon key plus the caller's own token.
    fn session(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
    }

    /// Decode the provider's error body into a service error, preserving the
    /// provider's message verbatim.
    async fn service_error(response: Response) -> IdentityError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body
                .msg
                .or(body.message)
                .or(body.error_description)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        if status == StatusCode::NOT_FOUND || message.eq_ignore_ascii_case("user not found") {
            return IdentityError::NotFound;
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return IdentityError::Unauthorized(message);
        }
        IdentityError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let url = self.endpoint("user")?;
        let response = self
            .session(self.client.get(url), access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        let body: UserBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(IdentityUser {
            id: body.id,
            email: body.email,
        })
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        let body: SessionBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(IdentitySession {
            access_token: body.access_token,
            user: IdentityUser {
                id: body.user.id,
                email: body.user.email,
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.endpoint("logout")?;
        let response = self
            .session(self.client.post(url), access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityUser>, IdentityError> {
        let mut url = self.endpoint("admin/users")?;
        url.query_pairs_mut()
            .append_pair("per_page", &ADMIN_LIST_PAGE_SIZE.to_string());
        let response = self.admin(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        let body: AdminUserList = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(body
            .users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| IdentityUser {
                id: u.id,
                email: u.email,
            }))
    }

    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<IdentityUser, IdentityError> {
        debug!(%email, "inviting account via identity provider");
        let mut url = self.endpoint("invite")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        let response = self
            .admin(self.client.post(url))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        let body: UserBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(IdentityUser {
            id: body.id,
            email: body.email,
        })
    }

    async fn generate_recovery_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        let url = self.endpoint("admin/generate_link")?;
        let response = self
            .admin(self.client.post(url))
            .json(&json!({
                "type": "recovery",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        let mut url = self.endpoint("recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let url = self.endpoint("user")?;
        let response = self
            .session(self.client.put(url), access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        debug!(%user_id, "deleting identity account");
        let url = self.endpoint(&format!("admin/users/{user_id}"))?;
        let response = self.admin(self.client.delete(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }
        Ok(())
    }
}
