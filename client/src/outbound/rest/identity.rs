//! Reqwest-backed identity gateway for the hosted identity toolkit.
//!
//! This adapter owns transport details only: request serialisation, HTTP
//! error mapping and session bookkeeping. Sign-out is local; the toolkit has
//! no server-side session to end.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use super::dto::{AuthResponseDto, OobCodeRequestDto, PasswordRequestDto, error_message};
use super::session::RestSession;
use super::{body_preview, join_segments};
use crate::domain::IdentityId;
use crate::domain::ports::{
    IdentityChangeHandler, IdentityGateway, IdentityGatewayError, Subscription,
};

const PASSWORD_RESET_REQUEST: &str = "PASSWORD_RESET";

/// Identity gateway speaking the `v1/accounts:*` REST API.
pub struct RestIdentityGateway {
    client: Client,
    base_url: Url,
    api_key: String,
    session: Arc<RestSession>,
}

impl RestIdentityGateway {
    pub(crate) fn new(
        client: Client,
        base_url: Url,
        api_key: String,
        session: Arc<RestSession>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            session,
        }
    }

    /// Number of live identity-change registrations.
    pub fn active_subscriptions(&self) -> usize {
        self.session.active_listeners()
    }

    fn endpoint(&self, action: &str) -> Result<Url, IdentityGatewayError> {
        let operation = format!("accounts:{action}");
        let mut url = join_segments(&self.base_url, &["v1", operation.as_str()])
            .ok_or_else(|| IdentityGatewayError::transport("identity base URL cannot be joined"))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        action: &str,
        body: &B,
    ) -> Result<Vec<u8>, IdentityGatewayError> {
        let response = self
            .client
            .post(self.endpoint(action)?)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    async fn authenticate(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        let request = PasswordRequestDto {
            email,
            password,
            return_secure_token: true,
        };
        let body = self.post(action, &request).await?;
        let decoded: AuthResponseDto = serde_json::from_slice(&body).map_err(|error| {
            IdentityGatewayError::decode(format!("invalid auth response: {error}"))
        })?;
        let identity = IdentityId::new(decoded.local_id)
            .map_err(|error| IdentityGatewayError::decode(format!("localId: {error}")))?;
        self.session.establish(identity.clone(), decoded.id_token);
        Ok(identity)
    }
}

#[async_trait]
impl IdentityGateway for RestIdentityGateway {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        self.authenticate("signUp", email, password).await
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, IdentityGatewayError> {
        self.authenticate("signInWithPassword", email, password).await
    }

    async fn send_reset(&self, email: &str) -> Result<(), IdentityGatewayError> {
        let request = OobCodeRequestDto {
            request_type: PASSWORD_RESET_REQUEST,
            email,
        };
        self.post("sendOobCode", &request).await.map(drop)
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        self.session.clear();
        Ok(())
    }

    fn on_identity_change(&self, handler: IdentityChangeHandler) -> Subscription {
        self.session.subscribe(handler)
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityGatewayError {
    IdentityGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityGatewayError {
    if status.is_client_error() {
        let message = error_message(body)
            .unwrap_or_else(|| format!("status {}: {}", status.as_u16(), body_preview(body)));
        IdentityGatewayError::rejected(message)
    } else {
        IdentityGatewayError::transport(format!(
            "status {}: {}",
            status.as_u16(),
            body_preview(body)
        ))
    }
}
