use async_trait::async_trait;
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{AuthClientError, Session, SessionResolver};

const GET_SESSION_PATH: &str = "/api/auth/get-session";
const SIGN_OUT_PATH: &str = "/api/auth/sign-out";

/// Talks to the auth provider's session endpoints, forwarding the caller's
/// `cookie` and `authorization` headers.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, AuthClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn forward(
        &self,
        builder: reqwest::RequestBuilder,
        headers: &HeaderMap,
    ) -> reqwest::RequestBuilder {
        forwarded_credentials(headers)
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value))
    }
}

#[async_trait]
impl SessionResolver for AuthClient {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthClientError> {
        if forwarded_credentials(headers).is_empty() {
            return Ok(None);
        }

        let request = self.client.get(format!("{}{}", self.base_url, GET_SESSION_PATH));
        let response = self.forward(request, headers).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let session = parse_session_body(&body)?;
        debug!(signed_in = session.is_some(), "Resolved session");
        Ok(session)
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<Vec<String>, AuthClientError> {
        let request = self.client.post(format!("{}{}", self.base_url, SIGN_OUT_PATH));
        let response = self.forward(request, headers).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect())
    }
}

/// The caller credentials worth forwarding to the auth provider.
fn forwarded_credentials(headers: &HeaderMap) -> Vec<(&'static str, String)> {
    [("cookie", COOKIE), ("authorization", AUTHORIZATION)]
        .into_iter()
        .filter_map(|(name, header)| {
            headers
                .get(header)
                .and_then(|v| v.to_str().ok())
                .map(|v| (name, v.to_string()))
        })
        .collect()
}

/// An empty body or JSON `null` means no session.
fn parse_session_body(body: &str) -> Result<Option<Session>, AuthClientError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<Session>>(body)?)
}
