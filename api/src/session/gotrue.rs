/// GoTrue-compatible auth client
///
/// Talks to `{backend.url}/auth/v1` with the project's anon key. Nothing is retried.
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use super::{AuthError, AuthService, AuthUser, Session, SignUpOutcome};
use crate::config::BackendConfig;

pub struct GoTrueClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    email_redirect_to: Option<String>,
}

impl GoTrueClient {
    pub fn new(config: &BackendConfig) -> Result<Self, AuthError> {
        let http_client = HttpClient::builder()
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.anon_key.clone(),
            email_redirect_to: config.email_redirect_to.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}/auth/v1/{}", self.base_url, path))
            .header("apikey", &self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// Turn an error response into an `AuthError`, keeping the service's wording
    async fn rejection(response: Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                ["msg", "error_description", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        if status.is_server_error() {
            tracing::warn!(status = %status, message = %message, "Auth service error");
            AuthError::Transport(message)
        } else {
            AuthError::Rejected(message)
        }
    }

    async fn session_from(response: Response) -> Result<Session, AuthError> {
        response
            .json::<Session>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AuthService for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let path = match &self.email_redirect_to {
            Some(redirect) => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("redirect_to", redirect)
                    .finish();
                format!("signup?{}", query)
            }
            None => "signup".to_string(),
        };

        let response = self
            .send(
                self.request(Method::POST, &path)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        // With email confirmation on, the service answers with the bare user
        if body.get("access_token").is_some() {
            let session: Session =
                serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
            Ok(SignUpOutcome::SignedIn(session))
        } else {
            let email = body
                .get("email")
                .and_then(|e| e.as_str())
                .unwrap_or(email)
                .to_string();
            Ok(SignUpOutcome::VerificationPending { email })
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .send(
                self.request(Method::POST, "token?grant_type=password")
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        Self::session_from(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.send(self.request(Method::POST, "logout").bearer_auth(access_token))
            .await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .send(
                self.request(Method::POST, "token?grant_type=refresh_token")
                    .json(&json!({ "refresh_token": refresh_token })),
            )
            .await?;
        Self::session_from(response).await
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let response = self
            .request(Method::GET, "user")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => response
                .json::<AuthUser>()
                .await
                .map(Some)
                .map_err(|e| AuthError::Decode(e.to_string())),
            _ => Err(Self::rejection(response).await),
        }
    }

    async fn verify_email(&self, email: &str, token: &str) -> Result<Session, AuthError> {
        let response = self
            .send(self.request(Method::POST, "verify").json(&json!({
                "type": "signup",
                "email": email,
                "token": token,
            })))
            .await?;
        Self::session_from(response).await
    }
}
