use gloo_net::http::{Method, Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::config;
use crate::plans::models::{SignInRequest, SignInResponse};
use crate::session::Session;

/// Thin wrapper over the managed backend's REST, RPC and function endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    session: Option<Session>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, session: Option<Session>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            session,
        }
    }

    pub fn from_session(session: Option<Session>) -> Self {
        Self::new(config::get_backend_url(), config::get_anon_key(), session)
    }

    fn request(&self, method: Method, path: &str) -> Request {
        let bearer = match &self.session {
            Some(session) => session.access_token.as_str(),
            None => self.anon_key.as_str(),
        };
        Request::new(&format!("{}{}", self.base_url, path))
            .method(method)
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
    }

    async fn send_json<B: Serialize>(request: Request, body: Option<&B>) -> Result<Response, ApiError> {
        let request = match body {
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|e| ApiError::Serialize(e.to_string()))?;
                request.body(payload)
            }
            None => request,
        };
        let response = request.send().await?;
        check_status(response).await
    }

    pub async fn rest_get<T: DeserializeOwned>(&self, table: &str, query: &str) -> Result<Vec<T>, ApiError> {
        let request = self.request(Method::GET, &format!("/rest/v1/{}?{}", table, query));
        let response = Self::send_json::<()>(request, None).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    pub async fn rest_patch<B: Serialize>(&self, table: &str, query: &str, body: &B) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, &format!("/rest/v1/{}?{}", table, query))
            .header("Prefer", "return=minimal");
        Self::send_json(request, Some(body)).await?;
        Ok(())
    }

    /// Calls a stored procedure. The response body is discarded.
    pub async fn rpc<B: Serialize>(&self, procedure: &str, args: &B) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/rest/v1/rpc/{}", procedure));
        Self::send_json(request, Some(args)).await?;
        Ok(())
    }

    pub async fn invoke<B: Serialize, T: DeserializeOwned>(&self, function: &str, body: &B) -> Result<T, ApiError> {
        let request = self.request(Method::POST, &format!("/functions/v1/{}", function));
        let response = Self::send_json(request, Some(body)).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let request = self.request(Method::POST, "/auth/v1/token?grant_type=password");
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = Self::send_json(request, Some(&body)).await?;
        let signed_in = response.json::<SignInResponse>().await?;
        Ok(Session {
            access_token: signed_in.access_token,
            user_id: signed_in.user.id,
            email: signed_in.user.email.unwrap_or_else(|| email.to_string()),
        })
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    if status == 401 {
        return Err(ApiError::Unauthorized);
    }
    let status_text = response.status_text();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_message(&body, status_text),
    })
}

/// Picks the human readable part out of an error body. REST errors carry
/// `message`, functions usually `error`, auth `error_description`.
pub fn error_message(body: &str, fallback: String) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "error", "msg"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    if body.trim().is_empty() {
        fallback
    } else {
        body.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            error_message(r#"{"message":"permission denied","code":"42501"}"#, "Forbidden".to_string()),
            "permission denied"
        );
        assert_eq!(
            error_message(r#"{"error":"plan not found"}"#, "Bad Request".to_string()),
            "plan not found"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        assert_eq!(error_message("", "Bad Gateway".to_string()), "Bad Gateway");
        assert_eq!(error_message("upstream down", "Bad Gateway".to_string()), "upstream down");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BackendClient::new("https://example.test/", "anon", None);
        assert_eq!(client.base_url, "https://example.test");
        assert_eq!(client.anon_key, "anon");
    }
}
