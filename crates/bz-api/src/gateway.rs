//! # RequestGateway
//!
//! Performs one HTTP call against the backend. Attaches the bearer credential
//! when the session holds one, always reads the body as text and hands it to
//! the envelope decoder. Nothing escapes as a panic or a raw `reqwest::Error`.

use std::sync::Arc;

use bz_core::envelope;
use bz_core::{ClientError, ErrorKind, RefreshGrant, Result, SessionStore, Upload};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Request payload. Kept owned so a request can be replayed after a token
/// refresh.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// Sent as multipart form data under the `file` field.
    File(Upload),
}

impl Body {
    pub fn json<T: Serialize>(payload: &T) -> Result<Self> {
        serde_json::to_value(payload)
            .map(Body::Json)
            .map_err(|err| ClientError::transport(format!("could not encode request: {err}"), None))
    }
}

pub struct RequestGateway {
    client: reqwest::Client,
    api_root: String,
    session: Arc<SessionStore>,
}

impl RequestGateway {
    /// * `api_root` - Base URL including the API prefix, e.g. `http://host/api`.
    pub fn new(api_root: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self::with_client(reqwest::Client::new(), api_root, session)
    }

    /// Reuses a preconfigured client (timeouts, proxies).
    pub fn with_client(
        client: reqwest::Client,
        api_root: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        let api_root = api_root.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_root,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Issues the call. An `expired_token` rejection triggers one refresh and
    /// one replay when a refresh token is stored.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<T> {
        let first = self
            .send(method.clone(), path, query, &body, self.session.access_token())
            .await;

        match first {
            Err(err) if err.is_expired_token() => match self.refresh().await {
                Some(token) => self.send(method, path, query, &body, Some(token)).await,
                None => Err(err),
            },
            other => other,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, &[], Body::Empty).await
    }

    pub async fn get_with<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.request(Method::GET, path, query, Body::Empty).await
    }

    pub async fn post<T: DeserializeOwned, P: Serialize>(&self, path: &str, payload: &P) -> Result<T> {
        self.request(Method::POST, path, &[], Body::json(payload)?).await
    }

    pub async fn put<T: DeserializeOwned, P: Serialize>(&self, path: &str, payload: &P) -> Result<T> {
        self.request(Method::PUT, path, &[], Body::json(payload)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, &[], Body::Empty).await
    }

    pub async fn upload<T: DeserializeOwned>(&self, path: &str, file: Upload) -> Result<T> {
        self.request(Method::POST, path, &[], Body::File(file)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: &Body,
        token: Option<SecretString>,
    ) -> Result<T> {
        tracing::debug!(%method, path, authenticated = token.is_some(), "backend request");

        let mut builder = self
            .client
            .request(method.clone(), format!("{}{}", self.api_root, path))
            .query(query);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::File(upload) => {
                let part = Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.content_type)
                    .map_err(|_| {
                        ClientError::invalid(
                            "file",
                            format!("Unsupported file type: {}", upload.content_type),
                        )
                    })?;
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder.send().await.map_err(|err| {
            tracing::warn!(%method, path, error = %err, "backend unreachable");
            ClientError::transport(err.to_string(), None)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| {
            tracing::warn!(%method, path, status, error = %err, "response body unreadable");
            ClientError::transport(err.to_string(), Some(status))
        })?;

        let decoded = envelope::decode(status, &text);
        if let Err(err) = &decoded {
            if err.kind() == ErrorKind::Transport {
                tracing::warn!(%method, path, status, "malformed response body");
            }
        }
        decoded
    }

    /// Exchanges the stored refresh token for a new access token.
    async fn refresh(&self) -> Option<SecretString> {
        let refresh_token = self.session.refresh_token()?;
        let grant: RefreshGrant = match self
            .send(Method::POST, "/auth/refresh", &[], &Body::Empty, Some(refresh_token))
            .await
        {
            Ok(grant) => grant,
            Err(err) => {
                tracing::info!(error = %err, "token refresh rejected");
                return None;
            }
        };

        let token = SecretString::from(grant.access_token);
        if let Err(err) = self
            .session
            .replace_access_token(SecretString::from(token.expose_secret().to_owned()))
        {
            tracing::warn!(error = %err, "could not persist refreshed token");
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use bz_core::{Identity, MemoryStore, Role};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Seen {
        auth: Arc<Mutex<Vec<Option<String>>>>,
    }

    async fn echo_auth(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        seen.auth.lock().unwrap().push(auth);
        Json(json!({"status": "ok", "data": []}))
    }

    async fn html_error() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "<h1>Internal Server Error</h1>")
    }

    async fn expiring(headers: HeaderMap) -> impl IntoResponse {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        if auth == Some("Bearer fresh") {
            (StatusCode::OK, Json(json!({"status": "ok", "data": {"who": "me"}})))
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "error": {"code": "expired_token", "message": "Token has expired"}})),
            )
        }
    }

    async fn refresh(headers: HeaderMap) -> impl IntoResponse {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
        if auth == Some("Bearer refresh-1") {
            (StatusCode::OK, Json(json!({"status": "ok", "data": {"accessToken": "fresh"}})))
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"status": "error", "error": {"code": "invalid_token", "message": "Invalid or expired token"}})),
            )
        }
    }

    async fn serve(seen: Seen) -> String {
        let app = Router::new()
            .route("/api/ads", get(echo_auth))
            .route("/api/broken", get(html_error))
            .route("/api/me", get(expiring))
            .route("/api/auth/refresh", post(refresh))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn session() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(Arc::new(MemoryStore::new())))
    }

    fn login(session: &SessionStore, token: &str) {
        let who = Identity {
            user_id: uuid::Uuid::new_v4(),
            username: "kate".into(),
            role: Role::User,
        };
        session
            .set_session(SecretString::from(token.to_string()), Some(who))
            .unwrap();
    }

    #[tokio::test]
    async fn credential_follows_session() {
        let seen = Seen::default();
        let root = serve(seen.clone()).await;
        let session = session();
        let gateway = RequestGateway::new(root, session.clone());

        let _: Vec<Value> = gateway.get("/ads").await.unwrap();
        login(&session, "abc");
        let _: Vec<Value> = gateway.get("/ads").await.unwrap();
        session.clear_session().unwrap();
        let _: Vec<Value> = gateway.get("/ads").await.unwrap();

        let auth = seen.auth.lock().unwrap().clone();
        assert_eq!(auth, vec![None, Some("Bearer abc".to_string()), None]);
    }

    #[tokio::test]
    async fn non_json_body_becomes_transport_error() {
        let root = serve(Seen::default()).await;
        let gateway = RequestGateway::new(root, session());
        let err = gateway.get::<Value>("/broken").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.message(), "Server error (500)");
    }

    #[tokio::test]
    async fn unreachable_backend_becomes_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let gateway = RequestGateway::new(format!("http://{addr}/api"), session());
        let err = gateway.get::<Value>("/ads").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let root = serve(Seen::default()).await;
        let session = session();
        login(&session, "stale");
        session
            .set_refresh_token(SecretString::from("refresh-1".to_string()))
            .unwrap();
        let gateway = RequestGateway::new(root, session.clone());

        let body: Value = gateway.get("/me").await.unwrap();
        assert_eq!(body["who"], "me");
        assert_eq!(session.access_token().unwrap().expose_secret(), "fresh");
    }

    #[tokio::test]
    async fn failed_refresh_returns_original_error() {
        let root = serve(Seen::default()).await;
        let session = session();
        login(&session, "stale");
        session
            .set_refresh_token(SecretString::from("revoked".to_string()))
            .unwrap();
        let gateway = RequestGateway::new(root, session.clone());

        let err = gateway.get::<Value>("/me").await.unwrap_err();
        assert!(err.is_expired_token());
        assert_eq!(session.access_token().unwrap().expose_secret(), "stale");
    }
}
