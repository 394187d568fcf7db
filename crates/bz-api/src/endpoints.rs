//! Typed facade over the marketplace REST endpoints.
//!
//! One method per backend operation; all of them go through the
//! [`RequestGateway`] and return `Result<T, ClientError>`.

use std::sync::Arc;

use bz_core::{
    Ad, AdDraft, AdPatch, AdQuery, AdStatus, Category, CategoryDraft, Conversation, Created,
    LoginGrant, Media, Message, Report, ReportStatus, ReportUpdate, Result, SessionStore, Upload,
    User, UserUpdate,
};
use serde::de::IgnoredAny;
use serde_json::json;
use uuid::Uuid;

use crate::gateway::RequestGateway;

pub struct MarketApi {
    gateway: RequestGateway,
}

impl MarketApi {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.gateway.session()
    }

    // ---- auth ----

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        self.gateway
            .post("/auth/login", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.gateway
            .post(
                "/auth/register",
                &json!({ "username": username, "email": email, "password": password }),
            )
            .await
    }

    // ---- ads ----

    pub async fn list_ads(&self, query: &AdQuery) -> Result<Vec<Ad>> {
        self.gateway.get_with("/ads", &query.to_pairs()).await
    }

    pub async fn get_ad(&self, id: Uuid) -> Result<Ad> {
        self.gateway.get(&format!("/ads/{id}")).await
    }

    pub async fn create_ad(&self, draft: &AdDraft) -> Result<Created> {
        self.gateway.post("/ads", draft).await
    }

    pub async fn update_ad(&self, id: Uuid, draft: &AdDraft) -> Result<Created> {
        self.gateway.put(&format!("/ads/{id}"), draft).await
    }

    /// Close or reopen without touching the other fields.
    pub async fn set_ad_status(&self, id: Uuid, status: AdStatus) -> Result<Created> {
        self.gateway
            .put(&format!("/ads/{id}"), &AdPatch { status })
            .await
    }

    pub async fn delete_ad(&self, id: Uuid) -> Result<()> {
        self.gateway
            .delete::<IgnoredAny>(&format!("/ads/{id}"))
            .await
            .map(drop)
    }

    pub async fn list_media(&self, ad_id: Uuid) -> Result<Vec<Media>> {
        self.gateway.get(&format!("/ads/{ad_id}/media")).await
    }

    pub async fn upload_media(&self, ad_id: Uuid, file: Upload) -> Result<Media> {
        self.gateway
            .upload(&format!("/ads/{ad_id}/media"), file)
            .await
    }

    pub async fn delete_media(&self, id: Uuid) -> Result<()> {
        self.gateway
            .delete::<IgnoredAny>(&format!("/media/{id}"))
            .await
            .map(drop)
    }

    // ---- categories ----

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.gateway.get("/categories").await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Created> {
        self.gateway.post("/categories", draft).await
    }

    pub async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> Result<Created> {
        self.gateway.put(&format!("/categories/{id}"), draft).await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        self.gateway
            .delete::<IgnoredAny>(&format!("/categories/{id}"))
            .await
            .map(drop)
    }

    // ---- conversations ----

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.gateway.get("/conversations").await
    }

    /// Creates the conversation or returns the existing one for this ad and
    /// partner.
    pub async fn open_conversation(&self, ad_id: Uuid, partner_id: Uuid) -> Result<Created> {
        self.gateway
            .post(
                "/conversations",
                &json!({ "adId": ad_id, "partnerId": partner_id }),
            )
            .await
    }

    /// History in send order (oldest first).
    pub async fn messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.gateway
            .get(&format!("/conversations/{conversation_id}/messages"))
            .await
    }

    pub async fn send_message(&self, conversation_id: Uuid, text: &str) -> Result<Created> {
        self.gateway
            .post(
                &format!("/conversations/{conversation_id}/messages"),
                &json!({ "text": text }),
            )
            .await
    }

    // ---- reports ----

    pub async fn create_report(&self, ad_id: Uuid, reason: &str) -> Result<Created> {
        self.gateway
            .post("/reports", &json!({ "adId": ad_id, "reason": reason }))
            .await
    }

    /// Without a status filter the backend returns every unresolved report.
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let query: Vec<(&str, String)> = status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default();
        self.gateway.get_with("/reports", &query).await
    }

    pub async fn update_report(&self, id: Uuid, update: &ReportUpdate) -> Result<()> {
        self.gateway
            .put::<IgnoredAny, _>(&format!("/reports/{id}"), update)
            .await
            .map(drop)
    }

    // ---- users ----

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.gateway.get("/users").await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.gateway.get(&format!("/users/{id}")).await
    }

    pub async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User> {
        self.gateway.put(&format!("/users/{id}"), update).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.gateway
            .delete::<IgnoredAny>(&format!("/users/{id}"))
            .await
            .map(drop)
    }
}
