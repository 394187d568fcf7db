//! # Domain Models
//!
//! Client-side projections of the entities owned by the marketplace backend.
//! Nothing here is cached beyond the view that fetched it.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role as issued by the backend at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Admins and moderators share the moderation surface.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when a stored or submitted string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Active,
    Closed,
    /// Set by moderation when a report is resolved with blocking.
    Banned,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Active => "active",
            AdStatus::Closed => "closed",
            AdStatus::Banned => "banned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    New,
    Reviewing,
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::New,
        ReportStatus::Reviewing,
        ReportStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::New => "new",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ReportStatus::New),
            "reviewing" => Ok(ReportStatus::Reviewing),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// An ad as returned by the list and detail endpoints.
///
/// The list endpoint omits the description, category and timestamp, so those
/// are optional here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub author_id: Uuid,
    pub author_username: Option<String>,
    pub status: AdStatus,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Create/update payload for the core fields of an ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Status-only update used to close or reopen an ad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdPatch {
    pub status: AdStatus,
}

/// Filters accepted by `GET /ads`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdQuery {
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AdQuery {
    /// Query-string pairs in the backend's parameter names.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("query", q.to_string()));
        }
        if let Some(id) = self.category_id {
            pairs.push(("categoryId", id.to_string()));
        }
        if let Some(id) = self.author_id {
            pairs.push(("authorId", id.to_string()));
        }
        if let Some(p) = self.price_from {
            pairs.push(("price_from", p.to_string()));
        }
        if let Some(p) = self.price_to {
            pairs.push(("price_to", p.to_string()));
        }
        if let Some(n) = self.limit {
            pairs.push(("limit", n.to_string()));
        }
        if let Some(n) = self.offset {
            pairs.push(("offset", n.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub ad_id: Option<Uuid>,
    pub ad_title: Option<String>,
    pub partner_id: Option<Uuid>,
    pub partner_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_username: Option<String>,
    pub text: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub ad_id: Option<Uuid>,
    pub ad_title: Option<String>,
    pub reporter_id: Option<Uuid>,
    pub reporter_username: Option<String>,
    #[serde(default)]
    pub reason: String,
    pub status: ReportStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportUpdate {
    pub status: ReportStatus,
    pub block_ad: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Admin/self edit of a user. `role` is only honoured by the backend for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Payload of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

/// Payload of `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshGrant {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Minimal body returned by create endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// A file picked for upload alongside an ad.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}
