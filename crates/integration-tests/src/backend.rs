//! In-process marketplace backend speaking the same envelope and routes as
//! the real one. State lives behind one mutex so tests can seed it and
//! inspect it after the controller has run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bz_core::{Ad, AdDraft, AdStatus, Category, CategoryDraft, Conversation, Media, Message, Report, ReportStatus, Role, User};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const PASSWORD: &str = "secret";

type Reply = (StatusCode, Json<Value>);
type Handled = Result<Reply, Reply>;

fn ok(data: impl Serialize) -> Handled {
    Ok((StatusCode::OK, Json(json!({ "status": "ok", "data": data }))))
}

fn created(id: Uuid) -> Handled {
    Ok((StatusCode::CREATED, Json(json!({ "status": "ok", "data": { "id": id } }))))
}

fn fail(status: StatusCode, code: &str, message: &str) -> Reply {
    (
        status,
        Json(json!({ "status": "error", "error": { "code": code, "message": message } })),
    )
}

fn forbidden() -> Reply {
    fail(StatusCode::FORBIDDEN, "forbidden", "Insufficient permissions")
}

fn invalid(message: &str) -> Reply {
    fail(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", message)
}

fn not_found(what: &str) -> Reply {
    fail(StatusCode::NOT_FOUND, "not_found", &format!("{what} not found"))
}

fn text_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn uuid_field(body: &Value, key: &str) -> Option<Uuid> {
    body.get(key).and_then(Value::as_str).and_then(|s| s.parse().ok())
}

#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Thread {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub buyer: Uuid,
    pub seller: Uuid,
}

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Default)]
pub struct MarketState {
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, Uuid>,
    pub refresh_tokens: HashMap<String, Uuid>,
    pub ads: Vec<Ad>,
    pub media: Vec<(Uuid, Media)>,
    pub categories: Vec<Category>,
    pub threads: Vec<Thread>,
    pub messages: Vec<(Uuid, Message)>,
    pub reports: Vec<Report>,
    pub requests: Vec<Recorded>,
}

impl MarketState {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }

    fn ad_mut(&mut self, id: Uuid) -> Result<&mut Ad, Reply> {
        self.ads.iter_mut().find(|ad| ad.id == id).ok_or_else(|| not_found("Ad"))
    }

    fn conversation_view(&self, thread: &Thread, me: Uuid) -> Conversation {
        let partner = if thread.buyer == me { thread.seller } else { thread.buyer };
        Conversation {
            id: thread.id,
            ad_id: Some(thread.ad_id),
            ad_title: self.ads.iter().find(|a| a.id == thread.ad_id).map(|a| a.title.clone()),
            partner_id: Some(partner),
            partner_username: self.user(partner).map(|u| u.username.clone()),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeMarket {
    state: Arc<Mutex<MarketState>>,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds an ephemeral port and returns the API root, e.g.
    /// `http://127.0.0.1:41234/api`.
    pub async fn serve(&self) -> String {
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/refresh", post(refresh))
            .route("/ads", get(list_ads).post(create_ad))
            .route("/ads/{id}", get(get_ad).put(update_ad).delete(delete_ad))
            .route("/ads/{id}/media", get(list_media).post(upload_media))
            .route("/media/{id}", delete(delete_media))
            .route("/categories", get(list_categories).post(create_category))
            .route("/categories/{id}", axum::routing::put(update_category).delete(delete_category))
            .route("/conversations", get(list_conversations).post(open_conversation))
            .route("/conversations/{id}/messages", get(list_messages).post(send_message))
            .route("/reports", get(list_reports).post(create_report))
            .route("/reports/{id}", axum::routing::put(update_report))
            .route("/users", get(list_users))
            .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone());
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend stopped");
        });
        format!("http://{addr}/api")
    }

    // ---- seeding ----

    pub fn add_user(&self, username: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@bazaar.test"),
            role,
        };
        self.lock().accounts.push(Account {
            user: user.clone(),
            password: PASSWORD.to_string(),
        });
        user
    }

    pub fn issue_token(&self, user_id: Uuid) -> String {
        let token = format!("access-{}", Uuid::new_v4());
        self.lock().tokens.insert(token.clone(), user_id);
        token
    }

    pub fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parent_id: None,
        };
        self.lock().categories.push(category.clone());
        category
    }

    pub fn add_ad(&self, author: &User, title: &str, category: &Category, status: AdStatus) -> Ad {
        let ad = Ad {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(format!("{title}, barely used")),
            price: 100.0,
            category_id: Some(category.id),
            category_name: Some(category.name.clone()),
            author_id: author.id,
            author_username: Some(author.username.clone()),
            status,
            images: Vec::new(),
            location: None,
            created_at: Some(Utc::now().naive_utc()),
        };
        self.lock().ads.push(ad.clone());
        ad
    }

    pub fn add_report(&self, ad: &Ad, reporter: &User, reason: &str) -> Report {
        let report = Report {
            id: Uuid::new_v4(),
            ad_id: Some(ad.id),
            ad_title: Some(ad.title.clone()),
            reporter_id: Some(reporter.id),
            reporter_username: Some(reporter.username.clone()),
            reason: reason.to_string(),
            status: ReportStatus::New,
        };
        self.lock().reports.push(report.clone());
        report
    }

    // ---- inspection ----

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    /// Requests matching `method` whose path starts with `prefix` (after `/api`).
    pub fn count(&self, method: &str, prefix: &str) -> usize {
        let full = format!("/api{prefix}");
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(&full))
            .count()
    }

    pub fn ad(&self, id: Uuid) -> Option<Ad> {
        self.lock().ads.iter().find(|a| a.id == id).cloned()
    }

    pub fn ads_by(&self, author: Uuid) -> Vec<Ad> {
        self.lock().ads.iter().filter(|a| a.author_id == author).cloned().collect()
    }

    pub fn media_of(&self, ad_id: Uuid) -> Vec<Media> {
        self.lock()
            .media
            .iter()
            .filter(|(owner, _)| *owner == ad_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn report(&self, id: Uuid) -> Option<Report> {
        self.lock().reports.iter().find(|r| r.id == id).cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.lock().user(id).cloned()
    }

    pub fn messages_in(&self, conversation_id: Uuid) -> Vec<Message> {
        self.lock()
            .messages
            .iter()
            .filter(|(c, _)| *c == conversation_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Resolves the bearer token. Without a header the reply mimics the JWT
    /// layer's bare `{"msg": ...}` body instead of the envelope.
    fn caller(&self, headers: &HeaderMap) -> Result<User, Reply> {
        let Some(raw) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "msg": "Missing Authorization Header" })),
            ));
        };
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
        let state = self.lock();
        state
            .tokens
            .get(token)
            .and_then(|id| state.user(*id))
            .cloned()
            .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid or expired token"))
    }

    fn staff(&self, headers: &HeaderMap) -> Result<User, Reply> {
        let user = self.caller(headers)?;
        if user.role.is_staff() {
            Ok(user)
        } else {
            Err(forbidden())
        }
    }

    fn admin(&self, headers: &HeaderMap) -> Result<User, Reply> {
        let user = self.caller(headers)?;
        if user.role == Role::Admin {
            Ok(user)
        } else {
            Err(forbidden())
        }
    }
}

async fn record(State(market): State<FakeMarket>, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    market.lock().requests.push(Recorded {
        method: req.method().to_string(),
        path: req
            .extensions()
            .get::<axum::extract::OriginalUri>()
            .map_or(req.uri().path(), |uri| uri.path())
            .to_string(),
        authorization,
    });
    next.run(req).await
}

// ---- auth ----

async fn login(State(market): State<FakeMarket>, Json(body): Json<Value>) -> Handled {
    let email = text_field(&body, "email");
    let password = text_field(&body, "password");
    let user = market
        .lock()
        .accounts
        .iter()
        .find(|a| a.user.email == email && a.password == password)
        .map(|a| a.user.clone())
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid_credentials", "Invalid email or password"))?;

    let access = market.issue_token(user.id);
    let refresh = format!("refresh-{}", Uuid::new_v4());
    market.lock().refresh_tokens.insert(refresh.clone(), user.id);
    ok(json!({ "accessToken": access, "refreshToken": refresh, "user": user }))
}

async fn register(State(market): State<FakeMarket>, Json(body): Json<Value>) -> Handled {
    let username = text_field(&body, "username").trim().to_string();
    let email = text_field(&body, "email").trim().to_string();
    let password = text_field(&body, "password").to_string();
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(invalid("username, email and password are required"));
    }

    let mut state = market.lock();
    if state
        .accounts
        .iter()
        .any(|a| a.user.email == email || a.user.username == username)
    {
        return Err(fail(StatusCode::CONFLICT, "exists", "User already exists"));
    }
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        role: Role::User,
    };
    state.accounts.push(Account {
        user: user.clone(),
        password,
    });
    Ok((StatusCode::CREATED, Json(json!({ "status": "ok", "data": user }))))
}

async fn refresh(State(market): State<FakeMarket>, headers: HeaderMap) -> Handled {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    let user_id = market
        .lock()
        .refresh_tokens
        .get(&token)
        .copied()
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid or expired token"))?;
    ok(json!({ "accessToken": market.issue_token(user_id) }))
}

// ---- ads ----

/// Public listing shows active ads only, unless filtered by author.
async fn list_ads(State(market): State<FakeMarket>, Query(params): Query<HashMap<String, String>>) -> Handled {
    let needle = params.get("query").map(|q| q.to_lowercase());
    let category: Option<Uuid> = params.get("categoryId").and_then(|v| v.parse().ok());
    let author: Option<Uuid> = params.get("authorId").and_then(|v| v.parse().ok());
    let limit: usize = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);

    let ads: Vec<Ad> = market
        .lock()
        .ads
        .iter()
        .filter(|ad| match author {
            Some(author) => ad.author_id == author,
            None => ad.status == AdStatus::Active,
        })
        .filter(|ad| category.map_or(true, |c| ad.category_id == Some(c)))
        .filter(|ad| {
            needle
                .as_deref()
                .map_or(true, |n| ad.title.to_lowercase().contains(n))
        })
        .take(limit)
        .cloned()
        .collect();
    ok(ads)
}

async fn get_ad(State(market): State<FakeMarket>, Path(id): Path<Uuid>) -> Handled {
    let state = market.lock();
    let ad = state.ads.iter().find(|a| a.id == id).ok_or_else(|| not_found("Ad"))?;
    ok(ad)
}

async fn create_ad(State(market): State<FakeMarket>, headers: HeaderMap, Json(draft): Json<AdDraft>) -> Handled {
    let author = market.caller(&headers)?;
    if draft.title.trim().is_empty() {
        return Err(invalid("Title is required"));
    }
    let mut state = market.lock();
    let category = state
        .categories
        .iter()
        .find(|c| c.id == draft.category_id)
        .cloned()
        .ok_or_else(|| invalid("Unknown category"))?;

    let id = Uuid::new_v4();
    state.ads.push(Ad {
        id,
        title: draft.title,
        description: Some(draft.description),
        price: draft.price,
        category_id: Some(category.id),
        category_name: Some(category.name),
        author_id: author.id,
        author_username: Some(author.username),
        status: AdStatus::Active,
        images: Vec::new(),
        location: draft.location,
        created_at: Some(Utc::now().naive_utc()),
    });
    created(id)
}

/// Accepts either the full draft or a status-only patch.
async fn update_ad(
    State(market): State<FakeMarket>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Handled {
    let caller = market.caller(&headers)?;
    let mut state = market.lock();
    let category_names: HashMap<Uuid, String> =
        state.categories.iter().map(|c| (c.id, c.name.clone())).collect();
    let ad = state.ad_mut(id)?;
    if ad.author_id != caller.id && !caller.role.is_staff() {
        return Err(fail(StatusCode::FORBIDDEN, "forbidden", "Not your ad"));
    }

    if body.get("title").is_some() {
        let draft: AdDraft = serde_json::from_value(body.clone()).map_err(|_| invalid("Malformed ad"))?;
        ad.title = draft.title;
        ad.description = Some(draft.description);
        ad.price = draft.price;
        ad.category_name = category_names.get(&draft.category_id).cloned();
        ad.category_id = Some(draft.category_id);
        ad.location = draft.location;
    }
    if let Some(status) = body.get("status") {
        ad.status = serde_json::from_value(status.clone()).map_err(|_| invalid("Unknown status"))?;
    }
    created(id)
}

async fn delete_ad(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    let caller = market.caller(&headers)?;
    let mut state = market.lock();
    let ad = state.ad_mut(id)?;
    if ad.author_id != caller.id && !caller.role.is_staff() {
        return Err(forbidden());
    }
    state.ads.retain(|a| a.id != id);
    ok(json!({}))
}

async fn list_media(State(market): State<FakeMarket>, Path(ad_id): Path<Uuid>) -> Handled {
    ok(market.media_of(ad_id))
}

/// File names containing `bad` are rejected, to exercise partial failure.
async fn upload_media(
    State(market): State<FakeMarket>,
    Path(ad_id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Handled {
    let caller = market.caller(&headers)?;
    let mut file_name = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| invalid("Malformed upload"))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_owned);
            field.bytes().await.map_err(|_| invalid("Malformed upload"))?;
        }
    }
    let file_name = file_name.ok_or_else(|| invalid("No file"))?;
    if file_name.contains("bad") {
        return Err(invalid("Unsupported file type"));
    }

    let mut state = market.lock();
    let ad = state.ad_mut(ad_id)?;
    if ad.author_id != caller.id {
        return Err(forbidden());
    }
    let media = Media {
        id: Uuid::new_v4(),
        url: format!("/uploads/{file_name}"),
        kind: Some("image".into()),
    };
    ad.images.push(media.url.clone());
    state.media.push((ad_id, media.clone()));
    Ok((StatusCode::CREATED, Json(json!({ "status": "ok", "data": media }))))
}

async fn delete_media(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    market.caller(&headers)?;
    let mut state = market.lock();
    let Some(pos) = state.media.iter().position(|(_, m)| m.id == id) else {
        return Err(not_found("Media"));
    };
    let (ad_id, media) = state.media.remove(pos);
    if let Ok(ad) = state.ad_mut(ad_id) {
        ad.images.retain(|url| *url != media.url);
    }
    ok(json!({}))
}

// ---- categories ----

async fn list_categories(State(market): State<FakeMarket>) -> Handled {
    ok(market.lock().categories.clone())
}

async fn create_category(
    State(market): State<FakeMarket>,
    headers: HeaderMap,
    Json(draft): Json<CategoryDraft>,
) -> Handled {
    market.admin(&headers)?;
    let mut state = market.lock();
    if state.categories.iter().any(|c| c.name == draft.name) {
        return Err(fail(StatusCode::CONFLICT, "exists", "Category already exists"));
    }
    let id = Uuid::new_v4();
    state.categories.push(Category {
        id,
        name: draft.name,
        parent_id: draft.parent_id,
    });
    created(id)
}

async fn update_category(
    State(market): State<FakeMarket>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(draft): Json<CategoryDraft>,
) -> Handled {
    market.admin(&headers)?;
    let mut state = market.lock();
    let category = state
        .categories
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| not_found("Category"))?;
    category.name = draft.name;
    category.parent_id = draft.parent_id;
    created(id)
}

async fn delete_category(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    market.admin(&headers)?;
    market.lock().categories.retain(|c| c.id != id);
    ok(json!({}))
}

// ---- conversations ----

async fn list_conversations(State(market): State<FakeMarket>, headers: HeaderMap) -> Handled {
    let me = market.caller(&headers)?;
    let state = market.lock();
    let list: Vec<Conversation> = state
        .threads
        .iter()
        .filter(|t| t.buyer == me.id || t.seller == me.id)
        .map(|t| state.conversation_view(t, me.id))
        .collect();
    ok(list)
}

async fn open_conversation(State(market): State<FakeMarket>, headers: HeaderMap, Json(body): Json<Value>) -> Handled {
    let me = market.caller(&headers)?;
    let (Some(ad_id), Some(partner)) = (uuid_field(&body, "adId"), uuid_field(&body, "partnerId")) else {
        return Err(invalid("adId and partnerId are required"));
    };
    if partner == me.id {
        return Err(invalid("Cannot message yourself"));
    }
    let mut state = market.lock();
    if let Some(thread) = state
        .threads
        .iter()
        .find(|t| t.ad_id == ad_id && t.buyer == me.id)
    {
        return created(thread.id);
    }
    let id = Uuid::new_v4();
    state.threads.push(Thread {
        id,
        ad_id,
        buyer: me.id,
        seller: partner,
    });
    created(id)
}

fn participant(state: &MarketState, conversation_id: Uuid, me: Uuid) -> Result<(), Reply> {
    let thread = state
        .threads
        .iter()
        .find(|t| t.id == conversation_id)
        .ok_or_else(|| not_found("Conversation"))?;
    if thread.buyer == me || thread.seller == me {
        Ok(())
    } else {
        Err(forbidden())
    }
}

async fn list_messages(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    let me = market.caller(&headers)?;
    participant(&market.lock(), id, me.id)?;
    ok(market.messages_in(id))
}

async fn send_message(
    State(market): State<FakeMarket>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Handled {
    let me = market.caller(&headers)?;
    let text = text_field(&body, "text").trim().to_string();
    if text.is_empty() {
        return Err(invalid("Message text is required"));
    }
    let mut state = market.lock();
    participant(&state, id, me.id)?;
    let message = Message {
        id: Uuid::new_v4(),
        author_id: Some(me.id),
        author_username: Some(me.username),
        text,
        created_at: Some(Utc::now().naive_utc()),
    };
    let message_id = message.id;
    state.messages.push((id, message));
    created(message_id)
}

// ---- reports ----

async fn create_report(State(market): State<FakeMarket>, headers: HeaderMap, Json(body): Json<Value>) -> Handled {
    let me = market.caller(&headers)?;
    let reason = text_field(&body, "reason").trim().to_string();
    if reason.is_empty() {
        return Err(invalid("Reason is required"));
    }
    let ad_id = uuid_field(&body, "adId").ok_or_else(|| invalid("adId is required"))?;
    let mut state = market.lock();
    let ad_title = state.ad_mut(ad_id)?.title.clone();
    let id = Uuid::new_v4();
    state.reports.push(Report {
        id,
        ad_id: Some(ad_id),
        ad_title: Some(ad_title),
        reporter_id: Some(me.id),
        reporter_username: Some(me.username),
        reason,
        status: ReportStatus::New,
    });
    created(id)
}

async fn list_reports(
    State(market): State<FakeMarket>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Handled {
    market.staff(&headers)?;
    let wanted: Option<ReportStatus> = params.get("status").and_then(|s| s.parse().ok());
    let reports: Vec<Report> = market
        .lock()
        .reports
        .iter()
        .filter(|r| match wanted {
            Some(status) => r.status == status,
            None => r.status != ReportStatus::Resolved,
        })
        .cloned()
        .collect();
    ok(reports)
}

/// Resolving with `block_ad` bans the reported ad.
async fn update_report(
    State(market): State<FakeMarket>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Handled {
    market.staff(&headers)?;
    let status: ReportStatus = body
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value(s).ok())
        .ok_or_else(|| invalid("Unknown status"))?;
    let block = body.get("block_ad").and_then(Value::as_bool).unwrap_or(false);

    let mut state = market.lock();
    let report = state
        .reports
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found("Report"))?;
    report.status = status;
    let ad_id = report.ad_id;
    if status == ReportStatus::Resolved && block {
        if let Some(ad_id) = ad_id {
            state.ad_mut(ad_id)?.status = AdStatus::Banned;
        }
    }
    ok(json!({}))
}

// ---- users ----

async fn list_users(State(market): State<FakeMarket>, headers: HeaderMap) -> Handled {
    market.admin(&headers)?;
    let users: Vec<User> = market.lock().accounts.iter().map(|a| a.user.clone()).collect();
    ok(users)
}

async fn get_user(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    let me = market.caller(&headers)?;
    if me.id != id && me.role != Role::Admin {
        return Err(forbidden());
    }
    market.user(id).map_or_else(|| Err(not_found("User")), ok)
}

/// Users edit themselves; only admins may change a role.
async fn update_user(
    State(market): State<FakeMarket>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Handled {
    let me = market.caller(&headers)?;
    if me.id != id && me.role != Role::Admin {
        return Err(forbidden());
    }
    let username = text_field(&body, "username").trim().to_string();
    let email = text_field(&body, "email").trim().to_string();
    if username.is_empty() || email.is_empty() {
        return Err(invalid("username and email are required"));
    }
    let role: Option<Role> = body
        .get("role")
        .cloned()
        .and_then(|r| serde_json::from_value(r).ok());

    let mut state = market.lock();
    if state
        .accounts
        .iter()
        .any(|a| a.user.id != id && a.user.username == username)
    {
        return Err(fail(StatusCode::CONFLICT, "exists", "Username already taken"));
    }
    let account = state
        .accounts
        .iter_mut()
        .find(|a| a.user.id == id)
        .ok_or_else(|| not_found("User"))?;
    account.user.username = username;
    account.user.email = email;
    if let (Some(role), Role::Admin) = (role, me.role) {
        account.user.role = role;
    }
    ok(account.user.clone())
}

async fn delete_user(State(market): State<FakeMarket>, Path(id): Path<Uuid>, headers: HeaderMap) -> Handled {
    market.admin(&headers)?;
    let mut state = market.lock();
    state.accounts.retain(|a| a.user.id != id);
    state.tokens.retain(|_, owner| *owner != id);
    ok(json!({}))
}
