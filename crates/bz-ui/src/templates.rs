//! Askama views for every row, card and fragment the controller renders.
//! Display strings are computed here so templates stay logic-free.

use askama::Template;
use bz_core::{Ad, AdStatus, Category, Conversation, Media, Message, Report, ReportStatus, Role, User};

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

pub fn price_label(price: f64) -> String {
    format!("${price:.2}")
}

#[derive(Template)]
#[template(path = "ad_card.html")]
pub struct AdCard {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub price: String,
    pub author: String,
    pub status: String,
}

impl From<&Ad> for AdCard {
    fn from(ad: &Ad) -> Self {
        Self {
            id: ad.id.to_string(),
            title: ad.title.clone(),
            cover: ad.images.first().cloned().unwrap_or_default(),
            price: price_label(ad.price),
            author: ad.author_username.clone().unwrap_or_else(|| "Unknown".into()),
            status: match ad.status {
                AdStatus::Active => "Active",
                AdStatus::Closed => "Closed",
                AdStatus::Banned => "Blocked",
            }
            .into(),
        }
    }
}

#[derive(Template)]
#[template(path = "my_ad_card.html")]
pub struct MyAdCard {
    pub id: String,
    pub title: String,
    pub price: String,
    pub badge: String,
    pub editable: bool,
    pub reopenable: bool,
    pub busy: bool,
}

impl MyAdCard {
    pub fn new(ad: &Ad, busy: bool) -> Self {
        Self {
            id: ad.id.to_string(),
            title: ad.title.clone(),
            price: price_label(ad.price),
            badge: match ad.status {
                AdStatus::Active => String::new(),
                AdStatus::Closed => "Closed".into(),
                AdStatus::Banned => "Blocked".into(),
            },
            editable: ad.status == AdStatus::Active,
            reopenable: ad.status == AdStatus::Closed,
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "table.html")]
pub struct Table<'a> {
    pub headers: &'a [&'a str],
    pub rows: Vec<String>,
}

#[derive(Template)]
#[template(path = "user_row.html")]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<SelectOption>,
    pub busy: bool,
}

impl UserRow {
    pub fn new(user: &User, busy: bool) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: Role::ALL
                .iter()
                .map(|r| SelectOption::new(r.as_str(), r.as_str(), *r == user.role))
                .collect(),
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "category_row.html")]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub parent: String,
    pub busy: bool,
}

impl CategoryRow {
    pub fn new(category: &Category, busy: bool) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            parent: category.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "report_row.html")]
pub struct ReportRow {
    pub id: String,
    pub ad: String,
    pub reason: String,
    pub reporter: String,
    pub status: String,
    pub statuses: Vec<SelectOption>,
    pub editable: bool,
    pub busy: bool,
}

impl ReportRow {
    pub fn new(report: &Report, editable: bool, busy: bool) -> Self {
        let or_id = |name: &Option<String>, id: Option<uuid::Uuid>| {
            name.clone()
                .or_else(|| id.map(|i| i.to_string()))
                .unwrap_or_default()
        };
        Self {
            id: report.id.to_string(),
            ad: or_id(&report.ad_title, report.ad_id),
            reason: report.reason.clone(),
            reporter: or_id(&report.reporter_username, report.reporter_id),
            status: report.status.as_str().into(),
            statuses: ReportStatus::ALL
                .iter()
                .map(|s| SelectOption::new(s.as_str(), s.as_str(), *s == report.status))
                .collect(),
            editable,
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "conversation_row.html")]
pub struct ConversationRow {
    pub id: String,
    pub ad: String,
    pub partner: String,
}

impl From<&Conversation> for ConversationRow {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.to_string(),
            ad: c
                .ad_title
                .clone()
                .or_else(|| c.ad_id.map(|i| i.to_string()))
                .unwrap_or_default(),
            partner: c
                .partner_username
                .clone()
                .or_else(|| c.partner_id.map(|i| i.to_string()))
                .unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageLine {
    pub author: String,
    pub text: String,
    /// Standalone pane uses the one-line `author: text` form.
    pub compact: bool,
}

impl MessageLine {
    pub fn new(message: &Message, compact: bool) -> Self {
        Self {
            author: message
                .author_username
                .clone()
                .or_else(|| message.author_id.map(|i| i.to_string()))
                .unwrap_or_default(),
            text: message.text.clone(),
            compact,
        }
    }
}

#[derive(Template)]
#[template(path = "media_thumb.html")]
pub struct MediaThumb {
    pub id: String,
    pub url: String,
    pub removable: bool,
    pub busy: bool,
}

impl MediaThumb {
    pub fn new(media: &Media, removable: bool, busy: bool) -> Self {
        Self {
            id: media.id.to_string(),
            url: media.url.clone(),
            removable,
            busy,
        }
    }
}

#[derive(Template)]
#[template(path = "placeholder.html")]
pub struct Placeholder<'a> {
    pub class: &'a str,
    pub text: &'a str,
}

impl<'a> Placeholder<'a> {
    pub fn muted(text: &'a str) -> Self {
        Self {
            class: "text-muted",
            text,
        }
    }

    pub fn danger(text: &'a str) -> Self {
        Self {
            class: "text-danger",
            text,
        }
    }
}

#[derive(Template)]
#[template(path = "select_options.html")]
pub struct SelectOptions {
    pub options: Vec<SelectOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ad(status: AdStatus) -> Ad {
        Ad {
            id: Uuid::new_v4(),
            title: "<b>Bike</b>".into(),
            description: None,
            price: 12.5,
            category_id: None,
            category_name: None,
            author_id: Uuid::new_v4(),
            author_username: None,
            status,
            images: vec![],
            location: None,
            created_at: None,
        }
    }

    #[test]
    fn ad_card_escapes_and_formats() {
        let html = AdCard::from(&ad(AdStatus::Active)).render().unwrap();
        assert!(html.contains("$12.50"));
        assert!(html.contains("&lt;b&gt;Bike"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("Unknown"));
        assert!(html.contains("background: #f3f4f6"));
    }

    #[test]
    fn closed_ad_offers_reopen_only() {
        let html = MyAdCard::new(&ad(AdStatus::Closed), false).render().unwrap();
        assert!(html.contains("reopen-ad"));
        assert!(html.contains("Closed"));
        assert!(!html.contains("/edit"));

        let html = MyAdCard::new(&ad(AdStatus::Closed), true).render().unwrap();
        assert!(html.contains("disabled"));
    }

    #[test]
    fn user_row_selects_current_role() {
        let user = User {
            id: Uuid::new_v4(),
            username: "kate".into(),
            email: "k@x.io".into(),
            role: Role::Moderator,
        };
        let html = UserRow::new(&user, false).render().unwrap();
        assert!(html.contains(r#"<option value="moderator" selected>"#));
        assert!(!html.contains(r#"<option value="admin" selected>"#));
    }

    #[test]
    fn read_only_report_row_has_no_controls() {
        let report = Report {
            id: Uuid::new_v4(),
            ad_id: Some(Uuid::new_v4()),
            ad_title: None,
            reporter_id: None,
            reporter_username: Some("ann".into()),
            reason: "spam".into(),
            status: ReportStatus::Reviewing,
        };
        let html = ReportRow::new(&report, false, false).render().unwrap();
        assert!(!html.contains("save-report"));
        assert!(html.contains("status: reviewing"));
        assert!(html.contains(&report.ad_id.unwrap().to_string()));
    }
}
