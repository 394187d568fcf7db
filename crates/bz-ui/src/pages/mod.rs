//! Page setup routines. Each module owns the anchors of one page and the
//! handlers wired to them; [`crate::router::PageRouter`] decides which run.

pub mod ad_detail;
pub mod ad_form;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod conversations;
pub mod moderation;
pub mod my_ads;
pub mod nav;
pub mod profile;

use uuid::Uuid;

/// Id at `index` in a path such as `/ads/<id>/edit`.
pub(crate) fn path_id(location: &str, index: usize) -> Option<Uuid> {
    location
        .split('?')
        .next()?
        .split('/')
        .filter(|s| !s.is_empty())
        .nth(index)?
        .parse()
        .ok()
}

/// Empty input means "not set".
pub(crate) fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_read_from_the_path() {
        let id = Uuid::new_v4();
        assert_eq!(path_id(&format!("/ads/{id}"), 1), Some(id));
        assert_eq!(path_id(&format!("/ads/{id}/edit?x=1"), 1), Some(id));
        assert_eq!(path_id("/ads/new", 1), None);
        assert_eq!(path_id("/", 1), None);
    }
}
