//! # Surface
//!
//! The contract between the controller and the page shell: named anchors
//! that can be probed, filled with markup, shown or hidden, and read back as
//! form values. [`Document`] is the in-memory implementation used by the
//! headless shell and tests.

use std::sync::{Mutex, PoisonError};

use bz_core::Upload;
use dashmap::DashMap;

pub trait Surface: Send + Sync {
    fn has(&self, anchor: &str) -> bool;
    fn set_html(&self, anchor: &str, html: String);
    fn set_text(&self, anchor: &str, text: &str);
    fn set_visible(&self, anchor: &str, visible: bool);
    fn set_link(&self, anchor: &str, href: &str);
    fn set_disabled(&self, anchor: &str, disabled: bool);
    /// Current value of an input; empty when the anchor is absent.
    fn value(&self, anchor: &str) -> String;
    fn set_value(&self, anchor: &str, value: &str);
    /// Creates (or resets) an input that rendered markup just introduced.
    fn mount_field(&self, anchor: &str, value: &str);
    /// Drops an input whose row left the page.
    fn unmount_field(&self, anchor: &str);
    /// Files currently picked in a file input. The selection stays in place.
    fn files(&self, anchor: &str) -> Vec<Upload>;
    fn clear_files(&self, anchor: &str);
    fn mark_invalid(&self, anchor: &str, message: &str);
    fn clear_invalid(&self, anchor: &str);
    fn navigate(&self, location: &str);
    /// Path of the current page, e.g. `/ads/<id>/edit`.
    fn location(&self) -> String;
}

/// Anchor of an input inside a rendered row.
pub fn row_field(container: &str, row_id: impl std::fmt::Display, field: &str) -> String {
    format!("{container}/{row_id}/{field}")
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub html: String,
    pub text: String,
    pub visible: bool,
    pub value: String,
    pub href: Option<String>,
    pub disabled: bool,
    pub invalid: Option<String>,
    pub files: Vec<Upload>,
}

/// Page model keyed by anchor id. Operations on anchors the page does not
/// declare are ignored, matching optional element lookups in a browser.
#[derive(Debug, Default)]
pub struct Document {
    elements: DashMap<String, Element>,
    location: Mutex<String>,
    navigations: Mutex<Vec<String>>,
}

impl Document {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            elements: DashMap::new(),
            location: Mutex::new(location.into()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_anchor(self, anchor: &str) -> Self {
        self.elements.insert(
            anchor.to_string(),
            Element {
                visible: true,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_anchors(self, anchors: &[&str]) -> Self {
        anchors.iter().fold(self, |doc, a| doc.with_anchor(a))
    }

    /// Declares an anchor that starts out hidden (`d-none`).
    pub fn with_hidden(self, anchor: &str) -> Self {
        self.elements.insert(anchor.to_string(), Element::default());
        self
    }

    pub fn with_value(self, anchor: &str, value: &str) -> Self {
        self.elements
            .entry(anchor.to_string())
            .or_insert_with(|| Element {
                visible: true,
                ..Default::default()
            })
            .value = value.to_string();
        self
    }

    pub fn with_files(self, anchor: &str, files: Vec<Upload>) -> Self {
        self.elements
            .entry(anchor.to_string())
            .or_insert_with(|| Element {
                visible: true,
                ..Default::default()
            })
            .files = files;
        self
    }

    /// Simulates a file pick on an existing input.
    pub fn pick_files(&self, anchor: &str, files: Vec<Upload>) {
        if let Some(mut el) = self.elements.get_mut(anchor) {
            el.files = files;
        }
    }

    pub fn element(&self, anchor: &str) -> Option<Element> {
        self.elements.get(anchor).map(|el| el.clone())
    }

    pub fn html(&self, anchor: &str) -> String {
        self.element(anchor).map(|el| el.html).unwrap_or_default()
    }

    pub fn text(&self, anchor: &str) -> String {
        self.element(anchor).map(|el| el.text).unwrap_or_default()
    }

    pub fn is_visible(&self, anchor: &str) -> bool {
        self.element(anchor).is_some_and(|el| el.visible)
    }

    pub fn link(&self, anchor: &str) -> Option<String> {
        self.element(anchor).and_then(|el| el.href)
    }

    pub fn is_disabled(&self, anchor: &str) -> bool {
        self.element(anchor).is_some_and(|el| el.disabled)
    }

    pub fn invalid(&self, anchor: &str) -> Option<String> {
        self.element(anchor).and_then(|el| el.invalid)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Anchors in a stable order with their visible content, for printing.
    pub fn snapshot(&self) -> Vec<(String, Element)> {
        let mut all: Vec<_> = self
            .elements
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    fn update(&self, anchor: &str, f: impl FnOnce(&mut Element)) {
        if let Some(mut el) = self.elements.get_mut(anchor) {
            f(&mut el);
        }
    }
}

impl Surface for Document {
    fn has(&self, anchor: &str) -> bool {
        self.elements.contains_key(anchor)
    }

    fn set_html(&self, anchor: &str, html: String) {
        self.update(anchor, |el| el.html = html);
    }

    fn set_text(&self, anchor: &str, text: &str) {
        self.update(anchor, |el| el.text = text.to_string());
    }

    fn set_visible(&self, anchor: &str, visible: bool) {
        self.update(anchor, |el| el.visible = visible);
    }

    fn set_link(&self, anchor: &str, href: &str) {
        self.update(anchor, |el| el.href = Some(href.to_string()));
    }

    fn set_disabled(&self, anchor: &str, disabled: bool) {
        self.update(anchor, |el| el.disabled = disabled);
    }

    fn value(&self, anchor: &str) -> String {
        self.elements
            .get(anchor)
            .map(|el| el.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, anchor: &str, value: &str) {
        self.update(anchor, |el| el.value = value.to_string());
    }

    fn mount_field(&self, anchor: &str, value: &str) {
        self.elements.insert(
            anchor.to_string(),
            Element {
                visible: true,
                value: value.to_string(),
                ..Default::default()
            },
        );
    }

    fn unmount_field(&self, anchor: &str) {
        self.elements.remove(anchor);
    }

    fn files(&self, anchor: &str) -> Vec<Upload> {
        self.elements
            .get(anchor)
            .map(|el| el.files.clone())
            .unwrap_or_default()
    }

    fn clear_files(&self, anchor: &str) {
        self.update(anchor, |el| el.files.clear());
    }

    fn mark_invalid(&self, anchor: &str, message: &str) {
        self.update(anchor, |el| el.invalid = Some(message.to_string()));
    }

    fn clear_invalid(&self, anchor: &str) {
        self.update(anchor, |el| el.invalid = None);
    }

    fn navigate(&self, location: &str) {
        self.navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location.to_string());
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.to_string();
    }

    fn location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_anchors_are_ignored() {
        let doc = Document::new("/").with_anchor("ads-list");
        doc.set_html("missing", "<p>x</p>".into());
        doc.set_visible("missing", true);
        assert!(!doc.has("missing"));
        assert_eq!(doc.value("missing"), "");
    }

    #[test]
    fn mounted_fields_become_addressable() {
        let doc = Document::new("/admin");
        let anchor = row_field("users-list", "u1", "email");
        doc.mount_field(&anchor, "a@b.c");
        assert_eq!(doc.value(&anchor), "a@b.c");
        doc.mark_invalid(&anchor, "Invalid email");
        assert_eq!(doc.invalid(&anchor).as_deref(), Some("Invalid email"));
        doc.clear_invalid(&anchor);
        assert!(doc.invalid(&anchor).is_none());

        doc.unmount_field(&anchor);
        assert!(!doc.has(&anchor));
    }

    #[test]
    fn picked_files_stay_until_cleared() {
        let doc = Document::new("/ads/new")
            .with_files("images", vec![Upload::new("a.png", "image/png", vec![0])]);
        assert_eq!(doc.files("images").len(), 1);
        assert_eq!(doc.files("images").len(), 1);
        doc.clear_files("images");
        assert!(doc.files("images").is_empty());
    }

    #[test]
    fn navigation_updates_location() {
        let doc = Document::new("/login");
        doc.navigate("/");
        assert_eq!(doc.location(), "/");
        assert_eq!(doc.navigations(), vec!["/".to_string()]);
    }
}
