//! rusty-bazaar/crates/bz-core/src/lib.rs
//!
//! The client-side domain model and interface definitions for Rusty-Bazaar.

pub mod envelope;
pub mod error;
pub mod memory;
pub mod models;
pub mod session;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use memory::MemoryStore;
pub use models::*;
pub use session::{Identity, SessionStore};
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_ad_from_list_payload() {
        let id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let payload = serde_json::json!({
            "id": id,
            "title": "Bike",
            "price": 120.5,
            "status": "active",
            "author_id": author,
            "author_username": "kate",
            "images": ["/uploads/a.jpg"]
        });
        let ad: Ad = serde_json::from_value(payload).unwrap();
        assert_eq!(ad.id, id);
        assert_eq!(ad.status, AdStatus::Active);
        assert!(ad.description.is_none());
        assert_eq!(ad.images.len(), 1);
    }

    #[test]
    fn test_ad_query_skips_unset_filters() {
        let category = Uuid::new_v4();
        let query = AdQuery {
            query: Some(String::new()),
            category_id: Some(category),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![("categoryId", category.to_string()), ("limit", "1000".to_string())]
        );
    }

    #[test]
    fn test_ad_detail_timestamp() {
        let payload = serde_json::json!({
            "id": Uuid::new_v4(),
            "title": "Lamp",
            "description": "Brass",
            "price": 10.0,
            "status": "banned",
            "author_id": Uuid::new_v4(),
            "category_id": Uuid::new_v4(),
            "category_name": "Home",
            "created_at": "2024-03-05T10:11:12.345678"
        });
        let ad: Ad = serde_json::from_value(payload).unwrap();
        assert_eq!(ad.status, AdStatus::Banned);
        assert_eq!(ad.created_at.unwrap().format("%Y-%m-%d").to_string(), "2024-03-05");
    }
}
