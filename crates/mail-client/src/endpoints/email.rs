//! `/emails` endpoints

use serde_json::{Value, json};
use transport::RequestDescriptor;

use super::Page;

/// Filters for the mailbox listing.
#[derive(Debug, Clone, Default)]
pub struct EmailQuery {
    pub page: Page,
    pub folder_id: Option<u64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

pub fn list(query: &EmailQuery) -> RequestDescriptor {
    query
        .page
        .apply(RequestDescriptor::get("/emails"))
        .query_opt("folderId", query.folder_id)
        .query_opt("status", query.status.as_deref())
        .query_opt("search", query.search.as_deref())
}

pub fn get(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/emails/{id}"))
}

pub fn send(message: Value) -> RequestDescriptor {
    RequestDescriptor::post("/emails/send").json(message)
}

pub fn save_draft(draft: Value) -> RequestDescriptor {
    RequestDescriptor::post("/emails/draft").json(draft)
}

pub fn delete(id: u64) -> RequestDescriptor {
    RequestDescriptor::delete(format!("/emails/{id}"))
}

pub fn batch_delete(ids: &[u64]) -> RequestDescriptor {
    RequestDescriptor::delete("/emails/batch").json(json!({ "ids": ids }))
}

pub fn mark_read(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/emails/{id}/read"))
}

pub fn mark_unread(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/emails/{id}/unread"))
}

pub fn mark_important(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/emails/{id}/important"))
}

pub fn star(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/emails/{id}/star"))
}

pub fn move_to_folder(id: u64, folder_id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/emails/{id}/move")).json(json!({ "folderId": folder_id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::Method;

    #[test]
    fn list_only_sends_present_filters() {
        let descriptor = list(&EmailQuery {
            page: Page::new(0, 20),
            search: Some("invoice".into()),
            ..EmailQuery::default()
        });
        let keys: Vec<_> = descriptor.query_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["page", "size", "search"]);
    }

    #[test]
    fn batch_delete_carries_ids_in_body() {
        let descriptor = batch_delete(&[1, 2, 3]);
        assert_eq!(descriptor.method(), &Method::DELETE);
        assert_eq!(descriptor.body(), Some(&json!({"ids": [1, 2, 3]})));
    }

    #[test]
    fn move_targets_folder() {
        let descriptor = move_to_folder(5, 9);
        assert_eq!(descriptor.path(), "/emails/5/move");
        assert_eq!(descriptor.body(), Some(&json!({"folderId": 9})));
    }
}
