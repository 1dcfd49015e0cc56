//! `/aliases` endpoints

use serde_json::{Value, json};
use transport::RequestDescriptor;

use super::Page;

pub fn list(page: Page, user_id: Option<u64>) -> RequestDescriptor {
    page.apply(RequestDescriptor::get("/aliases"))
        .query_opt("userId", user_id)
}

pub fn get(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/aliases/{id}"))
}

pub fn create(alias: Value) -> RequestDescriptor {
    RequestDescriptor::post("/aliases").json(alias)
}

pub fn update(id: u64, changes: Value) -> RequestDescriptor {
    RequestDescriptor::put(format!("/aliases/{id}")).json(changes)
}

pub fn delete(id: u64) -> RequestDescriptor {
    RequestDescriptor::delete(format!("/aliases/{id}"))
}

pub fn toggle_status(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/aliases/{id}/status"))
}

pub fn set_auto_reply(
    id: u64,
    enabled: bool,
    subject: Option<&str>,
    message: Option<&str>,
) -> RequestDescriptor {
    let mut body = json!({ "enabled": enabled });
    if let Some(subject) = subject {
        body["subject"] = json!(subject);
    }
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    RequestDescriptor::put(format!("/aliases/{id}/auto-reply")).json(body)
}

pub fn set_forwarding(id: u64, enabled: bool, forward_to: Option<&str>) -> RequestDescriptor {
    let mut body = json!({ "enabled": enabled });
    if let Some(forward_to) = forward_to {
        body["forwardTo"] = json!(forward_to);
    }
    RequestDescriptor::put(format!("/aliases/{id}/forwarding")).json(body)
}

pub fn check_availability(alias: &str) -> RequestDescriptor {
    RequestDescriptor::get("/aliases/check").query("alias", alias)
}
