//! `/users` endpoints

use serde_json::{Value, json};
use transport::RequestDescriptor;

use super::Page;

pub const PROFILE_PATH: &str = "/users/profile";

pub fn profile() -> RequestDescriptor {
    RequestDescriptor::get(PROFILE_PATH)
}

pub fn update_profile(changes: Value) -> RequestDescriptor {
    RequestDescriptor::put(PROFILE_PATH).json(changes)
}

pub fn change_password(old_password: &str, new_password: &str) -> RequestDescriptor {
    RequestDescriptor::post("/users/change-password").json(json!({
        "oldPassword": old_password,
        "newPassword": new_password,
    }))
}

pub fn list(page: Page, search: Option<&str>, role: Option<&str>) -> RequestDescriptor {
    page.apply(RequestDescriptor::get("/users"))
        .query_opt("search", search)
        .query_opt("role", role)
}

pub fn get(id: u64) -> RequestDescriptor {
    RequestDescriptor::get(format!("/users/{id}"))
}

pub fn update(id: u64, changes: Value) -> RequestDescriptor {
    RequestDescriptor::put(format!("/users/{id}")).json(changes)
}

pub fn delete(id: u64) -> RequestDescriptor {
    RequestDescriptor::delete(format!("/users/{id}"))
}

pub fn reset_password(id: u64) -> RequestDescriptor {
    RequestDescriptor::post(format!("/users/{id}/reset-password"))
}

pub fn enable(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/users/{id}/enable"))
}

pub fn disable(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/users/{id}/disable"))
}

pub fn permissions() -> RequestDescriptor {
    RequestDescriptor::get("/users/permissions")
}

pub fn notifications() -> RequestDescriptor {
    RequestDescriptor::get("/users/notifications")
}

pub fn mark_notification_read(id: u64) -> RequestDescriptor {
    RequestDescriptor::put(format!("/users/notifications/{id}/read"))
}

pub fn update_notification_settings(settings: Value) -> RequestDescriptor {
    RequestDescriptor::put("/users/notification-settings").json(settings)
}
