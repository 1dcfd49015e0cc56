//! Password reset endpoints, all anonymous

use mail_auth::{FORGOT_PASSWORD_PATH, RESET_PASSWORD_PATH, VERIFY_RESET_TOKEN_PATH};
use serde_json::json;
use transport::RequestDescriptor;

pub fn forgot_password(email: &str) -> RequestDescriptor {
    RequestDescriptor::post(FORGOT_PASSWORD_PATH)
        .anonymous()
        .json(json!({ "email": email }))
}

pub fn reset_password(token: &str, password: &str) -> RequestDescriptor {
    RequestDescriptor::post(RESET_PASSWORD_PATH)
        .anonymous()
        .json(json!({ "token": token, "password": password }))
}

pub fn verify_reset_token(token: &str) -> RequestDescriptor {
    RequestDescriptor::get(VERIFY_RESET_TOKEN_PATH)
        .anonymous()
        .query("token", token)
}
