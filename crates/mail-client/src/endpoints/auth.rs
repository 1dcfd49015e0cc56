//! `/auth` endpoints

use mail_auth::{LOGIN_PATH, LOGOUT_PATH, LoginRequest, REGISTER_PATH, RegisterRequest, VALIDATE_PATH};
use transport::{RequestDescriptor, Result};

/// Anonymous login; never carries a stale session token.
pub fn login(request: &LoginRequest) -> Result<RequestDescriptor> {
    RequestDescriptor::post(LOGIN_PATH)
        .anonymous()
        .json_body(request)
}

pub fn register(request: &RegisterRequest) -> Result<RequestDescriptor> {
    RequestDescriptor::post(REGISTER_PATH)
        .anonymous()
        .json_body(request)
}

pub fn logout() -> RequestDescriptor {
    RequestDescriptor::post(LOGOUT_PATH)
}

pub fn validate() -> RequestDescriptor {
    RequestDescriptor::get(VALIDATE_PATH)
}
