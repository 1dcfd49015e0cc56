//! Backend auth endpoint paths
//!
//! Paths are relative to the API base URL (the frontend mounts the backend
//! under `/api`).

/// Default API base URL for a local backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

pub const LOGIN_PATH: &str = "/auth/login";

pub const REGISTER_PATH: &str = "/auth/register";

pub const LOGOUT_PATH: &str = "/auth/logout";

/// Refresh endpoint; expects `Authorization: Bearer <refresh token>` and no body
pub const REFRESH_PATH: &str = "/auth/refresh";

pub const VALIDATE_PATH: &str = "/auth/validate";

pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";

pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

pub const VERIFY_RESET_TOKEN_PATH: &str = "/auth/verify-reset-token";
