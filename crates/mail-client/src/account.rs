//! Account lifecycle on top of the authenticated client
//!
//! Login and registration are anonymous calls. Logout is best effort
//! remotely but always clears the local session. `check_auth` confirms a
//! restored session against the profile endpoint.

use mail_auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use tracing::{info, warn};

use crate::client::AuthenticatedClient;
use crate::endpoints;
use crate::error::Result;

/// Sign in and store the issued token pair.
pub async fn login(client: &AuthenticatedClient, request: &LoginRequest) -> Result<UserInfo> {
    let response: LoginResponse = client
        .execute_json(endpoints::auth::login(request)?)
        .await?;
    client
        .session()
        .set_tokens(response.token.clone(), response.refresh_token.clone())
        .await?;
    info!(username = %response.username, role = %response.role, "logged in");
    Ok(response.user_info())
}

pub async fn register(client: &AuthenticatedClient, request: &RegisterRequest) -> Result<UserInfo> {
    let user: UserInfo = client
        .execute_json(endpoints::auth::register(request)?)
        .await?;
    info!(username = %user.username, "registered account");
    Ok(user)
}

/// Sign out. The remote call may fail; the local session is cleared anyway.
pub async fn logout(client: &AuthenticatedClient) -> Result<()> {
    if client.session().is_authenticated() {
        if let Err(e) = client.execute(endpoints::auth::logout()).await {
            warn!(error = %e, "remote logout failed, clearing local session anyway");
        }
    }
    client.session().clear().await?;
    info!("logged out");
    Ok(())
}

/// Profile of the signed-in user, or `None` when signed out.
///
/// Any failure fetching the profile clears the session.
pub async fn check_auth(client: &AuthenticatedClient) -> Result<Option<UserInfo>> {
    if !client.session().is_authenticated() {
        return Ok(None);
    }
    match client
        .execute_json::<UserInfo>(endpoints::user::profile())
        .await
    {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            warn!(error = %e, "profile check failed, clearing session");
            client.session().clear().await?;
            Ok(None)
        }
    }
}
