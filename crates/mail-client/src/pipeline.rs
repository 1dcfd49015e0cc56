//! Request preparation
//!
//! Turns a `RequestDescriptor` into a `PreparedRequest` against one session
//! snapshot. No hidden state: preparing the same descriptor against the same
//! snapshot always yields the same request.

use mail_auth::SessionSnapshot;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use transport::{AuthMode, Error, PreparedRequest, RequestDescriptor, Result};

/// Resolve headers and attach the bearer token when the session has one.
///
/// `Anonymous` descriptors and signed-out snapshots pass through with only the
/// caller's headers. A caller-supplied `Authorization` header is replaced when
/// the session token is attached.
pub fn prepare(descriptor: &RequestDescriptor, snapshot: &SessionSnapshot) -> Result<PreparedRequest> {
    let mut headers = HeaderMap::new();
    for (name, value) in descriptor.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
        headers.append(name, value);
    }

    let token = match descriptor.auth() {
        AuthMode::Session => snapshot.access_token(),
        AuthMode::Anonymous => None,
    };
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(
            |_| Error::InvalidHeader("authorization: token is not a valid header value".into()),
        )?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(PreparedRequest {
        method: descriptor.method().clone(),
        path: descriptor.path().to_string(),
        query: descriptor.query_pairs().to_vec(),
        headers,
        body: descriptor.body().cloned(),
    })
}
