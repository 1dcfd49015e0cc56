//! Authenticated client
//!
//! `AuthenticatedClient` is a cheap-to-clone handle over the session store,
//! transport, refresher, invalidation hook, and refresh coordinator. Each
//! `execute` runs prepare → send → classify, and on a 401 hands the request
//! to the coordinator. The refresh itself runs on a detached task so that a
//! caller giving up never strands the coordinator in `Refreshing`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use common::Secret;
use futures_util::future::join_all;
use mail_auth::{RefreshClient, SessionStore};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use transport::{AuthMode, HttpTransport, RawResponse, RequestDescriptor, Transport};

use crate::classify::{Outcome, classify};
use crate::coordinator::{Admission, RefreshCoordinator};
use crate::error::{Error, Result};
use crate::hook::{NoopHook, SessionInvalidationHook};
use crate::pipeline::prepare;
use crate::refresher::Refresher;

/// Default overall deadline per request, including time queued for refresh.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for one refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful result of a client call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Decoded JSON body (`null` for an empty body)
    Structured(serde_json::Value),
    /// Untouched response for binary requests
    Binary(RawResponse),
}

impl Reply {
    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Reply::Structured(value) => {
                serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
            }
            Reply::Binary(raw) => {
                serde_json::from_slice(&raw.body).map_err(|e| Error::Decode(e.to_string()))
            }
        }
    }
}

struct Inner {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    refresher: Arc<dyn Refresher>,
    hook: Arc<dyn SessionInvalidationHook>,
    coordinator: RefreshCoordinator,
    request_timeout: Duration,
    refresh_timeout: Duration,
}

/// Builder for `AuthenticatedClient`.
pub struct ClientBuilder {
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    refresher: Arc<dyn Refresher>,
    hook: Arc<dyn SessionInvalidationHook>,
    request_timeout: Duration,
    refresh_timeout: Duration,
}

impl ClientBuilder {
    pub fn hook(mut self, hook: impl SessionInvalidationHook + 'static) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    pub fn shared_hook(mut self, hook: Arc<dyn SessionInvalidationHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn build(self) -> AuthenticatedClient {
        AuthenticatedClient {
            inner: Arc::new(Inner {
                session: self.session,
                transport: self.transport,
                refresher: self.refresher,
                hook: self.hook,
                coordinator: RefreshCoordinator::new(),
                request_timeout: self.request_timeout,
                refresh_timeout: self.refresh_timeout,
            }),
        }
    }
}

/// Handle for issuing authenticated requests.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

impl AuthenticatedClient {
    pub fn builder(
        session: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
        refresher: Arc<dyn Refresher>,
    ) -> ClientBuilder {
        ClientBuilder {
            session,
            transport,
            refresher,
            hook: Arc::new(NoopHook),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    /// Client over HTTP against `base_url`, refreshing through the same backend.
    ///
    /// Transport and refresh share one connection pool.
    pub fn connect(
        base_url: &str,
        session: Arc<SessionStore>,
        request_timeout: Duration,
    ) -> Result<ClientBuilder> {
        let transport = HttpTransport::new(base_url, request_timeout)?;
        let refresher = RefreshClient::new(transport.client().clone(), transport.base_url());
        Ok(Self::builder(session, Arc::new(transport), Arc::new(refresher))
            .request_timeout(request_timeout))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Run one request to its final result.
    ///
    /// A 401 on a session request is recovered transparently when a refresh
    /// succeeds. The whole call, including time queued behind a refresh, is
    /// bounded by the request timeout; on expiry the request is withdrawn
    /// from the queue and resolves as a network error.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Reply> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let result = self.inner.execute(descriptor, request_id).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        crate::metrics::record_request(outcome);
        result
    }

    /// Run a request and deserialize its JSON body.
    pub async fn execute_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T> {
        self.execute(descriptor).await?.json()
    }

    /// Run a request as a download and return the raw body.
    pub async fn execute_bytes(&self, descriptor: RequestDescriptor) -> Result<Bytes> {
        match self.execute(descriptor.binary()).await? {
            Reply::Binary(raw) => Ok(raw.body),
            Reply::Structured(_) => Err(Error::Decode("expected a binary body".into())),
        }
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("transport", &self.inner.transport.id())
            .field("session", &self.inner.session)
            .field("request_timeout", &self.inner.request_timeout)
            .field("refresh_timeout", &self.inner.refresh_timeout)
            .finish()
    }
}

impl Inner {
    #[instrument(skip_all, fields(request_id = %request_id, method = %descriptor.method(), path = %descriptor.path()))]
    async fn execute(self: &Arc<Self>, descriptor: RequestDescriptor, request_id: String) -> Result<Reply> {
        match tokio::time::timeout(self.request_timeout, self.run(descriptor)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.request_timeout, "request deadline exceeded");
                Err(Error::Network("deadline exceeded".into()))
            }
        }
    }

    async fn run(self: &Arc<Self>, descriptor: RequestDescriptor) -> Result<Reply> {
        let snapshot = self.session.snapshot();
        let prepared = prepare(&descriptor, &snapshot)?;
        let outcome = classify(
            descriptor.response_kind(),
            self.transport.send(prepared).await,
        );

        match outcome {
            Outcome::AuthExpired if descriptor.auth() == AuthMode::Anonymous => {
                Err(Error::Unauthorized)
            }
            Outcome::AuthExpired => self.recover(descriptor, snapshot.generation()).await,
            other => finish(other),
        }
    }

    async fn recover(self: &Arc<Self>, descriptor: RequestDescriptor, sent_generation: u64) -> Result<Reply> {
        match self
            .coordinator
            .admit(descriptor.clone(), sent_generation, &self.session)
        {
            Admission::Lead {
                ticket,
                refresh_token,
            } => {
                self.spawn_refresh(refresh_token);
                ticket.wait().await
            }
            Admission::Queued { ticket } => ticket.wait().await,
            Admission::Replay => {
                debug!("credentials rotated while request was in flight, replaying");
                self.replay(&descriptor).await
            }
            Admission::Expired { invalidate } => {
                if invalidate {
                    self.sign_out("no refresh token").await;
                    self.hook.on_session_expired();
                }
                Err(Error::SessionExpired)
            }
        }
    }

    /// Send once more with the current session. A second 401 is terminal.
    async fn replay(&self, descriptor: &RequestDescriptor) -> Result<Reply> {
        let prepared = prepare(descriptor, &self.session.snapshot())?;
        self.send_prepared(descriptor, prepared).await
    }

    async fn send_prepared(
        &self,
        descriptor: &RequestDescriptor,
        prepared: transport::PreparedRequest,
    ) -> Result<Reply> {
        let outcome = classify(
            descriptor.response_kind(),
            self.transport.send(prepared).await,
        );
        if matches!(outcome, Outcome::AuthExpired) {
            warn!("replayed request rejected again, giving up");
        }
        finish(outcome)
    }

    fn spawn_refresh(self: &Arc<Self>, refresh_token: Secret<String>) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.refresh_and_settle(refresh_token).await;
        });
    }

    async fn refresh_and_settle(self: Arc<Self>, refresh_token: Secret<String>) {
        let started = Instant::now();
        info!("refreshing session token");

        let refreshed = match tokio::time::timeout(
            self.refresh_timeout,
            self.refresher.refresh(refresh_token.expose()),
        )
        .await
        {
            Ok(Ok(tokens)) if tokens.access_token.is_empty() => {
                Err("refresh returned no access token".to_string())
            }
            Ok(Ok(tokens)) => self
                .session
                .set_tokens(tokens.access_token, tokens.refresh_token)
                .await
                .map_err(|e| format!("persisting refreshed tokens: {e}")),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("refresh timed out after {:?}", self.refresh_timeout)),
        };

        match refreshed {
            Ok(()) => {
                let waiters = self.coordinator.settle();
                info!(
                    waiters = waiters.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "token refreshed, replaying queued requests"
                );
                crate::metrics::record_refresh("success", waiters.len());

                // join_all polls in queue order, so sends start in arrival order.
                let snapshot = self.session.snapshot();
                let replays: Vec<_> = waiters
                    .into_iter()
                    .map(|waiter| {
                        let prepared = prepare(&waiter.descriptor, &snapshot);
                        let inner = Arc::clone(&self);
                        async move {
                            let result = match prepared {
                                Ok(prepared) => inner.send_prepared(&waiter.descriptor, prepared).await,
                                Err(e) => Err(e.into()),
                            };
                            waiter.resolve(result);
                        }
                    })
                    .collect();
                join_all(replays).await;
            }
            Err(reason) => {
                self.teardown(&reason).await;
            }
        }
    }

    async fn sign_out(&self, reason: &str) {
        warn!(reason, "session cannot be recovered, signing out");
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "failed to remove persisted session");
        }
    }

    /// Clear the session, fail every waiter, then notify the hook once.
    async fn teardown(&self, reason: &str) {
        self.sign_out(reason).await;
        let waiters = self.coordinator.settle();
        crate::metrics::record_refresh("failure", waiters.len());
        for waiter in waiters {
            waiter.resolve(Err(Error::SessionExpired));
        }
        self.hook.on_session_expired();
    }
}

/// Map a terminal classification to the caller's result.
fn finish(outcome: Outcome) -> Result<Reply> {
    match outcome {
        Outcome::Success(payload) => Ok(Reply::Structured(payload)),
        Outcome::BinaryPassthrough(raw) => Ok(Reply::Binary(raw)),
        Outcome::AuthExpired => Err(Error::SessionExpired),
        Outcome::Forbidden => Err(Error::Forbidden),
        Outcome::NotFound => Err(Error::NotFound),
        Outcome::ServerError(status) => Err(Error::Server { status }),
        Outcome::NetworkError(detail) => Err(Error::Network(detail)),
        Outcome::Other { status, payload } => Err(Error::unexpected(status, payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mail_auth::TokenResponse;
    use reqwest::header::AUTHORIZATION;
    use transport::{PreparedRequest, SendFuture, TransportError};

    use crate::hook::FnHook;
    use crate::refresher::RefreshFuture;

    /// Transport answering from a script and recording what it was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<std::result::Result<RawResponse, TransportError>>>,
        seen: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<std::result::Result<RawResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn bearers(&self) -> Vec<Option<String>> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn id(&self) -> &str {
            "scripted"
        }

        fn send(&self, request: PreparedRequest) -> SendFuture<'_> {
            let bearer = request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            self.seen.lock().unwrap().push(bearer);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(200, "null")));
            Box::pin(async move { next })
        }
    }

    /// Refresher returning a fixed result and counting calls.
    struct StaticRefresher {
        calls: AtomicUsize,
        access: Option<&'static str>,
    }

    impl Refresher for StaticRefresher {
        fn refresh<'a>(&'a self, _refresh_token: &'a str) -> RefreshFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match self.access {
                Some(access) => Ok(TokenResponse {
                    access_token: access.to_string(),
                    refresh_token: Some(format!("{access}_rt")),
                    expires_in: None,
                }),
                None => Err(mail_auth::Error::InvalidCredentials("revoked".into())),
            };
            Box::pin(async move { result })
        }
    }

    /// Transport that accepts only `at_new` and records every send in order.
    #[derive(Default)]
    struct RotatingTransport {
        sends: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RotatingTransport {
        fn paths_sent_with(&self, bearer: &str) -> Vec<String> {
            self.sends
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, b)| b.as_deref() == Some(bearer))
                .map(|(path, _)| path.clone())
                .collect()
        }
    }

    impl Transport for RotatingTransport {
        fn id(&self) -> &str {
            "rotating"
        }

        fn send(&self, request: PreparedRequest) -> SendFuture<'_> {
            let bearer = request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let status = if bearer.as_deref() == Some("Bearer at_new") {
                200
            } else {
                401
            };
            self.sends.lock().unwrap().push((request.path.clone(), bearer));
            Box::pin(async move { Ok(RawResponse::new(status, "null")) })
        }
    }

    /// Refresher that holds the refresh open before issuing `at_new`.
    struct SlowRefresher {
        delay: Duration,
    }

    impl Refresher for SlowRefresher {
        fn refresh<'a>(&'a self, _refresh_token: &'a str) -> RefreshFuture<'a> {
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(TokenResponse {
                    access_token: "at_new".to_string(),
                    refresh_token: None,
                    expires_in: None,
                })
            })
        }
    }

    async fn signed_in_session(refresh: Option<&str>) -> Arc<SessionStore> {
        let session = Arc::new(SessionStore::in_memory());
        session
            .set_tokens("at_old".into(), refresh.map(String::from))
            .await
            .unwrap();
        session
    }

    fn client(
        session: Arc<SessionStore>,
        transport: Arc<ScriptedTransport>,
        refresher: Arc<StaticRefresher>,
        hook_calls: Arc<AtomicUsize>,
    ) -> AuthenticatedClient {
        AuthenticatedClient::builder(session, transport, refresher)
            .hook(FnHook::new(move || {
                hook_calls.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
    }

    fn refresher(access: Option<&'static str>) -> Arc<StaticRefresher> {
        Arc::new(StaticRefresher {
            calls: AtomicUsize::new(0),
            access,
        })
    }

    #[tokio::test]
    async fn success_returns_structured_reply() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(
            200,
            r#"{"id":1}"#,
        ))]));
        let client = client(session, transport.clone(), refresher(None), Arc::default());

        let reply = client.execute(RequestDescriptor::get("/emails/1")).await.unwrap();
        let value: serde_json::Value = reply.json().unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(transport.bearers(), [Some("Bearer at_old".to_string())]);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_replayed() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(401, "")),
            Ok(RawResponse::new(200, r#"{"ok":true}"#)),
        ]));
        let refresher = refresher(Some("at_new"));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let client = client(session.clone(), transport.clone(), refresher.clone(), hook_calls.clone());

        let reply = client.execute(RequestDescriptor::get("/emails")).await.unwrap();
        assert!(matches!(reply, Reply::Structured(v) if v["ok"] == true));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            transport.bearers(),
            [
                Some("Bearer at_old".to_string()),
                Some("Bearer at_new".to_string())
            ]
        );
        assert_eq!(
            session.refresh_token().map(|t| t.expose().clone()).as_deref(),
            Some("at_new_rt")
        );
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_clears_session_and_fires_hook() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(401, ""))]));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let client = client(session.clone(), transport, refresher(None), hook_calls.clone());

        let err = client.execute(RequestDescriptor::get("/emails")).await.unwrap_err();
        assert!(matches!(err, Error::SessionExpired));
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_refresh_token_skips_refresh_call() {
        let session = signed_in_session(None).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(401, ""))]));
        let refresher = refresher(Some("never"));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let client = client(session.clone(), transport, refresher.clone(), hook_calls.clone());

        let err = client.execute(RequestDescriptor::get("/emails")).await.unwrap_err();
        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert!(!session.is_authenticated());
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_401_after_replay_is_terminal_without_teardown() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(401, "")),
            Ok(RawResponse::new(401, "")),
        ]));
        let refresher = refresher(Some("at_new"));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let client = client(session.clone(), transport.clone(), refresher.clone(), hook_calls.clone());

        let err = client.execute(RequestDescriptor::get("/emails")).await.unwrap_err();
        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.bearers().len(), 2);
        assert!(session.is_authenticated(), "second 401 must not tear down the session");
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn anonymous_401_is_unauthorized() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(401, ""))]));
        let refresher = refresher(Some("at_new"));
        let client = client(session.clone(), transport.clone(), refresher.clone(), Arc::default());

        let err = client
            .execute(RequestDescriptor::post("/auth/login").anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(transport.bearers(), [None]);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn non_auth_failures_are_local() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(RawResponse::new(403, "")),
            Ok(RawResponse::new(404, "")),
            Ok(RawResponse::new(502, "")),
            Ok(RawResponse::new(400, r#"{"message":"bad folder"}"#)),
            Err(TransportError::Connect("refused".into())),
        ]));
        let client = client(session.clone(), transport, refresher(None), Arc::default());

        let get = || RequestDescriptor::get("/emails");
        assert!(matches!(client.execute(get()).await, Err(Error::Forbidden)));
        assert!(matches!(client.execute(get()).await, Err(Error::NotFound)));
        assert!(matches!(client.execute(get()).await, Err(Error::Server { status: 502 })));
        match client.execute(get()).await {
            Err(Error::Unexpected { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad folder");
            }
            other => panic!("expected Unexpected, got {other:?}"),
        }
        assert!(matches!(client.execute(get()).await, Err(Error::Network(_))));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn execute_bytes_returns_undecoded_body() {
        let session = signed_in_session(Some("rt_old")).await;
        let body = vec![0u8, 159, 146, 150];
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(200, body.clone()))]));
        let client = client(session, transport, refresher(None), Arc::default());

        let bytes = client
            .execute_bytes(RequestDescriptor::get("/attachments/3/download"))
            .await
            .unwrap();
        assert_eq!(&bytes[..], &body[..]);
    }

    #[tokio::test]
    async fn execute_json_reports_decode_errors() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(200, "\"text\""))]));
        let client = client(session, transport, refresher(None), Arc::default());

        let result: Result<Vec<u64>> = client.execute_json(RequestDescriptor::get("/emails")).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn refreshed_waiters_replay_in_arrival_order() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(RotatingTransport::default());
        let refresher = Arc::new(SlowRefresher {
            delay: Duration::from_millis(300),
        });
        let client = AuthenticatedClient::builder(session, transport.clone(), refresher).build();

        let mut handles = Vec::new();
        for i in 0..5 {
            let c = client.clone();
            handles.push(tokio::spawn(async move {
                c.execute(RequestDescriptor::get(format!("/r{i}"))).await
            }));
            // Queue each request before issuing the next
            while client.coordinator().waiting() < i + 1 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let arrival: Vec<String> = (0..5).map(|i| format!("/r{i}")).collect();
        assert_eq!(transport.paths_sent_with("Bearer at_old"), arrival);
        assert_eq!(transport.paths_sent_with("Bearer at_new"), arrival);
    }

    #[tokio::test]
    async fn refresh_without_access_token_is_a_failed_refresh() {
        let session = signed_in_session(Some("rt_old")).await;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse::new(401, ""))]));
        let refresher = refresher(Some(""));
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let client = client(session.clone(), transport.clone(), refresher.clone(), hook_calls.clone());

        let err = client.execute(RequestDescriptor::get("/emails")).await.unwrap_err();
        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none(), "no half-cleared session");
        assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.bearers().len(), 1, "nothing replayed without a token");
    }
}
