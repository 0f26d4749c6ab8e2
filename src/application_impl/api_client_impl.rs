use crate::application_impl::TokenStore;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path prefixes sent without a bearer token and never refreshed.
    pub auth_paths: Vec<String>,
    /// Show the `message` of successful mutations as a success notice.
    pub notify_success: bool,
    pub success_duration: Option<Duration>,
}

/// Request/response interceptor pipeline over an [`HttpTransport`].
pub struct InterceptingApiClient {
    transport: Arc<dyn HttpTransport>,
    token_store: Arc<TokenStore>,
    coordinator: Arc<dyn RefreshCoordinator>,
    classifier: Arc<dyn ErrorClassifier>,
    sink: Arc<dyn NotificationSink>,
    config: PipelineConfig,
}

impl InterceptingApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        token_store: Arc<TokenStore>,
        coordinator: Arc<dyn RefreshCoordinator>,
        classifier: Arc<dyn ErrorClassifier>,
        sink: Arc<dyn NotificationSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transport,
            token_store,
            coordinator,
            classifier,
            sink,
            config,
        }
    }

    fn is_auth_endpoint(&self, path: &str) -> bool {
        self.config
            .auth_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// A token for the replay. When another request already rotated the
    /// stored token while this one was in flight, that token is reused
    /// instead of starting a second refresh.
    async fn renew(&self, sent_with: Option<&AccessToken>) -> Result<AccessToken, RefreshError> {
        if let (Some(stale), Some(current)) = (sent_with, self.token_store.access_token().await) {
            if current != *stale {
                debug!("token rotated while request was in flight");
                return Ok(current);
            }
        }
        self.coordinator.begin_or_join().await
    }

    fn notify_success(&self, request: &ApiRequest, response: &ApiResponse) {
        if !self.config.notify_success || !request.method.is_mutation() {
            return;
        }
        if let Some(message) = response.message() {
            self.sink
                .show(&Notice::success(message).with_duration(self.config.success_duration));
        }
    }
}

#[async_trait::async_trait]
impl ApiClient for InterceptingApiClient {
    async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let auth_endpoint = self.is_auth_endpoint(&request.path);

        // read at send time so a token stored moments ago is picked up
        let mut sent_with = None;
        if !auth_endpoint {
            sent_with = self.token_store.access_token().await;
            match &sent_with {
                Some(token) => request.set_header(AUTHORIZATION, token.bearer()),
                None => request.remove_header(AUTHORIZATION),
            }
        }

        loop {
            debug!(
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                retried = request.retried,
                "sending request"
            );
            let response = match self.transport.execute(&request).await {
                Ok(response) => response,
                Err(e) => return Err(self.classifier.handle(RequestFailure::Transport(e)).await),
            };

            if response.is_success() {
                self.notify_success(&request, &response);
                return Ok(response);
            }

            if response.status == 401 && !auth_endpoint && !request.retried {
                request.retried = true;
                let token = match self.renew(sent_with.as_ref()).await {
                    Ok(token) => token,
                    Err(e) => {
                        return Err(self
                            .classifier
                            .handle(RequestFailure::RefreshFailed(e))
                            .await);
                    }
                };
                debug!(request_id = %request.id, "replaying request with renewed token");
                request.set_header(AUTHORIZATION, token.bearer());
                sent_with = Some(token);
                continue;
            }

            debug!(request_id = %request.id, status = response.status, "request failed");
            let failure = RequestFailure::Status {
                status: response.status,
                payload: FailurePayload::from_body(&response.body),
            };
            return Err(self.classifier.handle(failure).await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::*;
    use crate::infra_local::*;
    use futures_util::future::join_all;
    use serde_json::json;
    use std::sync::Mutex;

    const REFRESH: &str = "/auth/refresh";

    /// A server that accepts one bearer token and rotates it on refresh.
    struct Backend {
        valid: Mutex<String>,
        next: Mutex<Vec<String>>,
        refresh_status: u16,
        rotates: bool,
    }

    impl Backend {
        fn new(valid: &str, next: &[&str], refresh_status: u16) -> Arc<Self> {
            Arc::new(Self {
                valid: Mutex::new(valid.into()),
                next: Mutex::new(next.iter().rev().map(|t| t.to_string()).collect()),
                refresh_status,
                rotates: true,
            })
        }

        /// Hands out tokens on refresh but keeps rejecting them.
        fn stubborn(valid: &str, next: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                valid: Mutex::new(valid.into()),
                next: Mutex::new(next.iter().rev().map(|t| t.to_string()).collect()),
                refresh_status: 200,
                rotates: false,
            })
        }

        fn respond(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            if request.path == REFRESH {
                if self.refresh_status != 200 {
                    return Ok(ApiResponse::new(self.refresh_status, json!({})));
                }
                let token = self.next.lock().unwrap().pop().expect("no refresh token left");
                if self.rotates {
                    *self.valid.lock().unwrap() = token.clone();
                }
                return Ok(ApiResponse::new(200, json!({ "accessToken": token })));
            }
            if request.path.starts_with("/auth/login") {
                return Ok(ApiResponse::new(
                    401,
                    json!({ "message": "Email not verified" }),
                ));
            }
            let expected = format!("Bearer {}", self.valid.lock().unwrap());
            if request.header(AUTHORIZATION) != Some(expected.as_str()) {
                return Ok(ApiResponse::new(401, json!({ "message": "Unauthorized" })));
            }
            match request.path.as_str() {
                "/boom" => Ok(ApiResponse::new(500, json!({ "message": "stack trace" }))),
                "/trips" if request.method == Method::Post => Ok(ApiResponse::new(
                    201,
                    json!({ "message": "Trip created", "data": { "id": "t-1" } }),
                )),
                _ => Ok(ApiResponse::new(200, json!({ "data": [] }))),
            }
        }
    }

    struct Harness {
        transport: Arc<FakeHttpTransport>,
        store: Arc<TokenStore>,
        sink: Arc<RecordingNotificationSink>,
        navigator: Arc<RecordingNavigator>,
        client: InterceptingApiClient,
    }

    async fn harness(backend: Arc<Backend>, stored: Option<&str>) -> Harness {
        let transport = Arc::new(
            FakeHttpTransport::new(move |request| backend.respond(request))
                .with_latency(Duration::from_millis(50)),
        );
        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new()), "auth_token"));
        if let Some(token) = stored {
            store.set(&TokenRecord::new(token, "u-1")).await.unwrap();
        }
        let sink = Arc::new(RecordingNotificationSink::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let debounced: Arc<dyn NotificationSink> = Arc::new(DebouncedNotificationSink::new(
            sink.clone(),
            Duration::from_secs(3),
            Arc::new(SystemClock),
        ));
        let refresher = Arc::new(HttpTokenRefresher::new(transport.clone(), REFRESH));
        let coordinator = Arc::new(SingleFlightRefreshCoordinator::new(refresher, store.clone()));
        let classifier = Arc::new(RealErrorClassifier::new(
            ClassifierConfig {
                login_route: "/auth/login".into(),
                redirect_delay: Duration::from_millis(1000),
                expected_auth_messages: vec!["email not verified".into()],
            },
            store.clone(),
            debounced.clone(),
            navigator.clone(),
        ));
        let client = InterceptingApiClient::new(
            transport.clone(),
            store.clone(),
            coordinator,
            classifier,
            debounced,
            PipelineConfig {
                auth_paths: vec!["/auth/login".into(), REFRESH.into()],
                notify_success: true,
                success_duration: None,
            },
        );
        Harness {
            transport,
            store,
            sink,
            navigator,
            client,
        }
    }

    fn bearers(requests: &[ApiRequest]) -> Vec<Option<String>> {
        requests
            .iter()
            .map(|r| r.header(AUTHORIZATION).map(str::to_owned))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn attaches_stored_token() {
        let h = harness(Backend::new("T1", &[], 200), Some("T1")).await;

        let response = h.client.send(ApiRequest::get("/trips")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            bearers(&h.transport.calls()),
            vec![Some("Bearer T1".to_owned())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_401s_share_one_refresh_and_replay_with_new_token() {
        let h = harness(Backend::new("T2", &["T2"], 200), Some("T1")).await;

        let results = join_all([
            h.client.send(ApiRequest::get("/trips")),
            h.client.send(ApiRequest::get("/blogs")),
        ])
        .await;

        for result in results {
            assert_eq!(result.unwrap().status, 200);
        }
        assert_eq!(h.transport.calls_to(REFRESH).len(), 1);

        let trips = bearers(&h.transport.calls_to("/trips"));
        let blogs = bearers(&h.transport.calls_to("/blogs"));
        assert_eq!(trips.last().unwrap().as_deref(), Some("Bearer T2"));
        assert_eq!(blogs.last().unwrap().as_deref(), Some("Bearer T2"));
        assert!(h.sink.shown().is_empty());

        // the next request carries the refreshed token
        h.client.send(ApiRequest::get("/trips")).await.unwrap();
        let trips = bearers(&h.transport.calls_to("/trips"));
        assert_eq!(trips.last().unwrap().as_deref(), Some("Bearer T2"));
        assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_401_replays_with_token_rotated_in_flight() {
        // refresh would fail, so a success proves it was never started
        let h = harness(Backend::new("T2", &[], 500), Some("T1")).await;

        let (result, _) = tokio::join!(h.client.send(ApiRequest::get("/trips")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.store.set(&TokenRecord::new("T2", "u-1")).await.unwrap();
        });

        assert_eq!(result.unwrap().status, 200);
        assert!(h.transport.calls_to(REFRESH).is_empty());
        assert_eq!(
            bearers(&h.transport.calls_to("/trips")),
            vec![Some("Bearer T1".to_owned()), Some("Bearer T2".to_owned())]
        );
        assert!(h.sink.shown().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_401_after_clear_falls_back_to_refresh() {
        let h = harness(Backend::new("T2", &["T2"], 200), Some("T1")).await;

        let (result, _) = tokio::join!(h.client.send(ApiRequest::get("/trips")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.store.clear().await.unwrap();
        });

        assert_eq!(result.unwrap().status, 200);
        assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
        assert_eq!(
            bearers(&h.transport.calls_to("/trips")),
            vec![Some("Bearer T1".to_owned()), Some("Bearer T2".to_owned())]
        );
        // no user is known after the clear, so the renewed token is not kept
        assert_eq!(h.store.get().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn replayed_request_is_not_retried_twice() {
        let h = harness(Backend::stubborn("T1-rejected", &["T2"]), Some("T1")).await;
        let backend_rejects_t2 = h.client.send(ApiRequest::get("/trips")).await;

        assert_eq!(backend_rejects_t2, Err(ClientError::SessionExpired));
        assert_eq!(h.transport.calls_to("/trips").len(), 2);
        assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
        assert_eq!(h.store.get().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_clears_session_and_redirects() {
        let h = harness(Backend::new("T2", &[], 500), Some("T1")).await;

        let results = join_all([
            h.client.send(ApiRequest::get("/trips")),
            h.client.send(ApiRequest::get("/trips")),
        ])
        .await;

        for result in results {
            assert_eq!(result, Err(ClientError::SessionExpired));
        }
        assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
        assert_eq!(h.store.get().await, None);
        assert_eq!(h.sink.count_of(SESSION_EXPIRED_MESSAGE), 1);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(h.navigator.routes(), vec!["/auth/login".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_endpoint_401_is_not_refreshed() {
        let h = harness(Backend::new("T1", &["T2"], 200), Some("T1")).await;

        let result = h
            .client
            .send(ApiRequest::post(
                "/auth/login",
                json!({ "email": "a@b.c", "password": "pw" }),
            ))
            .await;

        assert_eq!(
            result,
            Err(ClientError::Unauthorized("Email not verified".into()))
        );
        assert_eq!(bearers(&h.transport.calls()), vec![None]);
        assert!(h.transport.calls_to(REFRESH).is_empty());
        assert!(h.store.is_valid().await);
        assert_eq!(h.sink.shown(), vec![Notice::error("Email not verified")]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(h.navigator.routes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_generic_and_not_retried() {
        let h = harness(Backend::new("T1", &[], 200), Some("T1")).await;

        let result = h.client.send(ApiRequest::get("/boom")).await;

        assert_eq!(result, Err(ClientError::Server { status: 500 }));
        assert_eq!(h.transport.calls().len(), 1);
        assert_eq!(h.sink.shown(), vec![Notice::error(SERVER_ERROR_MESSAGE)]);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_rejects_with_network_error() {
        let transport = Arc::new(FakeHttpTransport::new(|_| {
            Err(TransportError::Connect("refused".into()))
        }));
        let store = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new()), "auth_token"));
        let sink = Arc::new(RecordingNotificationSink::new());
        let classifier = Arc::new(RealErrorClassifier::new(
            ClassifierConfig {
                login_route: "/auth/login".into(),
                redirect_delay: Duration::from_millis(1000),
                expected_auth_messages: Vec::new(),
            },
            store.clone(),
            sink.clone(),
            Arc::new(RecordingNavigator::new()),
        ));
        let coordinator = Arc::new(SingleFlightRefreshCoordinator::new(
            Arc::new(HttpTokenRefresher::new(transport.clone(), REFRESH)),
            store.clone(),
        ));
        let client = InterceptingApiClient::new(
            transport,
            store,
            coordinator,
            classifier,
            sink.clone(),
            PipelineConfig {
                auth_paths: Vec::new(),
                notify_success: false,
                success_duration: None,
            },
        );

        let result = client.send(ApiRequest::get("/trips")).await;

        assert!(matches!(result, Err(ClientError::Network(_))));
        assert_eq!(sink.shown(), vec![Notice::error(NETWORK_MESSAGE)]);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_message_is_shown_as_success() {
        let h = harness(Backend::new("T1", &[], 200), Some("T1")).await;

        h.client
            .send(ApiRequest::post("/trips", json!({ "title": "Lisbon" })))
            .await
            .unwrap();
        h.client.send(ApiRequest::get("/trips")).await.unwrap();

        assert_eq!(h.sink.shown(), vec![Notice::success("Trip created")]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_token_sends_no_header() {
        let h = harness(Backend::new("T1", &[], 500), None).await;

        let result = h
            .client
            .send(ApiRequest::get("/trips").with_header(AUTHORIZATION, "Bearer forged"))
            .await;

        assert_eq!(result, Err(ClientError::SessionExpired));
        assert_eq!(bearers(&h.transport.calls_to("/trips")), vec![None]);
    }
}
