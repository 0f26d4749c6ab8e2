use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_http::*;
use crate::infra_local::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;

/// UI-side collaborators supplied by the embedding application.
pub struct Frontend {
    pub sink: Arc<dyn NotificationSink>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

impl Frontend {
    /// Notices and navigation end up in the log.
    pub fn tracing() -> Self {
        Self {
            sink: Arc::new(TracingNotificationSink::new()),
            navigator: Arc::new(TracingNavigator::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

pub struct Client {
    pub api: Arc<dyn ApiClient>,
    pub session: Arc<dyn SessionService>,
    pub token_store: Arc<TokenStore>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl Client {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let storage: Arc<dyn KeyValueStorage> = match settings.storage.backend.as_str() {
            "memory" => Arc::new(MemoryStorage::new()),
            "file" => Arc::new(FileStorage::new(&settings.storage.path)),
            "redis" => {
                let dsn = settings
                    .storage
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("storage.redis_dsn is required for the redis backend"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisKeyValueStorage::new(
                    redis_manager,
                    settings.storage.redis_prefix.clone(),
                    settings.storage.redis_ttl_secs,
                ))
            }
            other => return Err(anyhow!("Unknown storage backend: {}", other)),
        };

        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::try_new(
            &settings.api.base_url,
            Duration::from_secs(settings.api.timeout_secs),
        )?);

        let client = Self::assemble(settings, storage, transport, Frontend::tracing());
        info!(
            base_url = %settings.api.base_url,
            storage = %settings.storage.backend,
            "client ready"
        );
        Ok(client)
    }

    /// Wires the pipeline from already-built adapters.
    pub fn assemble(
        settings: &Settings,
        storage: Arc<dyn KeyValueStorage>,
        transport: Arc<dyn HttpTransport>,
        frontend: Frontend,
    ) -> Self {
        let token_store = Arc::new(TokenStore::new(storage, settings.auth.token_key.clone()));

        let sink: Arc<dyn NotificationSink> = Arc::new(DebouncedNotificationSink::new(
            frontend.sink,
            Duration::from_millis(settings.notify.debounce_ms),
            frontend.clock,
        ));

        let refresher: Arc<dyn TokenRefresher> = Arc::new(HttpTokenRefresher::new(
            transport.clone(),
            settings.auth.refresh_path.clone(),
        ));
        let coordinator: Arc<dyn RefreshCoordinator> = Arc::new(
            SingleFlightRefreshCoordinator::new(refresher, token_store.clone()),
        );

        let classifier: Arc<dyn ErrorClassifier> = Arc::new(RealErrorClassifier::new(
            ClassifierConfig {
                login_route: settings.auth.login_route.clone(),
                redirect_delay: Duration::from_millis(settings.auth.redirect_delay_ms),
                expected_auth_messages: settings.auth.expected_messages.clone(),
            },
            token_store.clone(),
            sink.clone(),
            frontend.navigator,
        ));

        let api: Arc<dyn ApiClient> = Arc::new(InterceptingApiClient::new(
            transport,
            token_store.clone(),
            coordinator,
            classifier.clone(),
            sink,
            PipelineConfig {
                auth_paths: settings.auth.public_paths.clone(),
                notify_success: settings.notify.success,
                success_duration: settings.notify.success_duration_ms.map(Duration::from_millis),
            },
        ));

        let session: Arc<dyn SessionService> = Arc::new(RealSessionService::new(
            api.clone(),
            token_store.clone(),
            SessionPaths {
                login: settings.auth.login_path.clone(),
                logout: settings.auth.logout_path.clone(),
            },
        ));

        Self {
            api,
            session,
            token_store,
            classifier,
        }
    }

    /// Lets scheduled side effects, the post-teardown redirect included, run
    /// before the process exits.
    pub async fn settle(&self) {
        self.classifier.finish_pending().await;
    }
}
