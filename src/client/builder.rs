use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::debug;

use super::ClientInner;
use super::TelemetryClient;
use crate::metrics::init_metrics;
use crate::metrics::QUEUE_DEPTH;
use crate::ClientContext;
use crate::DwellTimerRegistry;
use crate::EngagementPolicy;
use crate::EventQueue;
use crate::FileSessionStore;
use crate::FlushScheduler;
use crate::HttpTransport;
use crate::MemorySessionStore;
use crate::Result;
use crate::SessionIdentityProvider;
use crate::SessionStore;
use crate::TelemetryConfig;
use crate::Transport;

pub struct TelemetryClientBuilder {
    config: TelemetryConfig,
    transport: Option<Arc<dyn Transport>>,
    session_store: Option<Arc<dyn SessionStore>>,
    client_context: Option<ClientContext>,
    runtime: Option<Handle>,
}

impl TelemetryClientBuilder {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            transport: None,
            session_store: None,
            client_context: None,
            runtime: None,
        }
    }

    /// Replaces the default HTTP transport
    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
    ) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default session store
    /// (file-backed when `session.store_dir` is set, in-memory otherwise)
    pub fn session_store(
        mut self,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        self.session_store = Some(store);
        self
    }

    /// User agent and referrer attached to every event
    pub fn client_context(
        mut self,
        context: ClientContext,
    ) -> Self {
        self.client_context = Some(context);
        self
    }

    /// Runtime used for timers and background deliveries.
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(
        mut self,
        runtime: Handle,
    ) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// The session id is resolved here, so the first tracking call does
    /// not touch the session store.
    pub fn build(self) -> Result<TelemetryClient> {
        let config = self.config.validate()?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config.endpoint, runtime.clone())?),
        };

        let store: Arc<dyn SessionStore> = match (self.session_store, &config.session.store_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(FileSessionStore::new(dir)),
            (None, None) => Arc::new(MemorySessionStore::new()),
        };
        let session = SessionIdentityProvider::new(store, config.session.storage_key.clone());
        let session_id = session.session_id().to_string();

        init_metrics();
        let queue_depth = QUEUE_DEPTH.with_label_values(&[session_id.as_str()]);

        let inner = ClientInner {
            queue: EventQueue::new(),
            scheduler: FlushScheduler::new(config.batching.flush_interval(), runtime.clone()),
            dwell: DwellTimerRegistry::new(),
            engagement: EngagementPolicy::new(config.engagement.bounce_threshold()),
            session,
            transport,
            context: RwLock::new(self.client_context),
            runtime,
            queue_depth,
            shut_down: AtomicBool::new(false),
            listening: AtomicBool::new(false),
            config,
        };
        debug!(session_id = %session_id, "telemetry client ready: {:?}", inner.config);

        Ok(TelemetryClient { inner: Arc::new(inner) })
    }
}
