//! The failover-aware endpoint pool (component B).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

use super::endpoint::EndpointHealth;
use crate::error::{CoreError, CoreResult, NetworkError};
use crate::rpc::{AlloyRpcClient, StreamingRpcClient};

/// Builds a connected [`StreamingRpcClient`] for a given URL.
///
/// Exists so tests can swap in a factory that hands out scriptable mock
/// clients instead of dialing a real WebSocket.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Connect to `url`, applying `request_timeout` to the handshake.
    async fn connect(&self, url: &str, request_timeout: Duration) -> CoreResult<Arc<dyn StreamingRpcClient>>;
}

/// Production factory: dials a real WebSocket via alloy.
#[derive(Debug, Default)]
pub struct AlloyClientFactory;

#[async_trait]
impl ClientFactory for AlloyClientFactory {
    async fn connect(&self, url: &str, request_timeout: Duration) -> CoreResult<Arc<dyn StreamingRpcClient>> {
        let client = AlloyRpcClient::connect(url, request_timeout).await?;
        Ok(Arc::new(client))
    }
}

type ReconnectCallback = Box<dyn Fn(Arc<dyn StreamingRpcClient>) + Send + Sync>;

struct PoolState {
    current_index: usize,
    current_client: Option<Arc<dyn StreamingRpcClient>>,
    current_endpoint: Option<String>,
}

/// Owns the ring of configured endpoints and the single active client.
///
/// See the module-level contract: `Connect` never fails except when the
/// pool has been [`EndpointPool::destroy`]ed; transient failures are
/// absorbed by rotation and exponential backoff.
pub struct EndpointPool {
    endpoints: Vec<String>,
    health: HashMap<String, Mutex<EndpointHealth>>,
    state: Mutex<PoolState>,
    connect_lock: tokio::sync::Mutex<()>,
    reconnect_callbacks: Mutex<Vec<ReconnectCallback>>,
    factory: Arc<dyn ClientFactory>,
    base_delay: Duration,
    max_cooldown: Duration,
    request_timeout: Duration,
    destroyed: AtomicBool,
    destroy_notify: Notify,
}

impl std::fmt::Debug for EndpointPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointPool")
            .field("endpoints", &self.endpoints)
            .field("destroyed", &self.destroyed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl EndpointPool {
    /// Construct a pool over `endpoints`, tried in order with failover.
    ///
    /// # Panics
    /// Panics if `endpoints` is empty; callers must validate via
    /// [`crate::config::Config`] before constructing a pool.
    #[must_use]
    pub fn new(
        endpoints: Vec<String>,
        factory: Arc<dyn ClientFactory>,
        base_delay: Duration,
        max_cooldown: Duration,
        request_timeout: Duration,
    ) -> Self {
        assert!(!endpoints.is_empty(), "pool requires at least one endpoint");

        let health = endpoints
            .iter()
            .map(|url| (url.clone(), Mutex::new(EndpointHealth::new())))
            .collect();

        Self {
            endpoints,
            health,
            state: Mutex::new(PoolState {
                current_index: 0,
                current_client: None,
                current_endpoint: None,
            }),
            connect_lock: tokio::sync::Mutex::new(()),
            reconnect_callbacks: Mutex::new(Vec::new()),
            factory,
            base_delay,
            max_cooldown,
            request_timeout,
            destroyed: AtomicBool::new(false),
            destroy_notify: Notify::new(),
        }
    }

    /// Register a callback invoked, in registration order, after every
    /// successful (re)connection.
    pub fn on_reconnect<F>(&self, callback: F)
    where
        F: Fn(Arc<dyn StreamingRpcClient>) + Send + Sync + 'static,
    {
        self.reconnect_callbacks.lock().push(Box::new(callback));
    }

    /// The currently active client, if connected.
    #[must_use]
    pub fn current_client(&self) -> Option<Arc<dyn StreamingRpcClient>> {
        self.state.lock().current_client.clone()
    }

    /// The URL of the currently active endpoint, if connected.
    #[must_use]
    pub fn current_endpoint(&self) -> Option<String> {
        self.state.lock().current_endpoint.clone()
    }

    /// Snapshot of every endpoint's health.
    #[must_use]
    pub fn status(&self) -> Vec<(String, EndpointHealth)> {
        self.endpoints
            .iter()
            .map(|url| (url.clone(), *self.health[url].lock()))
            .collect()
    }

    /// Tear the pool down: drop the client, wake any waiting `connect`.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        {
            let mut state = self.state.lock();
            state.current_client = None;
            state.current_endpoint = None;
        }
        self.destroy_notify.notify_waiters();
    }

    /// Block until a client is up, rotating through endpoints and waiting
    /// out cooldowns as needed. Never fails unless the pool is destroyed.
    ///
    /// # Errors
    /// Returns `CoreError::PoolDestroyed` if [`Self::destroy`] was called.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> CoreResult<Arc<dyn StreamingRpcClient>> {
        if let Some(client) = self.current_client() {
            return Ok(client);
        }
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(CoreError::PoolDestroyed);
        }

        let _guard = self.connect_lock.lock().await;

        if let Some(client) = self.current_client() {
            return Ok(client);
        }

        loop {
            if self.destroyed.load(Ordering::SeqCst) {
                return Err(CoreError::PoolDestroyed);
            }

            if let Some((client, url)) = self.try_connect_one_round().await {
                self.adopt(client.clone(), url);
                self.fire_reconnect_callbacks(&client);
                return Ok(client);
            }

            let wait = self.earliest_cooldown_wait();
            warn!(wait_secs = wait.as_secs(), "all endpoints cooling down, backing off");
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = self.destroy_notify.notified() => {
                    return Err(CoreError::PoolDestroyed);
                }
            }
        }
    }

    /// Invoked by a disconnect handler: drop the current client and connect anew.
    ///
    /// # Errors
    /// Returns `CoreError::PoolDestroyed` if the pool has been torn down.
    pub async fn reconnect(&self) -> CoreResult<Arc<dyn StreamingRpcClient>> {
        {
            let mut state = self.state.lock();
            state.current_client = None;
            state.current_endpoint = None;
            state.current_index = (state.current_index + 1) % self.endpoints.len();
        }
        self.connect().await
    }

    /// Background health-probe tick: probe non-active, non-Down, cooled-down
    /// endpoints; also clear stale degradation on a still-active endpoint.
    #[instrument(skip(self))]
    pub async fn run_health_probe_tick(&self) {
        let now = Utc::now();
        let active_endpoint = self.current_endpoint();

        for url in &self.endpoints {
            if Some(url) == active_endpoint.as_ref() {
                let mut health = self.health[url].lock();
                health.reset_fail_count_if_recently_successful(now, now - chrono::Duration::from_std(self.health_check_interval_hint()).unwrap_or_default());
                continue;
            }

            let eligible = {
                let health = self.health[url].lock();
                !matches!(health.status, crate::types::EndpointStatus::Healthy) && health.is_available(now)
            };
            if !eligible {
                continue;
            }

            match self.factory.connect(url, self.request_timeout).await {
                Ok(client) => match client.block_number().await {
                    Ok(_) => {
                        self.health[url].lock().record_success(Utc::now());
                        debug!(url, "background probe succeeded");
                    }
                    Err(e) => debug!(url, error = ?e, "background probe failed"),
                },
                Err(e) => debug!(url, error = ?e, "background probe connect failed"),
            }
        }
    }

    /// Small helper: the interval value is owned by the orchestrator's timer,
    /// not the pool itself, but the "since" window for the active-endpoint
    /// reset needs *some* bound. Using the cooldown base as a proxy keeps
    /// this self-contained without threading the scheduler's interval in.
    const fn health_check_interval_hint(&self) -> Duration {
        self.base_delay
    }

    async fn try_connect_one_round(&self) -> Option<(Arc<dyn StreamingRpcClient>, String)> {
        let attempts = self.endpoints.len();
        let mut index = self.state.lock().current_index;

        for _ in 0..attempts {
            let url = &self.endpoints[index];
            let now = Utc::now();
            let available = self.health[url].lock().is_available(now);

            if available {
                match self.factory.connect(url, self.request_timeout).await {
                    Ok(client) => match client.block_number().await {
                        Ok(_) => {
                            self.health[url].lock().record_success(Utc::now());
                            return Some((client, url.clone()));
                        }
                        Err(e) => {
                            self.record_failure(url, &e);
                        }
                    },
                    Err(e) => {
                        self.record_failure(url, &e);
                    }
                }
            }

            index = (index + 1) % self.endpoints.len();
        }

        None
    }

    fn record_failure(&self, url: &str, error: &CoreError) {
        if NetworkError::looks_like_rate_limit(&error.to_string()) {
            warn!(url, error = ?error, reason = "rate_limited", "endpoint attempt failed, rotating");
        } else {
            warn!(url, error = ?error, "endpoint attempt failed");
        }
        self.health[url]
            .lock()
            .record_failure(Utc::now(), self.base_delay, self.max_cooldown);
    }

    fn earliest_cooldown_wait(&self) -> Duration {
        let now = Utc::now();
        self.endpoints
            .iter()
            .filter_map(|url| self.health[url].lock().next_available_time)
            .map(|t| (t - now).to_std().unwrap_or(Duration::ZERO))
            .min()
            .unwrap_or(self.base_delay)
    }

    fn adopt(&self, client: Arc<dyn StreamingRpcClient>, url: String) {
        let mut state = self.state.lock();
        let index = self.endpoints.iter().position(|e| *e == url).unwrap_or(0);
        state.current_index = index;
        state.current_client = Some(client);
        state.current_endpoint = Some(url.clone());
        info!(url, "endpoint connected");
        metrics::counter!("sentinel_endpoint_connections_total", "endpoint" => url).increment(1);
    }

    fn fire_reconnect_callbacks(&self, client: &Arc<dyn StreamingRpcClient>) {
        let callbacks = self.reconnect_callbacks.lock();
        for callback in callbacks.iter() {
            callback(Arc::clone(client));
        }
    }
}
