//! Wires every component together and drives the process lifecycle (component F).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::continuity::{BlockContinuityEngine, BlockSink, ReconnectOutcome};
use crate::error::{CoreResult, NetworkError};
use crate::pipeline::{BlockProcessor, DedupSet, PendingProcessor};
use crate::ports::{Clock, Sink, SystemClock};
use crate::pool::{AlloyClientFactory, ClientFactory, EndpointPool};
use crate::rpc::StreamingRpcClient;
use crate::types::BlockNumber;

enum ContinuityCommand {
    NewBlock(u64),
    Reconnected(Arc<dyn StreamingRpcClient>),
}

/// Owns the endpoint pool, the continuity engine, and the two watcher tasks,
/// and keeps them consistent across reconnection.
pub struct Orchestrator {
    config: Arc<Config>,
    pool: Arc<EndpointPool>,
    continuity: Arc<BlockContinuityEngine>,
    continuity_tx: mpsc::Sender<ContinuityCommand>,
    dedup: DedupSet,
    sink: Arc<dyn Sink>,
    clock: Arc<dyn Clock>,
    pending_enabled: AtomicBool,
    head_token: SyncMutex<CancellationToken>,
    pending_token: SyncMutex<CancellationToken>,
}

impl Orchestrator {
    /// Build every component from `config`, connect the endpoint pool, and
    /// bring up both watchers. Does not return until shut down via `shutdown_token`.
    ///
    /// # Errors
    /// Returns a `CoreError` if the pool cannot establish an initial
    /// connection (e.g. it was destroyed before `connect` returned).
    pub async fn run(config: Config, sink: Arc<dyn Sink>, shutdown_token: CancellationToken) -> CoreResult<()> {
        let config = Arc::new(config);
        let dedup = DedupSet::new(config.dedup_retention);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let endpoints = dedup_endpoints(&config.endpoints);
        let pool = Arc::new(EndpointPool::new(
            endpoints,
            Arc::new(AlloyClientFactory) as Arc<dyn ClientFactory>,
            config.base_delay,
            config.max_cooldown,
            config.request_timeout,
        ));

        let client = pool.connect().await?;

        let block_processor = Arc::new(BlockProcessor::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            dedup.clone(),
            Arc::clone(&sink),
        ));
        let continuity = Arc::new(BlockContinuityEngine::new(
            Arc::clone(&client),
            block_processor as Arc<dyn BlockSink>,
        ));
        continuity.initialize().await?;

        let (continuity_tx, continuity_rx) = mpsc::channel(256);

        let orchestrator = Arc::new(Self {
            config,
            pool: Arc::clone(&pool),
            continuity: Arc::clone(&continuity),
            continuity_tx,
            dedup,
            sink,
            clock,
            pending_enabled: AtomicBool::new(true),
            head_token: SyncMutex::new(CancellationToken::new()),
            pending_token: SyncMutex::new(CancellationToken::new()),
        });

        spawn_continuity_task(Arc::clone(&continuity), Arc::clone(&pool), continuity_rx);

        let orchestrator_for_callback = Arc::clone(&orchestrator);
        pool.on_reconnect(move |new_client| {
            orchestrator_for_callback.on_reconnect(new_client);
        });

        orchestrator.spawn_watchers(Arc::clone(&client));
        orchestrator.spawn_health_probe_loop();

        shutdown_token.cancelled().await;
        info!("shutdown requested, tearing down");
        orchestrator.head_token.lock().cancel();
        orchestrator.pending_token.lock().cancel();
        pool.destroy();

        Ok(())
    }

    fn on_reconnect(&self, new_client: Arc<dyn StreamingRpcClient>) {
        info!("pool reconnected, tearing down old subscriptions");
        self.head_token.lock().cancel();
        self.pending_token.lock().cancel();

        let tx = self.continuity_tx.clone();
        let client_for_continuity = Arc::clone(&new_client);
        tokio::spawn(async move {
            if tx.send(ContinuityCommand::Reconnected(client_for_continuity)).await.is_err() {
                error!("continuity task gone, dropping reconnect notification");
            }
        });

        self.spawn_watchers(new_client);
    }

    fn spawn_watchers(self: &Arc<Self>, client: Arc<dyn StreamingRpcClient>) {
        let head_token = CancellationToken::new();
        *self.head_token.lock() = head_token.clone();
        let pending_token = CancellationToken::new();
        *self.pending_token.lock() = pending_token.clone();

        let head_client = Arc::clone(&client);
        let continuity_tx = self.continuity_tx.clone();
        tokio::spawn(async move {
            run_head_watcher(head_client, continuity_tx, head_token).await;
        });

        if self.pending_enabled.load(Ordering::SeqCst) {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.run_pending_watcher(client, pending_token).await;
            });
        }
    }

    async fn run_pending_watcher(self: Arc<Self>, client: Arc<dyn StreamingRpcClient>, token: CancellationToken) {
        let stream = match client.subscribe_pending_tx_hashes().await {
            Ok(stream) => stream,
            Err(e) => {
                if matches!(&e, crate::error::CoreError::Network(NetworkError::PendingUnsupported(_))) {
                    warn!("mempool subscription unsupported by this endpoint, disabling pending monitoring");
                    self.pending_enabled.store(false, Ordering::SeqCst);
                } else {
                    error!(error = ?e, "failed to subscribe to pending transactions");
                }
                return;
            }
        };

        let processor = PendingProcessor::new(
            Arc::clone(&self.config),
            Arc::clone(&self.clock),
            self.dedup.clone(),
            Arc::clone(&self.sink),
            client,
        );

        let guarded = stream.take_until(token.cancelled());
        processor.run(guarded).await;
    }

    fn spawn_health_probe_loop(self: &Arc<Self>) {
        let pool = Arc::clone(&self.pool);
        let interval = self.config.health_check_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                pool.run_health_probe_tick().await;
            }
        });
    }
}

async fn run_head_watcher(client: Arc<dyn StreamingRpcClient>, continuity_tx: mpsc::Sender<ContinuityCommand>, token: CancellationToken) {
    let stream = match client.subscribe_new_heads().await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = ?e, "failed to subscribe to new heads");
            return;
        }
    };

    let mut guarded = stream.take_until(token.cancelled());
    while let Some(number) = guarded.next().await {
        if continuity_tx.send(ContinuityCommand::NewBlock(number)).await.is_err() {
            break;
        }
    }
}

fn spawn_continuity_task(continuity: Arc<BlockContinuityEngine>, pool: Arc<EndpointPool>, mut rx: mpsc::Receiver<ContinuityCommand>) {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                ContinuityCommand::NewBlock(n) => {
                    if let Err(e) = continuity.process_new_block(BlockNumber::new(n)).await {
                        error!(block = n, error = ?e, "failed to process new block, triggering pool failover");
                        let pool = Arc::clone(&pool);
                        tokio::spawn(async move {
                            if let Err(e) = pool.reconnect().await {
                                error!(error = ?e, "pool failover after block-processing failure did not recover");
                            }
                        });
                    }
                }
                ContinuityCommand::Reconnected(client) => match continuity.handle_reconnection(client).await {
                    Ok(ReconnectOutcome::PossibleReorg { new_tip }) => {
                        warn!(new_tip = new_tip.get(), "reconnection revealed a possible reorg");
                    }
                    Ok(_) => {}
                    Err(e) => error!(error = ?e, "failed to reconcile continuity after reconnection"),
                },
            }
        }
    });
}

fn dedup_endpoints(endpoints: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    endpoints
        .iter()
        .filter(|url| seen.insert((*url).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_endpoints_preserves_order_and_drops_repeats() {
        let endpoints = vec!["wss://a".to_string(), "wss://b".to_string(), "wss://a".to_string()];
        assert_eq!(dedup_endpoints(&endpoints), vec!["wss://a", "wss://b"]);
    }
}
