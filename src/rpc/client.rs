//! Trait definition and the Alloy-backed implementation of the streaming RPC client.

use std::pin::Pin;
use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::error::{CoreError, CoreResult, NetworkError};
use crate::types::{BlockNumber, EthAddress, FetchedBlock, RawTransaction, TxHash, WeiAmount};

/// JSON-RPC "method not found" error code (JSON-RPC 2.0 spec §5.1).
const JSON_RPC_METHOD_NOT_FOUND: i64 = -32601;

/// Stream of newly observed head block numbers.
pub type HeadStream = Pin<Box<dyn Stream<Item = u64> + Send>>;

/// Stream of pending transaction hashes observed in the mempool.
pub type PendingHashStream = Pin<Box<dyn Stream<Item = TxHash> + Send>>;

/// A narrow capability set over one persistent connection to an RPC endpoint.
///
/// All methods share the same underlying connection; a closed or errored
/// connection surfaces as an `Err(NetworkError)` from whichever call notices
/// first, or as stream termination for the two subscriptions. Either signal
/// is treated identically by the endpoint pool: the client is considered
/// failed and is dropped.
#[async_trait]
pub trait StreamingRpcClient: Send + Sync {
    /// Current chain head.
    async fn block_number(&self) -> CoreResult<u64>;

    /// Fetch a full block, including transaction bodies.
    async fn get_block(&self, number: u64) -> CoreResult<Option<FetchedBlock>>;

    /// Fetch a single transaction by hash.
    async fn get_transaction(&self, hash: TxHash) -> CoreResult<Option<RawTransaction>>;

    /// Subscribe to new block heads; yields at least the block number of each.
    async fn subscribe_new_heads(&self) -> CoreResult<HeadStream>;

    /// Subscribe to pending transaction hashes.
    ///
    /// # Errors
    /// Returns `NetworkError::PendingUnsupported` if the endpoint doesn't
    /// offer this subscription, which the orchestrator treats as non-fatal.
    async fn subscribe_pending_tx_hashes(&self) -> CoreResult<PendingHashStream>;
}

/// Alloy-backed implementation of [`StreamingRpcClient`] over a WebSocket connection.
pub struct AlloyRpcClient<P> {
    provider: P,
    request_timeout: Duration,
}

impl<P> std::fmt::Debug for AlloyRpcClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyRpcClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl AlloyRpcClient<alloy::providers::RootProvider> {
    /// Connect to an endpoint over `ws://`/`wss://`.
    ///
    /// # Errors
    /// Returns `NetworkError` if the socket can't be established within
    /// `request_timeout`.
    #[instrument(skip(request_timeout))]
    pub async fn connect(url: &str, request_timeout: Duration) -> CoreResult<Self> {
        let ws = WsConnect::new(url);
        let provider = timeout(request_timeout, ProviderBuilder::new().connect_ws(ws))
            .await
            .map_err(|_| NetworkError::Timeout(request_timeout))?
            .map_err(classify_transport_error)?;

        debug!(url, "connected rpc client");
        Ok(Self {
            provider,
            request_timeout,
        })
    }
}

impl<P> AlloyRpcClient<P>
where
    P: Provider + Clone,
{
    /// Wrap an already-connected provider (used by tests with a mock transport).
    pub const fn from_provider(provider: P, request_timeout: Duration) -> Self {
        Self {
            provider,
            request_timeout,
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> CoreResult<T>
    where
        F: std::future::Future<Output = Result<T, alloy::transports::RpcError<alloy::transports::TransportErrorKind>>>,
    {
        match timeout(self.request_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_transport_error(e).into()),
            Err(_) => Err(NetworkError::Timeout(self.request_timeout).into()),
        }
    }
}

/// Classify a raw transport error into its `NetworkError` variant.
///
/// A structured JSON-RPC error response is trusted directly when present
/// (rate-limit code `429`); everything else falls back to a substring match
/// on the error's display text.
fn classify_transport_error(
    e: alloy::transports::RpcError<alloy::transports::TransportErrorKind>,
) -> NetworkError {
    if let alloy::transports::RpcError::ErrorResp(ref payload) = e {
        if payload.code == 429 || NetworkError::looks_like_rate_limit(payload.message.as_ref()) {
            return NetworkError::RateLimited(payload.message.to_string());
        }
    }
    let message = e.to_string();
    if NetworkError::looks_like_rate_limit(&message) {
        return NetworkError::RateLimited(message);
    }
    NetworkError::Transport(Box::new(e))
}

#[async_trait]
impl<P> StreamingRpcClient for AlloyRpcClient<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn block_number(&self) -> CoreResult<u64> {
        self.with_timeout(self.provider.get_block_number()).await
    }

    async fn get_block(&self, number: u64) -> CoreResult<Option<FetchedBlock>> {
        let block = self
            .with_timeout(
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .full(),
            )
            .await?;

        let Some(block) = block else {
            return Ok(None);
        };

        let transactions = block
            .transactions
            .into_transactions()
            .map(|tx| raw_transaction_from_alloy(&tx, Some(BlockNumber::new(number))))
            .collect();

        Ok(Some(FetchedBlock {
            number: BlockNumber::new(number),
            transactions,
        }))
    }

    async fn get_transaction(&self, hash: TxHash) -> CoreResult<Option<RawTransaction>> {
        let tx = self
            .with_timeout(self.provider.get_transaction_by_hash(hash.inner()))
            .await?;

        Ok(tx.map(|tx| raw_transaction_from_alloy(&tx, None)))
    }

    async fn subscribe_new_heads(&self) -> CoreResult<HeadStream> {
        let subscription = self
            .with_timeout(self.provider.subscribe_blocks())
            .await?;

        let stream = subscription.into_stream().map(|header| header.number);
        Ok(Box::pin(stream))
    }

    async fn subscribe_pending_tx_hashes(&self) -> CoreResult<PendingHashStream> {
        let subscription = self
            .provider
            .subscribe_pending_transactions()
            .await
            .map_err(|e| {
                // Method-not-found is the structured signal a provider gives
                // when it simply doesn't expose this subscription; trust it
                // over the substring match whenever it's present.
                if let alloy::transports::RpcError::ErrorResp(ref payload) = e {
                    if payload.code == JSON_RPC_METHOD_NOT_FOUND || NetworkError::looks_like_unsupported(payload.message.as_ref()) {
                        return NetworkError::PendingUnsupported(payload.message.to_string());
                    }
                }
                let message = e.to_string();
                if NetworkError::looks_like_unsupported(&message) {
                    NetworkError::PendingUnsupported(message)
                } else {
                    classify_transport_error(e)
                }
            })?;

        let stream = subscription.into_stream().map(TxHash::from);
        Ok(Box::pin(stream))
    }
}

fn raw_transaction_from_alloy(
    tx: &alloy::rpc::types::Transaction,
    block_number: Option<BlockNumber>,
) -> RawTransaction {
    RawTransaction {
        hash: TxHash::from(*tx.inner.tx_hash()),
        from: EthAddress::from(tx.inner.signer()),
        to: tx.inner.to().map(EthAddress::from),
        value: WeiAmount::from_u256(tx.inner.value()),
        block_number,
    }
}
