//! Transaction Sequencer
//!
//! One `TxSender` per destination chain. It owns the chain's nonce state and
//! turns batch items into signed, correctly ordered transactions.
//!
//! Send flow for one batch:
//! 1. Lock the chain state (same-chain batches run one after another)
//! 2. Encode every item, skipping items that cannot be encoded
//! 3. Route, build, nonce, sign and submit each payload in order
//! 4. Return the submitted hashes

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::encoder::EncoderRegistry;
use crate::models::{BridgeBatchItem, ChainId, EncodedPayload};
use crate::payload_router::PayloadRouter;
use crate::rpc::{NetworkConfig, NonceHandler, Proxy, ProxyError, Transaction};
use crate::wallet::Wallet;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default number of attempts to get a usable nonce
pub const DEFAULT_MAX_RETRIES_GET_ACCOUNT: u32 = 10;

/// Default backoff unit; attempt `n` sleeps `2^n * base`
pub const DEFAULT_RETRY_BASE_MS: u64 = 50;

/// Exponent cap so the backoff cannot overflow
const MAX_BACKOFF_EXPONENT: u32 = 16;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxSenderError {
    /// Constructed with zero nonce attempts
    ZeroRetries,
    /// Network configuration could not be fetched
    NetworkConfig(ProxyError),
    /// No usable nonce after every attempt
    CannotSyncAccountState { attempts: u32, last_error: String },
    /// Nonce service failed in a way retrying cannot fix
    NonceFatal(ProxyError),
    /// Transaction submission failed
    Submission(ProxyError),
}

impl std::fmt::Display for TxSenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxSenderError::ZeroRetries => write!(f, "Max retries for getting account must be greater than zero"),
            TxSenderError::NetworkConfig(e) => write!(f, "Cannot get network config: {}", e),
            TxSenderError::CannotSyncAccountState { attempts, last_error } => {
                write!(f, "Cannot sync account state after {} attempts: {}", attempts, last_error)
            }
            TxSenderError::NonceFatal(e) => write!(f, "Cannot apply nonce: {}", e),
            TxSenderError::Submission(e) => write!(f, "Cannot send transaction: {}", e),
        }
    }
}

impl std::error::Error for TxSenderError {}

// ============================================================================
// BATCH SENDER TRAIT
// ============================================================================

/// Anything that can deliver a chain's share of a request
#[async_trait]
pub trait BatchSender: Send + Sync {
    async fn send_batch(&self, items: Vec<BridgeBatchItem>) -> Result<Vec<String>, TxSenderError>;
}

// ============================================================================
// CHAIN STATE
// ============================================================================

/// Mutable per-chain state, only touched while holding the chain lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSenderState {
    /// Lowest nonce the next transaction may use
    pub expected_nonce: u64,
}

/// Outcome of one nonce attempt
enum NonceAttempt {
    Ready,
    Retry(String),
    Fatal(ProxyError),
}

// ============================================================================
// TX SENDER
// ============================================================================

pub struct TxSenderArgs {
    pub chain_id: ChainId,
    pub wallet: Arc<dyn Wallet>,
    pub proxy: Arc<dyn Proxy>,
    pub nonce_handler: Arc<dyn NonceHandler>,
    pub encoders: Arc<EncoderRegistry>,
    pub router: PayloadRouter,
    pub max_retries_get_account: u32,
    pub retry_base: Duration,
}

pub struct TxSender {
    chain_id: ChainId,
    wallet: Arc<dyn Wallet>,
    proxy: Arc<dyn Proxy>,
    nonce_handler: Arc<dyn NonceHandler>,
    encoders: Arc<EncoderRegistry>,
    router: PayloadRouter,
    max_retries_get_account: u32,
    retry_base: Duration,
    state: Mutex<ChainSenderState>,
}

impl TxSender {
    pub fn new(args: TxSenderArgs) -> Result<Self, TxSenderError> {
        if args.max_retries_get_account == 0 {
            return Err(TxSenderError::ZeroRetries);
        }

        Ok(Self {
            chain_id: args.chain_id,
            wallet: args.wallet,
            proxy: args.proxy,
            nonce_handler: args.nonce_handler,
            encoders: args.encoders,
            router: args.router,
            max_retries_get_account: args.max_retries_get_account,
            retry_base: args.retry_base,
            state: Mutex::new(ChainSenderState::default()),
        })
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn address(&self) -> &str {
        self.wallet.address()
    }

    /// Snapshot of the chain state; waits for any in-flight batch
    pub async fn state(&self) -> ChainSenderState {
        self.state.lock().await.clone()
    }

    /// Encode all items in order. Items that fail to encode are logged and
    /// skipped so they cannot block the rest of the batch.
    fn create_payloads(&self, items: &[BridgeBatchItem]) -> Vec<EncodedPayload> {
        let mut payloads = Vec::new();
        for item in items {
            match self.encoders.encode(item) {
                Ok(item_payloads) => payloads.extend(item_payloads),
                Err(err) => {
                    error!(
                        chain = %self.chain_id,
                        hash_of_hashes = %hex::encode(&item.hash_of_hashes),
                        operation_type = %item.operation_type,
                        error = %err,
                        "cannot encode bridge item, skipping"
                    );
                }
            }
        }
        payloads
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base * 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT))
    }

    async fn try_apply_nonce(&self, tx: &mut Transaction, state: &ChainSenderState) -> NonceAttempt {
        match self.nonce_handler.apply_nonce_and_gas_price(tx).await {
            Ok(()) if tx.nonce >= state.expected_nonce => NonceAttempt::Ready,
            Ok(()) => NonceAttempt::Retry(format!(
                "stale nonce {}, expected at least {}",
                tx.nonce, state.expected_nonce
            )),
            Err(err) if err.is_transient() => NonceAttempt::Retry(err.to_string()),
            Err(err) => NonceAttempt::Fatal(err),
        }
    }

    /// Bounded exponential backoff around nonce assignment
    async fn apply_nonce_with_retry(
        &self,
        tx: &mut Transaction,
        state: &ChainSenderState,
    ) -> Result<(), TxSenderError> {
        let mut last_error = String::new();

        for attempt in 0..self.max_retries_get_account {
            match self.try_apply_nonce(tx, state).await {
                NonceAttempt::Ready => return Ok(()),
                NonceAttempt::Fatal(err) => return Err(TxSenderError::NonceFatal(err)),
                // no wait after the final attempt
                NonceAttempt::Retry(reason) if attempt + 1 == self.max_retries_get_account => {
                    last_error = reason;
                }
                NonceAttempt::Retry(reason) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        chain = %self.chain_id,
                        sender = %tx.sender,
                        attempt = attempt + 1,
                        max_attempts = self.max_retries_get_account,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "account state not ready, retrying"
                    );
                    last_error = reason;
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(TxSenderError::CannotSyncAccountState {
            attempts: self.max_retries_get_account,
            last_error,
        })
    }

    async fn send_payloads(
        &self,
        payloads: Vec<EncodedPayload>,
        network: &NetworkConfig,
        state: &mut ChainSenderState,
    ) -> Result<Vec<String>, TxSenderError> {
        let mut hashes = Vec::with_capacity(payloads.len());

        for payload in payloads {
            let route = match self.router.route(&payload.tag) {
                Ok(route) => route,
                Err(err) => {
                    error!(chain = %self.chain_id, tag = %payload.tag, error = %err, "cannot route payload, skipping");
                    continue;
                }
            };

            let mut tx = Transaction::contract_call(
                self.wallet.address(),
                &route.receiver,
                route.gas_limit,
                payload.bytes,
                network,
            );

            self.apply_nonce_with_retry(&mut tx, state).await?;
            tx.signature = self.wallet.sign_transaction(&tx);

            let hash = self
                .nonce_handler
                .send_transaction(&tx)
                .await
                .map_err(TxSenderError::Submission)?;

            info!(chain = %self.chain_id, tag = %payload.tag, nonce = tx.nonce, %hash, "transaction sent");
            state.expected_nonce = tx.nonce + 1;
            hashes.push(hash);
        }

        Ok(hashes)
    }
}

#[async_trait]
impl BatchSender for TxSender {
    async fn send_batch(&self, items: Vec<BridgeBatchItem>) -> Result<Vec<String>, TxSenderError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        // Held until return; dropping this future releases it as well
        let mut state = self.state.lock().await;

        let payloads = self.create_payloads(&items);
        if payloads.is_empty() {
            debug!(chain = %self.chain_id, items = items.len(), "no payloads to send");
            return Ok(Vec::new());
        }

        let network = self
            .proxy
            .get_network_config()
            .await
            .map_err(TxSenderError::NetworkConfig)?;

        self.send_payloads(payloads, &network, &mut state).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{
        CHANGE_VALIDATOR_SET_TAG, EXECUTE_BRIDGE_OPS_TAG, REGISTER_BRIDGE_OPS_TAG, REGISTER_TOKEN_TAG,
    };
    use crate::hasher::Sha256Hasher;
    use crate::models::{OperationType, OutgoingOperation};
    use crate::payload_router::{GasLimits, RouteEntry};
    use crate::rpc::{AccountInfo, AccountNonceHandler};
    use crate::wallet::Ed25519Wallet;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Instant;
    use tokio::sync::Notify;

    struct StaticProxy;

    #[async_trait]
    impl Proxy for StaticProxy {
        async fn get_account(&self, address: &str) -> Result<AccountInfo, ProxyError> {
            Ok(AccountInfo {
                address: address.to_string(),
                ..Default::default()
            })
        }

        async fn get_network_config(&self) -> Result<NetworkConfig, ProxyError> {
            Ok(NetworkConfig {
                chain_id: "1".into(),
                min_gas_price: 5000,
                min_tx_version: 2,
            })
        }

        async fn send_transaction(&self, _tx: &Transaction) -> Result<String, ProxyError> {
            Ok(String::new())
        }
    }

    /// Gateway at on-chain nonce 0 that can hang on its next submission
    #[derive(Default)]
    struct StallingGateway {
        stall_next: AtomicBool,
        stalled: Notify,
        submitted: StdMutex<Vec<u64>>,
    }

    #[async_trait]
    impl Proxy for StallingGateway {
        async fn get_account(&self, address: &str) -> Result<AccountInfo, ProxyError> {
            StaticProxy.get_account(address).await
        }

        async fn get_network_config(&self) -> Result<NetworkConfig, ProxyError> {
            StaticProxy.get_network_config().await
        }

        async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError> {
            if self.stall_next.swap(false, Ordering::SeqCst) {
                self.stalled.notify_one();
                std::future::pending::<()>().await;
            }
            self.submitted.lock().unwrap().push(tx.nonce);
            Ok(format!("stalling-{}", tx.nonce))
        }
    }

    /// Nonce handler replaying scripted nonce results, recording submissions
    #[derive(Default)]
    struct ScriptedNonceHandler {
        nonce_results: StdMutex<VecDeque<Result<u64, ProxyError>>>,
        apply_calls: StdMutex<u32>,
        fail_submission_at: Option<usize>,
        sent: StdMutex<Vec<Transaction>>,
    }

    impl ScriptedNonceHandler {
        fn with_results(results: Vec<Result<u64, ProxyError>>) -> Self {
            Self {
                nonce_results: StdMutex::new(results.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl NonceHandler for ScriptedNonceHandler {
        async fn apply_nonce_and_gas_price(&self, tx: &mut Transaction) -> Result<(), ProxyError> {
            *self.apply_calls.lock().unwrap() += 1;
            let next = self.nonce_results.lock().unwrap().pop_front();
            match next {
                Some(Ok(nonce)) => {
                    tx.nonce = nonce;
                    Ok(())
                }
                Some(Err(err)) => Err(err),
                None => {
                    tx.nonce = self.sent.lock().unwrap().len() as u64;
                    Ok(())
                }
            }
        }

        async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_submission_at == Some(sent.len()) {
                return Err(ProxyError::Rejected("invalid tx".into()));
            }
            sent.push(tx.clone());
            Ok(format!("txHash{}", tx.nonce))
        }
    }

    fn args(nonce_handler: Arc<dyn NonceHandler>, max_retries: u32) -> TxSenderArgs {
        TxSenderArgs {
            chain_id: ChainId::Mvx,
            wallet: Arc::new(Ed25519Wallet::generate()),
            proxy: Arc::new(StaticProxy),
            nonce_handler,
            encoders: Arc::new(EncoderRegistry::new(Arc::new(Sha256Hasher))),
            router: PayloadRouter::for_bridge_contracts("header", "safe", GasLimits::default()).unwrap(),
            max_retries_get_account: max_retries,
            retry_base: Duration::from_millis(1),
        }
    }

    fn sender(handler: Arc<ScriptedNonceHandler>, max_retries: u32) -> TxSender {
        TxSender::new(args(handler, max_retries)).unwrap()
    }

    fn deposit(ops: usize) -> BridgeBatchItem {
        BridgeBatchItem {
            chain_id: ChainId::Mvx,
            operation_type: OperationType::DepositTokens,
            hash_of_hashes: b"unregistered".to_vec(),
            operations: (0..ops)
                .map(|i| OutgoingOperation::new(format!("h{}", i).into_bytes(), format!("d{}", i).into_bytes()))
                .collect(),
            aggregated_signature: Vec::new(),
            leader_signature: Vec::new(),
            pub_keys_bitmap: Vec::new(),
            epoch: 0,
        }
    }

    #[test]
    fn test_zero_retries_is_rejected() {
        let result = TxSender::new(TxSenderArgs {
            chain_id: ChainId::Mvx,
            wallet: Arc::new(Ed25519Wallet::generate()),
            proxy: Arc::new(StaticProxy),
            nonce_handler: Arc::new(ScriptedNonceHandler::default()),
            encoders: Arc::new(EncoderRegistry::empty()),
            router: PayloadRouter::for_bridge_contracts("header", "safe", GasLimits::default()).unwrap(),
            max_retries_get_account: 0,
            retry_base: Duration::from_millis(1),
        });
        assert!(matches!(result, Err(TxSenderError::ZeroRetries)));
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let handler = Arc::new(ScriptedNonceHandler::default());
        let sender = sender(handler.clone(), 3);

        assert_eq!(sender.send_batch(vec![]).await.unwrap(), Vec::<String>::new());
        assert_eq!(*handler.apply_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transactions_are_built_in_payload_order() {
        let handler = Arc::new(ScriptedNonceHandler::default());
        let sender = sender(handler.clone(), 3);

        let hashes = sender.send_batch(vec![deposit(2), deposit(1)]).await.unwrap();
        assert_eq!(hashes, vec!["txHash0", "txHash1", "txHash2"]);

        let sent = handler.sent.lock().unwrap();
        assert!(sent.iter().all(|tx| tx.receiver == "safe"));
        assert!(sent.iter().all(|tx| tx.sender == sender.address()));
        assert!(sent.iter().all(|tx| tx.is_signed() && tx.value == "0" && tx.gas_price == 5000));
        let first = String::from_utf8(sent[0].data.clone()).unwrap();
        assert!(first.starts_with(EXECUTE_BRIDGE_OPS_TAG));
        assert!(first.ends_with(&hex::encode("d0")));
        drop(sent);

        assert_eq!(sender.state().await.expected_nonce, 3);
    }

    #[tokio::test]
    async fn test_transient_nonce_errors_are_retried() {
        let handler = Arc::new(ScriptedNonceHandler::with_results(vec![
            Err(ProxyError::Timeout),
            Err(ProxyError::RequestFailed("connection reset".into())),
            Ok(0),
        ]));
        let sender = sender(handler.clone(), 5);

        let hashes = sender.send_batch(vec![deposit(1)]).await.unwrap();
        assert_eq!(hashes, vec!["txHash0"]);
        assert_eq!(*handler.apply_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_cannot_sync_account() {
        let handler = Arc::new(ScriptedNonceHandler::with_results(vec![
            Err(ProxyError::Timeout),
            Err(ProxyError::Timeout),
            Err(ProxyError::Timeout),
        ]));
        let sender = sender(handler.clone(), 3);

        let err = sender.send_batch(vec![deposit(1)]).await.unwrap_err();
        assert!(matches!(err, TxSenderError::CannotSyncAccountState { attempts: 3, .. }));
        assert_eq!(*handler.apply_calls.lock().unwrap(), 3);
        assert!(handler.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_backoff_after_final_attempt() {
        let handler = Arc::new(ScriptedNonceHandler::with_results(vec![
            Err(ProxyError::Timeout),
            Err(ProxyError::Timeout),
            Err(ProxyError::Timeout),
        ]));
        let sender = TxSender::new(TxSenderArgs {
            retry_base: Duration::from_millis(50),
            ..args(handler.clone(), 3)
        })
        .unwrap();

        // waits 50ms then 100ms, a third wait would add another 200ms
        let started = Instant::now();
        let err = sender.send_batch(vec![deposit(1)]).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, TxSenderError::CannotSyncAccountState { attempts: 3, .. }));
        assert_eq!(*handler.apply_calls.lock().unwrap(), 3);
        assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_fatal_nonce_error_stops_immediately() {
        let handler = Arc::new(ScriptedNonceHandler::with_results(vec![Err(
            ProxyError::AccountNotFound("relayer".into()),
        )]));
        let sender = sender(handler.clone(), 5);

        let err = sender.send_batch(vec![deposit(1)]).await.unwrap_err();
        assert!(matches!(err, TxSenderError::NonceFatal(_)));
        assert_eq!(*handler.apply_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_nonce_is_retried() {
        // second payload first gets a nonce already used, then a fresh one
        let handler = Arc::new(ScriptedNonceHandler::with_results(vec![Ok(7), Ok(7), Ok(8)]));
        let sender = sender(handler.clone(), 5);

        let hashes = sender.send_batch(vec![deposit(2)]).await.unwrap();
        assert_eq!(hashes, vec!["txHash7", "txHash8"]);
    }

    #[tokio::test]
    async fn test_submission_failure_aborts_remaining_payloads() {
        let handler = Arc::new(ScriptedNonceHandler {
            fail_submission_at: Some(1),
            ..Default::default()
        });
        let sender = sender(handler.clone(), 3);

        let err = sender.send_batch(vec![deposit(3)]).await.unwrap_err();
        assert!(matches!(err, TxSenderError::Submission(_)));
        assert_eq!(handler.sent.lock().unwrap().len(), 1);
        assert_eq!(*handler.apply_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unencodable_items_are_skipped() {
        let handler = Arc::new(ScriptedNonceHandler::default());
        let sender = sender(handler.clone(), 3);

        let mut bad_validator_set = deposit(2);
        bad_validator_set.operation_type = OperationType::ChangeValidatorSet;
        let mut unknown = deposit(1);
        unknown.operation_type = OperationType::Unknown("MintNft".into());

        let hashes = sender
            .send_batch(vec![bad_validator_set, deposit(1), unknown])
            .await
            .unwrap();
        assert_eq!(hashes.len(), 1);
    }

    #[tokio::test]
    async fn test_unroutable_payload_is_skipped() {
        let route = |receiver: &str| RouteEntry {
            receiver: receiver.to_string(),
            gas_limit: 1_000,
        };
        let routes: HashMap<String, RouteEntry> = [
            (REGISTER_BRIDGE_OPS_TAG.to_string(), route("header")),
            (EXECUTE_BRIDGE_OPS_TAG.to_string(), route("safe")),
            (CHANGE_VALIDATOR_SET_TAG.to_string(), route("header")),
        ]
        .into_iter()
        .collect();

        let handler = Arc::new(ScriptedNonceHandler::default());
        let sender = TxSender::new(TxSenderArgs {
            router: PayloadRouter::new(routes).unwrap(),
            ..args(handler.clone(), 3)
        })
        .unwrap();

        let mut register_token = deposit(1);
        register_token.operation_type = OperationType::RegisterToken;

        let hashes = sender
            .send_batch(vec![register_token, deposit(1)])
            .await
            .unwrap();
        assert_eq!(hashes, vec!["txHash0"]);

        let sent = handler.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].receiver, "safe");
        assert_eq!(sent[0].gas_limit, 1_000);
        let data = String::from_utf8(sent[0].data.clone()).unwrap();
        assert!(data.starts_with(EXECUTE_BRIDGE_OPS_TAG));
        assert!(!sent.iter().any(|tx| tx.data.starts_with(REGISTER_TOKEN_TAG.as_bytes())));
        drop(sent);

        assert_eq!(*handler.apply_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_aborted_batch_leaves_no_nonce_gap() {
        let gateway = Arc::new(StallingGateway::default());
        gateway.stall_next.store(true, Ordering::SeqCst);
        let nonce_handler = Arc::new(AccountNonceHandler::new(gateway.clone()));
        let sender = Arc::new(
            TxSender::new(TxSenderArgs {
                proxy: gateway.clone(),
                ..args(nonce_handler, 3)
            })
            .unwrap(),
        );

        let in_flight = {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move { sender.send_batch(vec![deposit(1)]).await })
        };
        gateway.stalled.notified().await;
        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());

        let hashes = sender.send_batch(vec![deposit(1)]).await.unwrap();
        assert_eq!(hashes, vec!["stalling-0"]);
        assert_eq!(*gateway.submitted.lock().unwrap(), vec![0]);
        assert_eq!(sender.state().await.expected_nonce, 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let sender = sender(Arc::new(ScriptedNonceHandler::default()), 3);
        assert_eq!(sender.backoff(0), Duration::from_millis(1));
        assert_eq!(sender.backoff(1), Duration::from_millis(2));
        assert_eq!(sender.backoff(4), Duration::from_millis(16));
    }
}
