// Purchase flow driver
// Dialog entries are only locked for the synchronous transitions, never across
// a wallet call

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{PurchaseDialog, PurchaseError, PurchaseItem};
use crate::catalog::Catalog;
use crate::repository::{NewTransaction, TransactionStore};
use crate::session::SessionContext;
use crate::wallet::{self, Wallet, WalletError};

pub const DEFAULT_DIALOG_TTL_SECS: i64 = 1800;

pub struct PurchaseFlow {
    dialogs: DashMap<Uuid, PurchaseDialog>,
    wallet: Option<Arc<dyn Wallet>>,
    transactions: Option<Arc<dyn TransactionStore>>,
    merchant_address: String,
    eth_usd_rate: f64,
    dialog_ttl: Duration,
}

impl PurchaseFlow {
    pub fn new(
        wallet: Option<Arc<dyn Wallet>>,
        transactions: Option<Arc<dyn TransactionStore>>,
        merchant_address: String,
        eth_usd_rate: f64,
    ) -> Self {
        Self {
            dialogs: DashMap::new(),
            wallet,
            transactions,
            merchant_address,
            eth_usd_rate,
            dialog_ttl: Duration::seconds(DEFAULT_DIALOG_TTL_SECS),
        }
    }

    pub fn with_dialog_ttl(mut self, ttl: Duration) -> Self {
        self.dialog_ttl = ttl;
        self
    }

    pub fn open_dialogs(&self) -> usize {
        self.dialogs.len()
    }

    /// Drop dialogs opened more than the TTL before `now`.
    /// Dialogs waiting on the wallet are kept until they settle.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        self.dialogs.retain(|_, dialog| {
            let keep = dialog.state.in_flight() || dialog.created_at + self.dialog_ttl > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Open a dialog for a catalog listing; anonymous callers may look but not pay
    pub fn open(
        &self,
        catalog: &Catalog,
        listing_id: i64,
        session: &SessionContext,
    ) -> Result<PurchaseDialog, PurchaseError> {
        let listing = catalog
            .get(listing_id)
            .ok_or(PurchaseError::ListingNotFound(listing_id))?;

        let dialog = PurchaseDialog::new(PurchaseItem::from(listing), session.user_id());
        self.dialogs.insert(dialog.id, dialog.clone());
        tracing::debug!(purchase_id = %dialog.id, listing_id, "Purchase dialog opened");
        Ok(dialog)
    }

    pub fn get(&self, id: Uuid, session: &SessionContext) -> Result<PurchaseDialog, PurchaseError> {
        self.with_dialog(id, session, |_| Ok(()))
    }

    /// A dialog with a pending wallet call cannot be closed
    pub fn close(&self, id: Uuid, session: &SessionContext) -> Result<(), PurchaseError> {
        let removed = self.dialogs.remove_if(&id, |_, dialog| {
            dialog.visible_to(session) && !dialog.state.in_flight()
        });
        if removed.is_some() {
            tracing::debug!(purchase_id = %id, "Purchase dialog closed");
            return Ok(());
        }

        let dialog = self.get(id, session)?;
        Err(dialog.invalid("close"))
    }

    pub fn reset(&self, id: Uuid, session: &SessionContext) -> Result<PurchaseDialog, PurchaseError> {
        self.with_dialog(id, session, PurchaseDialog::reset)
    }

    /// `Idle -> ConnectingWallet -> WalletConnected | Error`
    pub async fn connect_wallet(
        &self,
        id: Uuid,
        session: &SessionContext,
    ) -> Result<PurchaseDialog, PurchaseError> {
        self.with_dialog(id, session, |d| d.begin_connect(session))?;

        let outcome = match &self.wallet {
            Some(wallet) => wallet::connect(wallet.as_ref()).await,
            None => Err(WalletError::NotInstalled),
        };

        self.with_dialog(id, session, |d| match outcome {
            Ok(address) => {
                tracing::info!(purchase_id = %id, address = %iotmarket_eth::format_address(&address), "Wallet connected");
                d.wallet_connected(address)
            }
            Err(e) => {
                tracing::warn!(purchase_id = %id, error = %e, "Wallet connection failed");
                d.fail(e.to_string())
            }
        })
    }

    /// `WalletConnected -> Paying -> Confirmed | Error`
    pub async fn pay(
        &self,
        id: Uuid,
        session: &SessionContext,
    ) -> Result<PurchaseDialog, PurchaseError> {
        if !session.authenticated {
            return Err(PurchaseError::LoginRequired);
        }

        let mut eth_amount = String::new();
        let dialog = self.with_dialog(id, session, |d| {
            eth_amount = d.begin_payment(self.eth_usd_rate)?;
            Ok(())
        })?;

        let outcome = match &self.wallet {
            Some(wallet) => wallet::pay(wallet.as_ref(), &self.merchant_address, &eth_amount).await,
            None => Err(WalletError::NotInstalled),
        };

        match outcome {
            Ok(tx_hash) => {
                tracing::info!(purchase_id = %id, tx_hash = %tx_hash, eth_amount = %eth_amount, "Payment confirmed");
                // The transfer is mined: record it from the pre-payment snapshot
                // whatever happens to the dialog entry afterwards
                if let Some(user_id) = dialog.owner {
                    self.record(NewTransaction {
                        user_id,
                        data_id: dialog.item.listing_id,
                        data_title: dialog.item.title.clone(),
                        price: dialog.item.price.clone(),
                        eth_price: Some(eth_amount),
                        provider: dialog.item.provider.clone(),
                        tx_hash: Some(tx_hash.clone()),
                    });
                }
                self.with_dialog(id, session, |d| d.confirm(tx_hash))
            }
            Err(e) => {
                tracing::warn!(purchase_id = %id, error = %e, "Payment failed");
                self.with_dialog(id, session, |d| d.fail(e.to_string()))
            }
        }
    }

    /// Best-effort write on a detached task; the dialog never hears about it
    fn record(&self, tx: NewTransaction) {
        let Some(store) = self.transactions.clone() else {
            tracing::warn!(tx_hash = ?tx.tx_hash, "Database not available, purchase not recorded");
            return;
        };

        tokio::spawn(async move {
            let tx_hash = tx.tx_hash.clone();
            match store.insert(tx).await {
                Ok(row_id) => tracing::info!(row_id, tx_hash = ?tx_hash, "Purchase recorded"),
                Err(e) => {
                    tracing::error!(error = %e, tx_hash = ?tx_hash, "Failed to record purchase")
                }
            }
        });
    }

    /// Apply `transition` under the entry lock and return a snapshot
    fn with_dialog<F>(
        &self,
        id: Uuid,
        session: &SessionContext,
        transition: F,
    ) -> Result<PurchaseDialog, PurchaseError>
    where
        F: FnOnce(&mut PurchaseDialog) -> Result<(), PurchaseError>,
    {
        let mut entry = self
            .dialogs
            .get_mut(&id)
            .filter(|d| d.visible_to(session))
            .ok_or(PurchaseError::DialogNotFound)?;
        transition(entry.value_mut())?;
        Ok(entry.value().clone())
    }
}

/// Periodically evict expired dialogs for the lifetime of the process
pub fn spawn_dialog_sweeper(flow: Arc<PurchaseFlow>, every: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        // A zero period panics
        let mut ticker = tokio::time::interval(every.max(StdDuration::from_millis(10)));
        loop {
            ticker.tick().await;
            let evicted = flow.sweep_expired(Utc::now());
            if evicted > 0 {
                tracing::debug!(
                    evicted,
                    remaining = flow.open_dialogs(),
                    "Expired purchase dialogs evicted"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::PurchaseState;
    use crate::repository::{MockTransactionStore, StoreError};
    use crate::session::AuthUser;
    use crate::wallet::{MockWallet, ReceiptStatus};
    use async_trait::async_trait;
    use tokio::sync::{mpsc, Notify};

    const MERCHANT: &str = "0x0000000000000000000000000000000000000001";
    const SIGNER: &str = "0x71c7656ec7ab88b098defb751b7401b5f6d8976f";

    fn buyer() -> SessionContext {
        SessionContext::authenticated(
            AuthUser {
                id: Uuid::new_v4(),
                email: Some("buyer@example.com".to_string()),
            },
            "token".to_string(),
        )
    }

    fn connecting_wallet() -> MockWallet {
        let mut wallet = MockWallet::new();
        wallet
            .expect_request_accounts()
            .returning(|| Ok(vec![SIGNER.to_string()]));
        wallet
            .expect_signer_address()
            .returning(|| Ok(SIGNER.to_string()));
        wallet
    }

    /// Wallet that parks on account access and on the receipt until released
    #[derive(Default)]
    struct SlowWallet {
        accounts_requested: Notify,
        release_accounts: Notify,
        sent: Notify,
        release_receipt: Notify,
    }

    #[async_trait]
    impl Wallet for SlowWallet {
        async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
            self.accounts_requested.notify_one();
            self.release_accounts.notified().await;
            Ok(vec![SIGNER.to_string()])
        }

        async fn signer_address(&self) -> Result<String, WalletError> {
            Ok(SIGNER.to_string())
        }

        async fn send_transaction(&self, _to: &str, _value_wei: u128) -> Result<String, WalletError> {
            self.sent.notify_one();
            Ok("0xfeed".to_string())
        }

        async fn wait_for_receipt(&self, _tx_hash: &str) -> Result<ReceiptStatus, WalletError> {
            self.release_receipt.notified().await;
            Ok(ReceiptStatus::Success)
        }
    }

    fn flow(wallet: MockWallet, store: MockTransactionStore) -> PurchaseFlow {
        PurchaseFlow::new(
            Some(Arc::new(wallet)),
            Some(Arc::new(store)),
            MERCHANT.to_string(),
            3000.0,
        )
    }

    #[tokio::test]
    async fn test_connect_without_session_requires_login() {
        let mut wallet = MockWallet::new();
        wallet.expect_request_accounts().never();
        let flow = flow(wallet, MockTransactionStore::new());
        let anonymous = SessionContext::anonymous();

        let dialog = flow.open(&Catalog::builtin(), 3, &anonymous).unwrap();
        let err = flow.connect_wallet(dialog.id, &anonymous).await.unwrap_err();

        assert!(matches!(err, PurchaseError::LoginRequired));
        assert_eq!(flow.get(dialog.id, &anonymous).unwrap().state, PurchaseState::Idle);
    }

    #[tokio::test]
    async fn test_no_wallet_configured_ends_in_error() {
        let flow = PurchaseFlow::new(None, None, MERCHANT.to_string(), 3000.0);
        let session = buyer();

        let dialog = flow.open(&Catalog::builtin(), 1, &session).unwrap();
        let dialog = flow.connect_wallet(dialog.id, &session).await.unwrap();

        assert_eq!(
            dialog.state,
            PurchaseState::Error {
                message: "No Ethereum wallet found. Please install MetaMask.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_payment_never_requested_from_idle_or_error() {
        let mut wallet = MockWallet::new();
        wallet
            .expect_request_accounts()
            .returning(|| Err(WalletError::AccessDenied));
        wallet.expect_send_transaction().never();
        let flow = flow(wallet, MockTransactionStore::new());
        let session = buyer();

        let dialog = flow.open(&Catalog::builtin(), 3, &session).unwrap();
        assert!(matches!(
            flow.pay(dialog.id, &session).await,
            Err(PurchaseError::InvalidTransition { state: "idle", .. })
        ));

        let errored = flow.connect_wallet(dialog.id, &session).await.unwrap();
        assert_eq!(errored.state.name(), "error");
        assert!(matches!(
            flow.pay(dialog.id, &session).await,
            Err(PurchaseError::InvalidTransition { state: "error", .. })
        ));
    }

    #[tokio::test]
    async fn test_confirmed_purchase_is_recorded() {
        let mut wallet = connecting_wallet();
        wallet
            .expect_send_transaction()
            .withf(|to, value| to == MERCHANT && *value == 6_663_000_000_000_000)
            .returning(|_, _| Ok("0xfeed".to_string()));
        wallet
            .expect_wait_for_receipt()
            .returning(|_| Ok(ReceiptStatus::Success));

        let (sent, mut written) = mpsc::unbounded_channel();
        let mut store = MockTransactionStore::new();
        store.expect_insert().returning(move |tx| {
            let _ = sent.send(tx);
            Ok(42)
        });

        let flow = flow(wallet, store);
        let session = buyer();
        let dialog = flow.open(&Catalog::builtin(), 3, &session).unwrap();
        flow.connect_wallet(dialog.id, &session).await.unwrap();
        let dialog = flow.pay(dialog.id, &session).await.unwrap();

        assert_eq!(
            dialog.state,
            PurchaseState::Confirmed {
                tx_hash: "0xfeed".to_string(),
                eth_amount: "0.006663".to_string()
            }
        );

        let tx = written.recv().await.unwrap();
        assert_eq!(tx.user_id, session.user_id().unwrap());
        assert_eq!(tx.data_id, 3);
        assert_eq!(tx.price, "$19.99");
        assert_eq!(tx.eth_price.as_deref(), Some("0.006663"));
        assert_eq!(tx.tx_hash.as_deref(), Some("0xfeed"));
    }

    #[tokio::test]
    async fn test_store_failure_still_confirmed() {
        let mut wallet = connecting_wallet();
        wallet
            .expect_send_transaction()
            .returning(|_, _| Ok("0xfeed".to_string()));
        wallet
            .expect_wait_for_receipt()
            .returning(|_| Ok(ReceiptStatus::Success));

        let (attempted, mut attempts) = mpsc::unbounded_channel();
        let mut store = MockTransactionStore::new();
        store.expect_insert().returning(move |_| {
            let _ = attempted.send(());
            Err(StoreError::Unavailable("connection reset".to_string()))
        });

        let flow = flow(wallet, store);
        let session = buyer();
        let dialog = flow.open(&Catalog::builtin(), 2, &session).unwrap();
        flow.connect_wallet(dialog.id, &session).await.unwrap();
        flow.pay(dialog.id, &session).await.unwrap();

        attempts.recv().await.unwrap();
        assert_eq!(
            flow.get(dialog.id, &session).unwrap().state.name(),
            "confirmed"
        );
    }

    #[tokio::test]
    async fn test_wallet_failure_during_payment() {
        let mut wallet = connecting_wallet();
        wallet.expect_send_transaction().returning(|_, _| {
            Err(WalletError::Rpc {
                code: -32000,
                message: "insufficient funds for transfer".to_string(),
            })
        });
        let mut store = MockTransactionStore::new();
        store.expect_insert().never();

        let flow = flow(wallet, store);
        let session = buyer();
        let dialog = flow.open(&Catalog::builtin(), 5, &session).unwrap();
        flow.connect_wallet(dialog.id, &session).await.unwrap();
        let dialog = flow.pay(dialog.id, &session).await.unwrap();

        assert_eq!(
            dialog.state,
            PurchaseState::Error {
                message: "insufficient funds for transfer".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_dialogs_are_private_to_their_owner() {
        let flow = flow(connecting_wallet(), MockTransactionStore::new());
        let owner = buyer();
        let dialog = flow.open(&Catalog::builtin(), 1, &owner).unwrap();

        assert!(matches!(
            flow.get(dialog.id, &buyer()),
            Err(PurchaseError::DialogNotFound)
        ));
        assert!(flow.close(dialog.id, &buyer()).is_err());
        flow.close(dialog.id, &owner).unwrap();
        assert!(flow.get(dialog.id, &owner).is_err());
    }

    #[tokio::test]
    async fn test_close_refused_while_paying_and_purchase_recorded() {
        let wallet = Arc::new(SlowWallet::default());
        let (sent, mut written) = mpsc::unbounded_channel();
        let mut store = MockTransactionStore::new();
        store.expect_insert().times(1).returning(move |tx| {
            let _ = sent.send(tx);
            Ok(7)
        });
        let flow = PurchaseFlow::new(
            Some(wallet.clone() as Arc<dyn Wallet>),
            Some(Arc::new(store)),
            MERCHANT.to_string(),
            3000.0,
        );
        let session = buyer();
        let id = flow.open(&Catalog::builtin(), 3, &session).unwrap().id;
        wallet.release_accounts.notify_one();
        flow.connect_wallet(id, &session).await.unwrap();

        let (paid, ()) = tokio::join!(flow.pay(id, &session), async {
            wallet.sent.notified().await;
            assert!(matches!(
                flow.close(id, &session),
                Err(PurchaseError::InvalidTransition { action: "close", state: "paying" })
            ));
            assert!(matches!(
                flow.reset(id, &session),
                Err(PurchaseError::InvalidTransition { state: "paying", .. })
            ));
            wallet.release_receipt.notify_one();
        });

        assert_eq!(paid.unwrap().state.name(), "confirmed");
        let tx = written.recv().await.unwrap();
        assert_eq!(tx.data_id, 3);
        assert_eq!(tx.tx_hash.as_deref(), Some("0xfeed"));

        flow.close(id, &session).unwrap();
        assert!(matches!(flow.get(id, &session), Err(PurchaseError::DialogNotFound)));
    }

    #[tokio::test]
    async fn test_close_refused_while_connecting_wallet() {
        let wallet = Arc::new(SlowWallet::default());
        let flow = PurchaseFlow::new(
            Some(wallet.clone() as Arc<dyn Wallet>),
            None,
            MERCHANT.to_string(),
            3000.0,
        );
        let session = buyer();
        let id = flow.open(&Catalog::builtin(), 1, &session).unwrap().id;

        let (connected, ()) = tokio::join!(flow.connect_wallet(id, &session), async {
            wallet.accounts_requested.notified().await;
            assert!(matches!(
                flow.close(id, &session),
                Err(PurchaseError::InvalidTransition {
                    action: "close",
                    state: "connecting_wallet"
                })
            ));
            wallet.release_accounts.notify_one();
        });

        assert_eq!(
            connected.unwrap().state,
            PurchaseState::WalletConnected {
                address: SIGNER.to_string()
            }
        );

        // Once closed, later transitions find nothing and recreate nothing
        flow.close(id, &session).unwrap();
        assert!(matches!(
            flow.connect_wallet(id, &session).await,
            Err(PurchaseError::DialogNotFound)
        ));
        assert!(matches!(
            flow.pay(id, &session).await,
            Err(PurchaseError::DialogNotFound)
        ));
        assert_eq!(flow.open_dialogs(), 0);
    }

    #[test]
    fn test_sweep_keeps_dialogs_waiting_on_the_wallet() {
        let flow = PurchaseFlow::new(None, None, MERCHANT.to_string(), 3000.0)
            .with_dialog_ttl(Duration::seconds(60));
        let session = buyer();
        let catalog = Catalog::builtin();

        let idle = flow.open(&catalog, 1, &session).unwrap().id;
        let connecting = flow.open(&catalog, 2, &session).unwrap().id;
        let paying = flow.open(&catalog, 3, &session).unwrap().id;
        flow.with_dialog(connecting, &session, |d| d.begin_connect(&session)).unwrap();
        flow.with_dialog(paying, &session, |d| {
            d.begin_connect(&session)?;
            d.wallet_connected(SIGNER.to_string())?;
            d.begin_payment(3000.0).map(|_| ())
        })
        .unwrap();

        assert_eq!(flow.sweep_expired(Utc::now()), 0);
        assert_eq!(flow.sweep_expired(Utc::now() + Duration::seconds(61)), 1);

        assert!(matches!(flow.get(idle, &session), Err(PurchaseError::DialogNotFound)));
        assert_eq!(flow.get(connecting, &session).unwrap().state.name(), "connecting_wallet");
        assert_eq!(flow.get(paying, &session).unwrap().state.name(), "paying");
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts_expired_dialogs() {
        let flow = Arc::new(
            PurchaseFlow::new(None, None, MERCHANT.to_string(), 3000.0)
                .with_dialog_ttl(Duration::zero()),
        );
        let session = SessionContext::anonymous();
        let id = flow.open(&Catalog::builtin(), 4, &session).unwrap().id;

        let sweeper = spawn_dialog_sweeper(flow.clone(), StdDuration::from_millis(10));
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        sweeper.abort();

        assert!(matches!(flow.get(id, &session), Err(PurchaseError::DialogNotFound)));
        assert_eq!(flow.open_dialogs(), 0);
    }

    #[test]
    fn test_unknown_listing() {
        let flow = PurchaseFlow::new(None, None, MERCHANT.to_string(), 3000.0);
        assert!(matches!(
            flow.open(&Catalog::builtin(), 99, &SessionContext::anonymous()),
            Err(PurchaseError::ListingNotFound(99))
        ));
    }
}
