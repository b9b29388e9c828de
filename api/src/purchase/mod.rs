/// Purchase dialog state machine
///
/// `PurchaseDialog` holds the pure transitions; `flow::PurchaseFlow` drives
/// them against the wallet and the transaction store.
pub mod flow;

pub use flow::{spawn_dialog_sweeper, PurchaseFlow};

use chrono::{DateTime, Utc};
use iotmarket_eth::{usd_to_eth, UnitError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::Listing;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurchaseState {
    Idle,
    ConnectingWallet,
    WalletConnected { address: String },
    Paying { address: String, eth_amount: String },
    Confirmed { tx_hash: String, eth_amount: String },
    Error { message: String },
}

impl PurchaseState {
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseState::Idle => "idle",
            PurchaseState::ConnectingWallet => "connecting_wallet",
            PurchaseState::WalletConnected { .. } => "wallet_connected",
            PurchaseState::Paying { .. } => "paying",
            PurchaseState::Confirmed { .. } => "confirmed",
            PurchaseState::Error { .. } => "error",
        }
    }

    /// A wallet call is outstanding
    fn in_flight(&self) -> bool {
        matches!(
            self,
            PurchaseState::ConnectingWallet | PurchaseState::Paying { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseItem {
    pub listing_id: i64,
    pub title: String,
    pub price: String,
    pub provider: String,
}

impl From<&Listing> for PurchaseItem {
    fn from(listing: &Listing) -> Self {
        Self {
            listing_id: listing.id,
            title: listing.title.clone(),
            price: listing.price.clone(),
            provider: listing.provider.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Please log in to purchase data")]
    LoginRequired,
    #[error("Purchase not found")]
    DialogNotFound,
    #[error("Listing {0} not found")]
    ListingNotFound(i64),
    #[error("Cannot {action} while the purchase is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] UnitError),
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDialog {
    pub id: Uuid,
    pub item: PurchaseItem,
    /// Bound on the first wallet connection
    #[serde(skip)]
    pub owner: Option<Uuid>,
    pub state: PurchaseState,
    pub created_at: DateTime<Utc>,
}

impl PurchaseDialog {
    pub fn new(item: PurchaseItem, owner: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item,
            owner,
            state: PurchaseState::Idle,
            created_at: Utc::now(),
        }
    }

    fn invalid(&self, action: &'static str) -> PurchaseError {
        PurchaseError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Dialogs bound to one user are invisible to everybody else
    pub fn visible_to(&self, session: &SessionContext) -> bool {
        match self.owner {
            None => true,
            Some(owner) => session.user_id() == Some(owner),
        }
    }

    /// `Idle -> ConnectingWallet`, only for an authenticated caller
    pub fn begin_connect(&mut self, session: &SessionContext) -> Result<(), PurchaseError> {
        let user_id = match session.user_id() {
            Some(id) if session.authenticated => id,
            _ => return Err(PurchaseError::LoginRequired),
        };
        if self.state != PurchaseState::Idle {
            return Err(self.invalid("connect a wallet"));
        }
        self.owner = Some(user_id);
        self.state = PurchaseState::ConnectingWallet;
        Ok(())
    }

    pub fn wallet_connected(&mut self, address: String) -> Result<(), PurchaseError> {
        if self.state != PurchaseState::ConnectingWallet {
            return Err(self.invalid("finish connecting"));
        }
        self.state = PurchaseState::WalletConnected { address };
        Ok(())
    }

    /// `WalletConnected -> Paying`. Returns the ETH amount to send.
    /// A malformed price leaves the state untouched.
    pub fn begin_payment(&mut self, eth_usd_rate: f64) -> Result<String, PurchaseError> {
        let address = match &self.state {
            PurchaseState::WalletConnected { address } => address.clone(),
            _ => return Err(self.invalid("pay")),
        };
        let eth_amount = usd_to_eth(&self.item.price, eth_usd_rate)?;
        self.state = PurchaseState::Paying {
            address,
            eth_amount: eth_amount.clone(),
        };
        Ok(eth_amount)
    }

    pub fn confirm(&mut self, tx_hash: String) -> Result<(), PurchaseError> {
        let eth_amount = match &self.state {
            PurchaseState::Paying { eth_amount, .. } => eth_amount.clone(),
            _ => return Err(self.invalid("confirm")),
        };
        self.state = PurchaseState::Confirmed {
            tx_hash,
            eth_amount,
        };
        Ok(())
    }

    /// Only a pending wallet step can fail
    pub fn fail(&mut self, message: String) -> Result<(), PurchaseError> {
        if !self.state.in_flight() {
            return Err(self.invalid("record a failure"));
        }
        self.state = PurchaseState::Error { message };
        Ok(())
    }

    /// Close-and-reopen: back to `Idle` from any settled state
    pub fn reset(&mut self) -> Result<(), PurchaseError> {
        if self.state.in_flight() {
            return Err(self.invalid("reset"));
        }
        self.state = PurchaseState::Idle;
        Ok(())
    }
}
