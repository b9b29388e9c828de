// HTTP surface tests
// The whole route table behind the session gate, with in-memory fakes for the
// auth service, the wallet and the stores

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{http::header, http::StatusCode, test, web, App};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use iotmarket_api::app_state::AppState;
use iotmarket_api::config::Config;
use iotmarket_api::http::middleware::session_gate::SessionGate;
use iotmarket_api::http::routes;
use iotmarket_api::repository::{
    ListingRecord, ListingStore, NewListing, NewTransaction, StoreError, TransactionRecord,
    TransactionStore, STATUS_COMPLETED,
};
use iotmarket_api::session::{AuthError, AuthService, AuthUser, Session, SignUpOutcome};
use iotmarket_api::wallet::{ReceiptStatus, Wallet, WalletError};

const GOOD_TOKEN: &str = "good-token";
const PASSWORD: &str = "correct-horse";
const SIGNER: &str = "0x71c7656ec7ab88b098defb751b7401b5f6d8976f";
const TX_HASH: &str = "0xabc123";

fn buyer() -> AuthUser {
    AuthUser {
        id: Uuid::from_u128(7),
        email: Some("buyer@example.com".to_string()),
    }
}

#[derive(Default)]
struct FakeAuth {
    sign_up_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUpOutcome, AuthError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SignUpOutcome::VerificationPending {
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if email == "buyer@example.com" && password == PASSWORD {
            Ok(Session {
                access_token: GOOD_TOKEN.to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_in: Some(3600),
                user: buyer(),
            })
        } else {
            Err(AuthError::Rejected("Invalid login credentials".to_string()))
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<Session, AuthError> {
        Err(AuthError::Rejected("Invalid Refresh Token".to_string()))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok((access_token == GOOD_TOKEN).then(buyer))
    }

    async fn verify_email(&self, _email: &str, _token: &str) -> Result<Session, AuthError> {
        Err(AuthError::Rejected("Token has expired or is invalid".to_string()))
    }
}

#[derive(Default)]
struct FakeTransactions {
    rows: Mutex<Vec<TransactionRecord>>,
    inserted: Mutex<Vec<NewTransaction>>,
    list_calls: AtomicUsize,
}

impl FakeTransactions {
    fn with_rows(rows: Vec<TransactionRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TransactionStore for FakeTransactions {
    async fn insert(&self, tx: NewTransaction) -> Result<i64, StoreError> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(tx);
        Ok(inserted.len() as i64)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TransactionRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<TransactionRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn has_purchased(&self, user_id: Uuid, data_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.user_id == user_id && r.data_id == data_id))
    }
}

struct BrokenTransactions;

#[async_trait]
impl TransactionStore for BrokenTransactions {
    async fn insert(&self, _tx: NewTransaction) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    async fn list_for_user(&self, _user_id: Uuid) -> Result<Vec<TransactionRecord>, StoreError> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    async fn has_purchased(&self, _user_id: Uuid, _data_id: i64) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("down".to_string()))
    }
}

#[derive(Default)]
struct FakeListings {
    inserted: Mutex<Vec<NewListing>>,
}

#[async_trait]
impl ListingStore for FakeListings {
    async fn insert(&self, listing: NewListing) -> Result<i64, StoreError> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(listing);
        Ok(100 + inserted.len() as i64)
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<ListingRecord>, StoreError> {
        Ok(self
            .inserted
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.provider_id == provider_id)
            .enumerate()
            .map(|(i, l)| ListingRecord {
                id: 101 + i as i64,
                title: l.title.clone(),
                description: l.description.clone(),
                price: l.price.clone(),
                provider: l.provider.clone(),
                provider_id: l.provider_id,
                category: l.category.clone(),
                update_frequency: l.update_frequency.clone(),
                sample_data: l.sample_data.clone(),
                tags: l.tags.clone(),
                created_at: Utc::now(),
            })
            .collect())
    }
}

struct FakeWallet {
    sent: Mutex<Vec<(String, u128)>>,
}

#[async_trait]
impl Wallet for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![SIGNER.to_string()])
    }

    async fn signer_address(&self) -> Result<String, WalletError> {
        Ok(SIGNER.to_string())
    }

    async fn send_transaction(&self, to: &str, value_wei: u128) -> Result<String, WalletError> {
        self.sent.lock().unwrap().push((to.to_string(), value_wei));
        Ok(TX_HASH.to_string())
    }

    async fn wait_for_receipt(&self, _tx_hash: &str) -> Result<ReceiptStatus, WalletError> {
        Ok(ReceiptStatus::Success)
    }
}

fn record(data_id: i64, title: &str, day: u32) -> TransactionRecord {
    TransactionRecord {
        id: day as i64,
        user_id: buyer().id,
        data_id,
        data_title: title.to_string(),
        price: "$24.99".to_string(),
        eth_price: Some("0.008330".to_string()),
        provider: "City IoT Initiative".to_string(),
        date: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        status: STATUS_COMPLETED.to_string(),
        tx_hash: Some(format!("0x{:02}", day)),
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.wallet.merchant_address = "0x0000000000000000000000000000000000000001".to_string();
    config
}

fn state(
    auth: Arc<FakeAuth>,
    wallet: Option<Arc<dyn Wallet>>,
    transactions: Option<Arc<dyn TransactionStore>>,
    listings: Option<Arc<dyn ListingStore>>,
) -> AppState {
    AppState::with_stores(&config(), auth, wallet, transactions, listings)
}

macro_rules! init_app {
    ($state:expr) => {{
        let config = config();
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(SessionGate::new(
                    config.session.protect_prefixes.clone(),
                    config.session.cookie_name.clone(),
                ))
                .configure(routes::configure),
        )
        .await
    }};
}

fn bearer() -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", GOOD_TOKEN))
}

#[actix_rt::test]
async fn test_anonymous_history_is_sent_to_login_without_touching_the_store() {
    let store = Arc::new(FakeTransactions::default());
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        Some(store.clone() as Arc<dyn TransactionStore>),
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/transactions").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["redirect"], "/login");
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
}

#[actix_rt::test]
async fn test_history_is_newest_first_for_the_caller() {
    let mut other = record(6, "Air Quality Index", 3);
    other.user_id = Uuid::from_u128(99);
    let store = Arc::new(FakeTransactions::with_rows(vec![
        record(1, "City Temperature Sensors", 1),
        record(3, "Smart Home Energy Consumption", 20),
        other,
    ]));
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        Some(store.clone() as Arc<dyn TransactionStore>),
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/transactions")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["data_title"], "Smart Home Energy Consumption");
    assert_eq!(body["items"][1]["data_title"], "City Temperature Sensors");
}

#[actix_rt::test]
async fn test_history_load_failure_is_reported() {
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        Some(Arc::new(BrokenTransactions) as Arc<dyn TransactionStore>),
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/transactions")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["details"],
        "Failed to load your transactions. Please try again."
    );
}

#[actix_rt::test]
async fn test_login_redirects_to_dashboard_only_on_success() {
    let auth = Arc::new(FakeAuth::default());
    let app = init_app!(state(auth.clone(), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "buyer@example.com", "password": PASSWORD }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == config().session.cookie_name)
        .map(|c| c.value().to_string());
    assert_eq!(cookie.as_deref(), Some(GOOD_TOKEN));
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["redirect"], "/dashboard");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "buyer@example.com", "password": "wrong" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"], "Invalid login credentials");
    assert!(body.get("redirect").is_none());
}

#[actix_rt::test]
async fn test_login_with_blank_field_never_reaches_auth_service() {
    let auth = Arc::new(FakeAuth::default());
    let app = init_app!(state(auth.clone(), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "buyer@example.com", "password": "" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"], "Please fill in all fields");
    assert_eq!(auth.sign_in_calls.load(Ordering::SeqCst), 0);
}

#[actix_rt::test]
async fn test_register_password_mismatch_never_calls_sign_up() {
    let auth = Arc::new(FakeAuth::default());
    let app = init_app!(state(auth.clone(), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "new@example.com",
                "password": "abc12345",
                "confirmPassword": "abc12346"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"], "Passwords do not match");
    assert_eq!(auth.sign_up_calls.load(Ordering::SeqCst), 0);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "new@example.com",
                "password": "abc12345",
                "confirm_password": "abc12345"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["redirect"], "/verify-email?email=new%40example.com");
    assert_eq!(auth.sign_up_calls.load(Ordering::SeqCst), 1);
}

#[actix_rt::test]
async fn test_session_probe_reflects_bearer_token() {
    let app = init_app!(state(Arc::new(FakeAuth::default()), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/session").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["authenticated"], false);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/session")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["email"], "buyer@example.com");
}

#[actix_rt::test]
async fn test_search_energy_returns_single_listing_and_honours_etag() {
    let app = init_app!(state(Arc::new(FakeAuth::default()), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/listings?q=energy&category=all")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let etag = res
        .headers()
        .get(header::ETAG)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .expect("etag header");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], 3);
    assert_eq!(body["items"][0]["category"], "Energy");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/listings?q=energy&category=all")
            .insert_header((header::IF_NONE_MATCH, etag))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
}

#[actix_rt::test]
async fn test_listing_detail_flags_previous_purchase() {
    let store = Arc::new(FakeTransactions::with_rows(vec![record(
        1,
        "City Temperature Sensors",
        2,
    )]));
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        Some(store as Arc<dyn TransactionStore>),
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/listings/1")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["title"], "City Temperature Sensors");
    assert_eq!(body["already_purchased"], true);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/listings/1").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["already_purchased"], false);

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/listings/42").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_sell_data_then_list_mine() {
    let listings = Arc::new(FakeListings::default());
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        None,
        Some(listings.clone() as Arc<dyn ListingStore>)
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/listings")
            .insert_header(bearer())
            .set_json(json!({
                "title": "Parking Occupancy",
                "description": "Bay sensors from three garages",
                "category": "Transportation",
                "price": "12.5",
                "isSubscription": true,
                "tags": ["parking"]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["redirect"], "/dashboard");

    let stored = listings.inserted.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].price, "$12.50/month");
    assert_eq!(stored[0].provider_id, buyer().id);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/listings/mine")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Parking Occupancy");
}

#[actix_rt::test]
async fn test_purchase_flow_end_to_end() {
    let wallet = Arc::new(FakeWallet {
        sent: Mutex::new(vec![]),
    });
    let store = Arc::new(FakeTransactions::default());
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        Some(wallet.clone() as Arc<dyn Wallet>),
        Some(store.clone() as Arc<dyn TransactionStore>),
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/purchases")
            .insert_header(bearer())
            .set_json(json!({ "dataId": 3 }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "idle");
    let id = body["id"].as_str().expect("dialog id").to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/wallet", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "wallet_connected");
    assert_eq!(body["state"]["address"], SIGNER);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/payment", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "confirmed");
    assert_eq!(body["state"]["tx_hash"], TX_HASH);
    assert_eq!(body["state"]["eth_amount"], "0.006663");

    let sent = wallet.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![(
            "0x0000000000000000000000000000000000000001".to_string(),
            6_663_000_000_000_000u128
        )]
    );

    // The record is written on a detached task
    let mut inserted = Vec::new();
    for _ in 0..50 {
        inserted = store.inserted.lock().unwrap().clone();
        if !inserted.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].user_id, buyer().id);
    assert_eq!(inserted[0].data_id, 3);
    assert_eq!(inserted[0].price, "$19.99");
    assert_eq!(inserted[0].tx_hash.as_deref(), Some(TX_HASH));
}

#[actix_rt::test]
async fn test_anonymous_cannot_connect_wallet() {
    let wallet = Arc::new(FakeWallet {
        sent: Mutex::new(vec![]),
    });
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        Some(wallet as Arc<dyn Wallet>),
        None,
        None
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/purchases")
            .set_json(json!({ "listing_id": 1 }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let id = body["id"].as_str().expect("dialog id").to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/wallet", id))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["redirect"], "/login");
}

#[actix_rt::test]
async fn test_missing_wallet_reports_install_hint() {
    let app = init_app!(state(Arc::new(FakeAuth::default()), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/purchases")
            .insert_header(bearer())
            .set_json(json!({ "listing_id": 2 }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    let id = body["id"].as_str().expect("dialog id").to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/wallet", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "error");
    assert_eq!(
        body["state"]["message"],
        "No Ethereum wallet found. Please install MetaMask."
    );
}

#[actix_rt::test]
async fn test_reset_then_close_purchase_dialog() {
    let app = init_app!(state(Arc::new(FakeAuth::default()), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/purchases")
            .insert_header(bearer())
            .set_json(json!({ "listing_id": 4 }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let id = body["id"].as_str().expect("dialog id").to_string();

    // No wallet configured: the dialog lands in the error state
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/wallet", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "error");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/purchases/{}/reset", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["state"]["status"], "idle");
    assert_eq!(body["item"]["listing_id"], 4);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/purchases/{}", id))
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    for req in [
        test::TestRequest::get().uri(&format!("/api/purchases/{}", id)),
        test::TestRequest::delete().uri(&format!("/api/purchases/{}", id)),
        test::TestRequest::post().uri(&format!("/api/purchases/{}/reset", id)),
    ] {
        let res = test::call_service(&app, req.insert_header(bearer()).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_rt::test]
async fn test_pages_resolve_gates_dashboard() {
    let app = init_app!(state(Arc::new(FakeAuth::default()), None, None, None));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/pages/resolve?path=/dashboard")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["page"], "login");
    assert_eq!(body["redirect"], "/login");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/pages/resolve?path=/dashboard")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["page"], "dashboard");
    assert!(body.get("redirect").is_none());
}

#[actix_rt::test]
async fn test_dashboard_summarises_purchases_and_listings() {
    let store = Arc::new(FakeTransactions::with_rows(vec![
        record(1, "City Temperature Sensors", 1),
        record(2, "Industrial Machine Status", 2),
        record(3, "Smart Home Energy Consumption", 3),
        record(4, "Agricultural Soil Sensors", 4),
    ]));
    let app = init_app!(state(
        Arc::new(FakeAuth::default()),
        None,
        Some(store as Arc<dyn TransactionStore>),
        Some(Arc::new(FakeListings::default()) as Arc<dyn ListingStore>)
    ));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/dashboard").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/dashboard")
            .insert_header(bearer())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["email"], "buyer@example.com");
    assert_eq!(body["purchases"], 4);
    assert_eq!(body["listings"], 0);
    let recent = body["recent_transactions"].as_array().expect("recent");
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["data_title"], "Agricultural Soil Sensors");
}
