//! Integration tests exercising the wallet core end to end:
//! wallet creation → account store → provider refresh → signing → migration,
//! over in-memory storage and a scripted data provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kura_crypto::{
    mnemonic_to_entropy, verify, Address, CoseSign1, Transaction, XPrv,
};
use kura_nullables::{FailingStorage, NullProvider, ScriptedTx};
use kura_provider::{ProviderError, Utxo};
use kura_store::{keys, load, JsonFileStorage, MemoryStorage, Storage};
use kura_types::{Account, AssetAmount, MigrationRecord, NetworkId, TxDetail};
use kura_wallet_core::{
    create_wallet, AccountKeys, BalanceWarning, Migrator, Paginate, RetryPolicy, Session, WalletConfig, WalletError,
    WalletState,
};
use minicbor::Decoder;
use serde_json::json;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const PASSWORD: &str = "correct horse battery staple";

/// `[{2: 170000}, {1: []}, true, null]`
const SAMPLE_TX: &str = "84a1021a00029810a10180f5f6";

fn config() -> WalletConfig {
    WalletConfig {
        balance_retry: RetryPolicy::new(Duration::from_millis(1), 3),
        ..WalletConfig::default()
    }
}

async fn wallet_on(storage: Arc<dyn Storage>) -> WalletState {
    let state = WalletState::new(storage, config());
    create_wallet(&state, "main", MNEMONIC, PASSWORD)
        .await
        .expect("create wallet");
    state
}

async fn wallet() -> WalletState {
    wallet_on(Arc::new(MemoryStorage::new())).await
}

fn expected_keys(index: u32) -> AccountKeys {
    let entropy = mnemonic_to_entropy(MNEMONIC).expect("entropy");
    AccountKeys::derive(&XPrv::from_bip39_entropy(&entropy, b""), index)
}

async fn stored_accounts(state: &WalletState) -> std::collections::BTreeMap<u32, Account> {
    load(state.storage(), keys::ACCOUNTS)
        .await
        .expect("load")
        .expect("accounts present")
}

/// Decode a witness set and return its `(vkey, signature)` pairs.
fn vkey_witnesses(witness_set: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut d = Decoder::new(witness_set);
    let entries = d.map().expect("map").expect("definite");
    let mut out = Vec::new();
    for _ in 0..entries {
        let key = d.u64().expect("key");
        if key != 0 {
            d.skip().expect("skip");
            continue;
        }
        let count = d.array().expect("array").expect("definite");
        for _ in 0..count {
            d.array().expect("pair");
            let vkey = d.bytes().expect("vkey").to_vec();
            let sig = d.bytes().expect("sig").to_vec();
            out.push((vkey, sig));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// 1. Account store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn account_hashes_match_deterministic_derivation() {
    let state = wallet().await;
    assert_eq!(state.create_account("second", PASSWORD).await.unwrap(), 1);

    let accounts = stored_accounts(&state).await;
    for index in [0u32, 1] {
        let keys = expected_keys(index);
        let account = &accounts[&index];
        assert_eq!(account.payment_key_hash, keys.payment.key_hash());
        assert_eq!(account.stake_key_hash, keys.stake.key_hash());
        assert_eq!(account.mainnet.lovelace, 0);
        assert!(account.testnet.history.confirmed.is_empty());
    }
    assert_eq!(state.current_account_index().await.unwrap(), 1);
}

#[tokio::test]
async fn create_account_with_wrong_password_adds_nothing() {
    let state = wallet().await;
    assert!(matches!(
        state.create_account("x", "wrong").await,
        Err(WalletError::WrongPassword)
    ));
    assert_eq!(stored_accounts(&state).await.len(), 1);
    assert_eq!(state.current_account_index().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_persist_leaves_no_partial_account() {
    let storage = Arc::new(FailingStorage::new());
    let state = wallet_on(storage.clone()).await;

    storage.fail_writes(true);
    assert!(matches!(
        state.create_account("second", PASSWORD).await,
        Err(WalletError::Store(_))
    ));
    storage.fail_writes(false);

    assert_eq!(state.accounts().await.unwrap().len(), 1);
    assert_eq!(state.current_account_index().await.unwrap(), 0);
}

#[tokio::test]
async fn create_wallet_is_a_single_write() {
    let storage = Arc::new(FailingStorage::new());
    let state = wallet_on(storage.clone()).await;

    assert_eq!(storage.writes(), 1);
    assert!(state.is_initialized().await.unwrap());
    assert_eq!(stored_accounts(&state).await.len(), 1);
    assert_eq!(state.current_account_index().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_create_wallet_can_be_retried() {
    let storage = Arc::new(FailingStorage::new());
    let state = WalletState::new(storage.clone(), config());

    storage.fail_after(0);
    assert!(matches!(
        create_wallet(&state, "main", MNEMONIC, PASSWORD).await,
        Err(WalletError::Store(_))
    ));
    assert!(!state.is_initialized().await.unwrap());
    assert_eq!(state.storage().get(keys::ACCOUNTS).await.unwrap(), None);

    storage.fail_after(1);
    assert_eq!(
        create_wallet(&state, "main", MNEMONIC, PASSWORD).await.unwrap(),
        0
    );
    let accounts = stored_accounts(&state).await;
    assert_eq!(accounts[&0].payment_key_hash, expected_keys(0).payment.key_hash());
    assert_eq!(state.account().await.unwrap().name, "main");
}

#[tokio::test]
async fn only_account_cannot_be_deleted() {
    let state = wallet().await;
    assert!(matches!(
        state.delete_account().await,
        Err(WalletError::OnlyOneAccount)
    ));
}

#[tokio::test]
async fn delete_removes_only_the_tail() {
    let state = wallet().await;
    state.create_account("b", PASSWORD).await.unwrap();
    state.create_account("c", PASSWORD).await.unwrap();
    state.switch_account(1).await.unwrap();

    assert_eq!(state.delete_account().await.unwrap(), 2);
    let accounts = stored_accounts(&state).await;
    assert_eq!(accounts.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(state.current_account_index().await.unwrap(), 1);

    assert_eq!(state.delete_account().await.unwrap(), 1);
    assert_eq!(state.current_account_index().await.unwrap(), 0);
}

#[tokio::test]
async fn switch_to_unknown_account_fails() {
    let state = wallet().await;
    assert!(matches!(
        state.switch_account(7).await,
        Err(WalletError::AccountNotFound(7))
    ));
}

#[tokio::test]
async fn projection_follows_active_network() {
    let state = wallet().await;
    let main = state.account().await.unwrap();
    assert!(main.payment_addr.starts_with("addr1"));
    assert!(main.reward_addr.starts_with("stake1"));

    state.set_network(NetworkId::Testnet, None).await.unwrap();
    let test = state.account().await.unwrap();
    assert!(test.payment_addr.starts_with("addr_test1"));
    assert!(test.reward_addr.starts_with("stake_test1"));
    assert_eq!(test.payment_key_hash, main.payment_key_hash);

    let mainnet_bytes = Address::from_bech32(&main.payment_addr).unwrap().to_bytes();
    let testnet_bytes = Address::from_bech32(&test.payment_addr).unwrap().to_bytes();
    assert_eq!(mainnet_bytes[1..], testnet_bytes[1..]);
}

#[tokio::test]
async fn reward_address_hex_is_header_plus_stake_hash() {
    let state = wallet().await;
    let hex = state.reward_address_hex().await.unwrap();
    let expected = format!("e1{}", expected_keys(0).stake.key_hash().to_hex());
    assert_eq!(hex, expected);
}

#[tokio::test]
async fn recent_recipient_is_overwritten() {
    let state = wallet().await;
    state.update_recent_send_to_address("addr1a").await.unwrap();
    state.update_recent_send_to_address("addr1b").await.unwrap();
    assert_eq!(
        state.account().await.unwrap().state.recent_send_to_addresses,
        vec!["addr1b"]
    );
}

#[tokio::test]
async fn wallet_survives_reopening_file_storage() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("wallet.json");

    let first = wallet_on(Arc::new(JsonFileStorage::new(&path))).await;
    first.create_account("savings", PASSWORD).await.unwrap();
    let before = first.accounts().await.unwrap();

    let reopened = WalletState::new(Arc::new(JsonFileStorage::new(&path)), config());
    assert_eq!(reopened.accounts().await.unwrap(), before);
    assert_eq!(reopened.current_account_index().await.unwrap(), 1);
    Session::unlock(&reopened, PASSWORD, Duration::from_secs(5))
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// 2. Provider-backed refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_skips_balance_when_head_is_known() {
    let state = wallet().await;
    state
        .set_transactions(vec!["aa".into(), "bb".into()])
        .await
        .unwrap();
    let provider = NullProvider::new();
    provider.set_transactions(&["aa", "bb"]);
    provider.set_balance(vec![AssetAmount::lovelace(99)]);

    let before = state.account().await.unwrap();
    let updated = state
        .update_account(&provider, &CancellationToken::new())
        .await
        .unwrap();
    assert!(!updated);
    assert_eq!(provider.calls("get_address_balance"), 0);
    assert_eq!(state.account().await.unwrap(), before);
}

#[tokio::test]
async fn update_without_transactions_is_a_noop() {
    let state = wallet().await;
    let provider = NullProvider::new();
    let updated = state
        .update_account(&provider, &CancellationToken::new())
        .await
        .unwrap();
    assert!(!updated);
    assert_eq!(provider.calls("get_address_balance"), 0);
}

#[tokio::test]
async fn update_merges_history_and_retries_balance() {
    let state = wallet().await;
    state.set_transactions(vec!["aa".into()]).await.unwrap();

    let provider = NullProvider::new();
    provider.set_transactions(&["cc", "bb", "aa"]);
    provider.set_balance(vec![
        AssetAmount::lovelace(2_500_000),
        AssetAmount::new("policy.token", 10),
    ]);
    provider.fail_balance(2, ProviderError::InternalError);

    let updated = state
        .update_account(&provider, &CancellationToken::new())
        .await
        .unwrap();
    assert!(updated);
    assert_eq!(provider.calls("get_address_balance"), 3);

    let account = state.account().await.unwrap();
    assert_eq!(account.state.history.confirmed, vec!["cc", "bb", "aa"]);
    assert_eq!(account.state.lovelace, 2_500_000);
    assert_eq!(account.state.assets, vec![AssetAmount::new("policy.token", 10)]);
}

#[tokio::test]
async fn exhausted_balance_retry_persists_nothing() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_transactions(&["aa"]);
    provider.fail_balance(10, ProviderError::InternalError);

    let err = state
        .update_account(&provider, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::RetryExhausted { attempts: 3 }));
    assert!(state
        .account()
        .await
        .unwrap()
        .state
        .history
        .confirmed
        .is_empty());
}

#[tokio::test]
async fn cancelled_refresh_persists_nothing() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_transactions(&["aa"]);
    let token = CancellationToken::new();
    token.cancel();

    assert!(matches!(
        state.update_account(&provider, &token).await,
        Err(WalletError::Cancelled)
    ));
    assert!(state.account().await.unwrap().state.history.confirmed.is_empty());
}

#[tokio::test]
async fn tx_detail_uses_cache_only_when_complete() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_transaction_detail(
        "aa",
        ScriptedTx {
            info: Some(json!({ "hash": "aa", "block_height": 7 })),
            block: Some(json!({ "height": 7, "hash": "blk" })),
            utxos: Some(json!({ "inputs": [], "outputs": [] })),
            metadata: Some(json!([])),
        },
    );

    let fetched = state.tx_detail(&provider, "aa").await.unwrap();
    assert!(fetched.is_complete());
    assert_eq!(provider.calls("get_transaction"), 1);
    assert_eq!(provider.calls("get_block"), 1);

    let mut details = HashMap::new();
    details.insert("aa".to_string(), fetched.clone());
    details.insert(
        "bb".to_string(),
        TxDetail {
            info: Some(json!({})),
            ..TxDetail::default()
        },
    );
    state.set_tx_details(details).await.unwrap();

    assert_eq!(state.tx_detail(&provider, "aa").await.unwrap(), fetched);
    assert_eq!(provider.calls("get_transaction"), 1);

    state.tx_detail(&provider, "bb").await.unwrap();
    assert_eq!(provider.calls("get_transaction"), 2);
}

#[tokio::test]
async fn balance_warning_only_for_multi_address_stake_keys() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_stake_balance(42);

    provider.set_addresses(&["addr1only"]);
    let warning = state.balance_warning(&provider).await.unwrap();
    assert!(!warning.active);
    assert_eq!(provider.calls("get_stake_balance"), 0);

    provider.set_addresses(&["addr1a", "addr1b"]);
    let warning = state.balance_warning(&provider).await.unwrap();
    assert!(warning.active);
    assert_eq!(warning.full_balance, 42);
}

#[tokio::test]
async fn balance_warning_is_inactive_when_lookup_fails() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_stake_balance(42);
    provider.fail_addresses(ProviderError::InternalError);

    assert_eq!(
        state.balance_warning(&provider).await.unwrap(),
        BalanceWarning::default()
    );
    assert_eq!(provider.calls("get_stake_balance"), 0);
}

fn utxo(tx_hash: &str, amount: Vec<AssetAmount>) -> Utxo {
    Utxo {
        tx_hash: tx_hash.to_string(),
        output_index: 0,
        address: "addr1".to_string(),
        amount,
    }
}

#[tokio::test]
async fn utxos_are_filtered_by_amount() {
    let state = wallet().await;
    let provider = NullProvider::new();
    let token = format!("{}746f6b", "b0".repeat(28));
    provider.set_utxos(vec![
        utxo("small", vec![AssetAmount::lovelace(1_000_000)]),
        utxo("big", vec![AssetAmount::lovelace(3_000_000)]),
        utxo(
            "mixed",
            vec![AssetAmount::lovelace(1_000_000), AssetAmount::new(token.clone(), 9)],
        ),
    ]);

    // 2_000_000
    let kept = state.utxos(&provider, Some("1a001e8480"), None).await.unwrap();
    let hashes: Vec<_> = kept.iter().map(|u| u.tx_hash.as_str()).collect();
    assert_eq!(hashes, vec!["big", "mixed"]);

    // [1_000_000, {b0..b0: {"tok": 5}}]
    let value = format!("821a000f4240a1581c{}a143746f6b05", "b0".repeat(28));
    let kept = state.utxos(&provider, Some(value.as_str()), None).await.unwrap();
    let hashes: Vec<_> = kept.iter().map(|u| u.tx_hash.as_str()).collect();
    assert_eq!(hashes, vec!["big", "mixed"]);

    for bad in ["zz", "8101", ""] {
        assert!(matches!(
            state.utxos(&provider, Some(bad), None).await,
            Err(WalletError::InvalidRequest(_))
        ));
    }
}

#[tokio::test]
async fn utxo_pages_count_from_zero() {
    let state = wallet().await;
    let provider = NullProvider::new();
    provider.set_utxos(vec![
        utxo("a", vec![AssetAmount::lovelace(1)]),
        utxo("b", vec![AssetAmount::lovelace(1)]),
        utxo("c", vec![AssetAmount::lovelace(1)]),
    ]);

    let first = state
        .utxos(&provider, None, Some(Paginate { page: 0, limit: 2 }))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    let second = state
        .utxos(&provider, None, Some(Paginate { page: 1, limit: 2 }))
        .await
        .unwrap();
    assert_eq!(second.iter().map(|u| u.tx_hash.as_str()).collect::<Vec<_>>(), vec!["c"]);
}

#[tokio::test]
async fn writes_proceed_while_balance_is_polled() {
    let config = WalletConfig {
        balance_retry: RetryPolicy::new(Duration::from_millis(40), 10),
        ..WalletConfig::default()
    };
    let state = WalletState::new(Arc::new(MemoryStorage::new()), config);
    create_wallet(&state, "main", MNEMONIC, PASSWORD).await.unwrap();
    let provider = NullProvider::new();
    provider.set_transactions(&["t1"]);
    provider.set_balance(vec![AssetAmount::lovelace(9)]);
    provider.fail_balance(3, ProviderError::InternalError);

    let cancel = CancellationToken::new();
    let (refreshed, written) = tokio::join!(
        state.update_account(&provider, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tokio::time::timeout(
                Duration::from_millis(30),
                state.update_recent_send_to_address("addr1recipient"),
            )
            .await
        }
    );

    written.expect("write not blocked by refresh").unwrap();
    assert!(refreshed.unwrap());
    let account = state.account().await.unwrap();
    assert_eq!(account.state.history.confirmed, vec!["t1"]);
    assert_eq!(account.state.lovelace, 9);
    assert_eq!(account.state.recent_send_to_addresses, vec!["addr1recipient"]);
}

#[tokio::test]
async fn submit_failures_are_typed() {
    let state = wallet().await;
    let provider = NullProvider::new();
    assert_eq!(
        state.submit_tx(&provider, SAMPLE_TX).await.unwrap(),
        "00".repeat(32)
    );

    provider.set_submit_result(Err(ProviderError::TxSendRefused));
    assert!(matches!(
        state.submit_tx(&provider, SAMPLE_TX).await,
        Err(WalletError::TxSendRefused)
    ));
    provider.set_submit_result(Err(ProviderError::InvalidRequest));
    assert!(matches!(
        state.submit_tx(&provider, SAMPLE_TX).await,
        Err(WalletError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn optional_lookups_soft_fail() {
    let state = wallet().await;
    let provider = NullProvider::new();
    assert_eq!(state.delegation(&provider).await.unwrap(), None);
    assert!(state.transactions(&provider, 1, 10).await.unwrap().is_empty());
    assert!(state.utxos(&provider, None, None).await.unwrap().is_empty());
    assert!(state.balance(&provider).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// 3. Signing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_data_with_payment_address_produces_verifiable_envelope() {
    let state = wallet().await;
    let account = state.account().await.unwrap();
    let address = Address::from_bech32(&account.payment_addr).unwrap().to_bytes();
    let address_hex = hex::encode(&address);

    let envelope_hex = state
        .sign_data(&address_hex, "68656c6c6f", PASSWORD, 0)
        .await
        .unwrap();
    let envelope = CoseSign1::from_bytes(&hex::decode(envelope_hex).unwrap()).unwrap();

    assert!(envelope.verify().unwrap());
    assert_eq!(envelope.payload(), b"hello");
    let headers = envelope.headers().unwrap();
    assert_eq!(headers.key_id, expected_keys(0).payment.public_key().to_vec());
    assert_eq!(headers.address, address);
}

#[tokio::test]
async fn sign_data_with_reward_address_uses_stake_key() {
    let state = wallet().await;
    let reward_hex = state.reward_address_hex().await.unwrap();
    let envelope_hex = state
        .sign_data(&reward_hex, "00", PASSWORD, 0)
        .await
        .unwrap();
    let envelope = CoseSign1::from_bytes(&hex::decode(envelope_hex).unwrap()).unwrap();
    assert_eq!(
        envelope.headers().unwrap().key_id,
        expected_keys(0).stake.public_key().to_vec()
    );
}

#[tokio::test]
async fn sign_data_for_foreign_address_is_proof_generation_error() {
    let state = wallet().await;
    state.create_account("second", PASSWORD).await.unwrap();
    let other = state.account().await.unwrap();
    let address_hex = hex::encode(Address::from_bech32(&other.payment_addr).unwrap().to_bytes());

    assert!(matches!(
        state.sign_data(&address_hex, "00", PASSWORD, 0).await,
        Err(WalletError::ProofGeneration(_))
    ));
}

#[tokio::test]
async fn sign_data_error_taxonomy() {
    let state = wallet().await;
    let account = state.account().await.unwrap();
    let address_hex = hex::encode(Address::from_bech32(&account.payment_addr).unwrap().to_bytes());

    assert!(matches!(
        state.sign_data(&address_hex, "00", "wrong", 0).await,
        Err(WalletError::WrongPassword)
    ));
    assert!(matches!(
        state.sign_data(&address_hex, "", PASSWORD, 0).await,
        Err(WalletError::InvalidFormat(_))
    ));
    assert!(matches!(
        state.sign_data("zz", "00", PASSWORD, 0).await,
        Err(WalletError::InvalidFormat(_))
    ));

    state.set_network(NetworkId::Testnet, None).await.unwrap();
    assert!(matches!(
        state.sign_data(&address_hex, "00", PASSWORD, 0).await,
        Err(WalletError::InvalidFormat(_))
    ));
}

#[tokio::test]
async fn sign_tx_witnesses_in_request_order() {
    let state = wallet().await;
    let keys = expected_keys(0);
    let payment = keys.payment.key_hash().to_hex();
    let stake = keys.stake.key_hash().to_hex();

    let set_hex = state
        .sign_tx(SAMPLE_TX, &[stake.clone(), payment.clone()], PASSWORD, 0, false)
        .await
        .unwrap();
    let witnesses = vkey_witnesses(&hex::decode(set_hex).unwrap());
    assert_eq!(witnesses.len(), 2);
    assert_eq!(witnesses[0].0, keys.stake.public_key().to_vec());
    assert_eq!(witnesses[1].0, keys.payment.public_key().to_vec());

    let tx_hash = Transaction::from_hex(SAMPLE_TX).unwrap().hash();
    for (vkey, sig) in &witnesses {
        let vkey: [u8; 32] = vkey.as_slice().try_into().unwrap();
        let sig: [u8; 64] = sig.as_slice().try_into().unwrap();
        assert!(verify(&vkey, &tx_hash, &sig));
    }
}

#[tokio::test]
async fn sign_tx_unknown_hash_requires_partial_sign() {
    let state = wallet().await;
    let payment = expected_keys(0).payment.key_hash().to_hex();
    let unknown = "ab".repeat(28);

    assert!(matches!(
        state
            .sign_tx(SAMPLE_TX, &[unknown.clone()], PASSWORD, 0, false)
            .await,
        Err(WalletError::ProofGeneration(_))
    ));

    let set_hex = state
        .sign_tx(SAMPLE_TX, &[unknown, payment], PASSWORD, 0, true)
        .await
        .unwrap();
    let witnesses = vkey_witnesses(&hex::decode(set_hex).unwrap());
    assert_eq!(witnesses.len(), 1);
    assert_eq!(witnesses[0].0, expected_keys(0).payment.public_key().to_vec());
}

#[tokio::test]
async fn sign_tx_rejects_malformed_transaction() {
    let state = wallet().await;
    assert!(matches!(
        state.sign_tx("ff00", &[], PASSWORD, 0, false).await,
        Err(WalletError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn session_password_drives_signing() {
    let state = wallet().await;
    let session = Session::unlock(&state, PASSWORD, state.config().session_ttl())
        .await
        .unwrap();
    let payment = expected_keys(0).payment.key_hash().to_hex();
    state
        .sign_tx(SAMPLE_TX, &[payment], session.password().unwrap(), 0, false)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// 4. Migrations over a real wallet
// ---------------------------------------------------------------------------

#[tokio::test]
async fn key_hash_repair_restores_corrupted_hashes() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let state = wallet_on(storage.clone()).await.with_app_version("1.2.0");

    let mut accounts = stored_accounts(&state).await;
    let original = accounts[&0].payment_key_hash;
    let stake = accounts[&0].stake_key_hash;
    accounts.get_mut(&0).unwrap().payment_key_hash = stake;
    kura_store::save(state.storage(), keys::ACCOUNTS, &accounts)
        .await
        .unwrap();
    kura_store::save(state.storage(), keys::MIGRATION, &MigrationRecord::new("1.1.0"))
        .await
        .unwrap();

    let migrator = Migrator::new(state.clone());
    assert!(migrator.need_upgrade().await.unwrap());
    assert!(migrator.need_password().await.unwrap());
    assert!(matches!(
        migrator.migrate(false, Some("wrong")).await,
        Err(WalletError::WrongPassword)
    ));

    let applied = migrator.migrate(false, Some(PASSWORD)).await.unwrap();
    assert!(applied.iter().any(|a| a.version.to_string() == "1.2.0"));
    assert_eq!(stored_accounts(&state).await[&0].payment_key_hash, original);
    assert!(!migrator.need_upgrade().await.unwrap());

    let again = migrator.migrate(false, Some(PASSWORD)).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn recent_recipient_field_survives_round_trip_migrations() {
    let state = wallet().await.with_app_version("1.1.0");
    state.update_recent_send_to_address("addr1x").await.unwrap();
    kura_store::save(state.storage(), keys::MIGRATION, &MigrationRecord::new("1.0.0"))
        .await
        .unwrap();

    Migrator::new(state.clone()).migrate(false, None).await.unwrap();
    let account = state.account().await.unwrap();
    assert_eq!(account.state.recent_send_to_addresses, vec!["addr1x"]);

    let downgraded = state.clone().with_app_version("1.0.0");
    let reverted = Migrator::new(downgraded.clone())
        .migrate(false, None)
        .await
        .unwrap();
    assert_eq!(reverted.len(), 1);
    let raw = downgraded.storage().get(keys::ACCOUNTS).await.unwrap().unwrap();
    assert!(raw["0"]["mainnet"].get("recentSendToAddresses").is_none());
}
