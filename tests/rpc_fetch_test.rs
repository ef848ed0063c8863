use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use soltrack::{
    Emitter, Monitor, MonitorConfigBuilder, Notification, NotificationSource, Result,
    RpcFetcher, SolTrackError, TransactionFetcher,
};
use async_trait::async_trait;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup common RPC mocks
async fn setup_rpc_mocks(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_string_contains("getVersion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "solana-core": "1.18.26", "feature-set": 0 },
            "id": 1
        })))
        .mount(mock_server)
        .await;
}

/// Mounts a `getTransaction` response carrying `tx` in base64.
async fn mount_transaction(
    mock_server: &MockServer,
    tx: &Transaction,
    pre_balances: &[u64],
    post_balances: &[u64],
) {
    let payload = STANDARD.encode(bincode::serialize(tx).unwrap());
    Mock::given(method("POST"))
        .and(body_string_contains("getTransaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": {
                "slot": 123456,
                "blockTime": 1678888888,
                "transaction": [payload, "base64"],
                "meta": {
                    "err": null,
                    "status": { "Ok": null },
                    "fee": 5000,
                    "preBalances": pre_balances,
                    "postBalances": post_balances,
                    "innerInstructions": [],
                    "logMessages": [],
                    "preTokenBalances": [],
                    "postTokenBalances": [],
                    "rewards": []
                },
            },
            "id": 1
        })))
        .mount(mock_server)
        .await;
}

struct OneShot(Option<Notification>);

#[async_trait]
impl NotificationSource for OneShot {
    async fn next_notification(&mut self) -> Option<Result<Notification>> {
        self.0.take().map(Ok)
    }

    async fn close(&mut self) {}

    fn source_name(&self) -> &'static str {
        "one-shot"
    }
}

#[tokio::test]
async fn test_fetch_decodes_base64_transaction() {
    let mock_server = MockServer::start().await;
    setup_rpc_mocks(&mock_server).await;

    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let tx = Transaction::new_with_payer(&[system_instruction::transfer(&a, &b, 20)], Some(&a));
    mount_transaction(&mock_server, &tx, &[100, 50, 1], &[80, 70, 1]).await;

    let fetcher = RpcFetcher::new(mock_server.uri(), CommitmentConfig::finalized());
    let signature = Signature::new_unique();
    let record = fetcher.fetch(&signature).await.unwrap();

    assert_eq!(record.signature, signature.to_string());
    assert_eq!(record.slot, 123456);
    assert_eq!(record.bytes, bincode::serialize(&tx).unwrap());
    assert_eq!(record.pre_balances, vec![100, 50, 1]);
    assert_eq!(record.post_balances, vec![80, 70, 1]);
}

#[tokio::test]
async fn test_fetch_reports_rpc_error() {
    let mock_server = MockServer::start().await;
    setup_rpc_mocks(&mock_server).await;

    Mock::given(method("POST"))
        .and(body_string_contains("getTransaction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": { "code": -32602, "message": "Invalid param: WrongSize" },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let fetcher = RpcFetcher::new(mock_server.uri(), CommitmentConfig::finalized());
    let err = fetcher.fetch(&Signature::new_unique()).await.unwrap_err();

    assert!(matches!(err, SolTrackError::RpcError(_)));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_monitor_against_mock_rpc() {
    let mock_server = MockServer::start().await;
    setup_rpc_mocks(&mock_server).await;

    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let tx = Transaction::new_with_payer(&[system_instruction::transfer(&a, &b, 20)], Some(&a));
    mount_transaction(&mock_server, &tx, &[100, 50, 1], &[80, 70, 1]).await;

    let config = MonitorConfigBuilder::new()
        .wallet(a.to_string())
        .with_rpc(mock_server.uri())
        .with_ws("ws://127.0.0.1:8900")
        .with_denomination(1)
        .build()
        .unwrap();
    let fetcher = RpcFetcher::new(&config.rpc_url, config.commitment_level.into());
    let mut monitor = Monitor::new(config, fetcher, Emitter::new(Vec::new()));

    monitor
        .run(OneShot(Some(Notification::new(Signature::new_unique()))))
        .await
        .unwrap();

    let output = String::from_utf8(monitor.emitter().get_ref().clone()).unwrap();
    assert_eq!(output, format!("{a} has sent 20.000000 SOL to {b}\n"));
}
