//! Request/response behaviour against a mock wallet service.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bitwallet_client::{
    verify_request, AuthHeaders, ClientConfig, ClientError, KnownHostHandler, PeerCertificate,
    RangeOptions, WalletClient,
};
use bitwallet_crypto::{generate_keypair, ApiKeyPair};
use bitwallet_types::{Network, WalletId};
use bitwallet_utils::{init_logging, LogFormat};

const WALLET: &str = "2b5848038f5fac0b67badd525d43b62d848a0ee9afd27f9672e4dc3962370b6b";

fn wallet() -> WalletId {
    WalletId::from_hex(WALLET).unwrap()
}

fn anonymous_client(server: &MockServer) -> WalletClient {
    init_logging(LogFormat::Human, "warn,bitwallet_client=debug");
    WalletClient::new(ClientConfig::new(server.uri(), Network::Livenet)).unwrap()
}

fn signed_client(server: &MockServer, keys: &ApiKeyPair) -> WalletClient {
    WalletClient::new(ClientConfig::new(server.uri(), Network::Livenet).with_api_key(keys))
        .unwrap()
}

fn auth_headers(request: &wiremock::Request) -> AuthHeaders {
    let get = |name: &str| {
        request
            .headers
            .get(name)
            .unwrap_or_else(|| panic!("missing {name}"))
            .to_str()
            .unwrap()
            .to_string()
    };
    AuthHeaders {
        identity: get("x-identity"),
        signature: get("x-signature"),
        nonce: get("x-nonce"),
    }
}

/// The URL the client signed: the mock server's own address plus what
/// reached it.
fn signed_url(server: &MockServer, request: &wiremock::Request) -> String {
    let mut url = format!("{}{}", server.uri(), request.url.path());
    if let Some(query) = request.url.query() {
        url.push('?');
        url.push_str(query);
    }
    url
}

async fn mount_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_not_found_regardless_of_body() {
    let server = MockServer::start().await;
    mount_status(&server, 404, r#"{"transactions": []}"#).await;

    let err = anonymous_client(&server).get_info().await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_bad_request_and_unauthorized_carry_message() {
    let server = MockServer::start().await;
    mount_status(&server, 400, "Invalid params: limit exceeds maximum").await;
    let err = anonymous_client(&server).get_info().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "400 Bad Request: Invalid params: limit exceeds maximum"
    );

    let server = MockServer::start().await;
    mount_status(&server, 401, "Invalid signature").await;
    let err = anonymous_client(&server).get_info().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized { ref message } if message == "Invalid signature"));
}

#[tokio::test]
async fn test_server_errors() {
    for status in [500u16, 501, 503] {
        let server = MockServer::start().await;
        mount_status(&server, status, "boom").await;
        let err = anonymous_client(&server).get_info().await.unwrap_err();
        assert_eq!(err.status_code(), Some(status));
        assert_eq!(err.to_string(), format!("{status} Server Error: boom"));
    }
}

#[tokio::test]
async fn test_network_mismatch_on_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-bitcoin-network", "testnet")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let err = client.get_info().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::NetworkMismatch { ref server, local: Network::Livenet } if server == "testnet"
    ));
    assert!(client.chain_state().is_unset());
}

#[tokio::test]
async fn test_chain_state_follows_latest_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-bitcoin-network", "livenet")
                .insert_header("x-bitcoin-height", "400000")
                .insert_header("x-bitcoin-hash", "000000000000000004ab")
                .set_body_json(json!({"version": "1.0.0"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{WALLET}/balance")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 0})))
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    assert!(client.chain_state().is_unset());

    let info = client.get_info().await.unwrap();
    assert_eq!(info["version"], "1.0.0");
    let state = client.chain_state();
    assert_eq!(state.height, Some(400_000));
    assert_eq!(state.hash.as_deref(), Some("000000000000000004ab"));

    // No headers on the next response: the state is replaced, not merged.
    client.get_balance(&wallet()).await.unwrap();
    assert!(client.chain_state().is_unset());
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "{not json").await;
    let err = anonymous_client(&server).get_info().await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_unparseable_body_leaves_chain_state_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-bitcoin-height", "123")
                .insert_header("x-bitcoin-hash", "abc")
                .set_body_string("not json{"),
        )
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let err = client.get_info().await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
    assert!(client.chain_state().is_unset());
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/wallets/{WALLET}")))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    let body = anonymous_client(&server)
        .create_wallet(&wallet())
        .await
        .unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_auth_headers() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "{}").await;
    anonymous_client(&server).get_info().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-identity").is_none());
    assert!(requests[0].headers.get("x-signature").is_none());
    assert!(requests[0].headers.get("x-nonce").is_none());
}

#[tokio::test]
async fn test_signed_request_verifies_against_sent_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/wallets/{WALLET}/transactions")))
        .and(query_param("height", "400000"))
        .and(query_param("index", "2"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"transactions": []})))
        .expect(1)
        .mount(&server)
        .await;

    let keys = generate_keypair();
    let client = signed_client(&server, &keys);
    let range = RangeOptions::new().height(400_000).index(2).limit(50);
    let page = client.get_transactions(&wallet(), &range).await.unwrap();
    assert!(page.items.is_empty());

    let requests = server.received_requests().await.unwrap();
    let sent = &requests[0];
    let auth = auth_headers(sent);
    assert_eq!(auth.identity, keys.public_hex());
    assert!(verify_request("GET", &signed_url(&server, sent), &sent.body, &auth).unwrap());
}

#[tokio::test]
async fn test_repeated_requests_use_fresh_nonces() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "{}").await;
    let client = signed_client(&server, &generate_keypair());
    for _ in 0..5 {
        client.get_info().await.unwrap();
    }
    let requests = server.received_requests().await.unwrap();
    let mut nonces: Vec<String> = requests.iter().map(|r| auth_headers(r).nonce).collect();
    nonces.sort();
    nonces.dedup();
    assert_eq!(nonces.len(), 5);
}

#[tokio::test]
async fn test_heights_from_timestamps_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info/timestamps"))
        .and(query_param("startdate", "2016-09-01"))
        .and(query_param("enddate", "2016-09-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([428_000, 428_150])))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let heights = client
        .get_heights_from_timestamps("2016-09-01", "2016-09-02")
        .await
        .unwrap();
    assert_eq!(heights, json!([428_000, 428_150]));
}

#[tokio::test]
async fn test_invalid_dates_are_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = anonymous_client(&server)
        .get_heights_from_timestamps("2016-09-01", "not a date")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidRange(_)));
}

#[tokio::test]
async fn test_import_address_path_and_validation() {
    let server = MockServer::start().await;
    let address = "12c6DSiU4Rq3P4ZxziKxzrL5LmMBrzjrJX";
    Mock::given(method("PUT"))
        .and(path(format!("/wallets/{WALLET}/addresses/{address}")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"address": address})))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous_client(&server);
    let body = client.import_address(&wallet(), address).await.unwrap();
    assert_eq!(body["address"], address);

    let err = client
        .import_address(&wallet(), "../../info")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Types(_)));
}

#[tokio::test]
async fn test_upload_streams_file_and_signs_its_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/wallets/{WALLET}/addresses")))
        .and(header("content-type", "multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imported": 3000})))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let content = "1BoatSLRHtKNngkdXEeobR76b53LETtpyT\n".repeat(3_000);
    file.write_all(content.as_bytes()).unwrap();

    let keys = generate_keypair();
    let client = signed_client(&server, &keys);
    let body = client.import_addresses(&wallet(), file.path()).await.unwrap();
    assert_eq!(body["imported"], 3000);

    let requests = server.received_requests().await.unwrap();
    let sent = &requests[0];
    assert_eq!(sent.body, content.as_bytes());
    assert_eq!(
        sent.headers.get("content-length").unwrap().to_str().unwrap(),
        content.len().to_string()
    );
    assert!(verify_request(
        "POST",
        &signed_url(&server, sent),
        &sent.body,
        &auth_headers(sent)
    ).unwrap());
}

#[tokio::test]
async fn test_missing_upload_file_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = anonymous_client(&server)
        .import_addresses(&wallet(), "/nonexistent/addresses.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = WalletClient::new(ClientConfig::new(uri, Network::Livenet)).unwrap();
    let err = client.get_info().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

/// Records offered certificates; plain HTTP never offers one.
#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<PeerCertificate>>,
}

impl KnownHostHandler for RecordingHandler {
    fn save_known_host(&self, cert: &PeerCertificate) -> Result<(), String> {
        self.seen.lock().unwrap().push(cert.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_known_host_handler_not_called_without_tls() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "{}").await;
    let handler = Arc::new(RecordingHandler::default());
    let client = anonymous_client(&server).with_known_host_handler(handler.clone());
    client.get_info().await.unwrap();
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unhandled_errors_reach_fault_channel() {
    let server = MockServer::start().await;
    mount_status(&server, 404, "").await;
    let client = anonymous_client(&server);
    let mut faults = client.faults();

    let result = client.get_info().await;
    assert!(client.report("get_info", result).is_none());
    let fault = faults.recv().await.unwrap();
    assert_eq!(fault.operation, "get_info");
    assert!(matches!(*fault.error, ClientError::NotFound));
}
