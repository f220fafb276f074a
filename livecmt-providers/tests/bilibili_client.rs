//! HTTP behaviour of the live client against a mock server

use std::time::Duration;

use livecmt_providers::bilibili::{sign_params, ACCEPT_LANGUAGE};
use livecmt_providers::{BilibiliClient, BilibiliError, ChatServerAddress, ChatServerLookup, ClientOptions, Discovery};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TEST_UA: &str = "livecmt-test/1.0";

fn client_for(base_url: &str) -> BilibiliClient {
    BilibiliClient::new(ClientOptions {
        base_url: base_url.to_string(),
        user_agent: TEST_UA.to_string(),
        app_key: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
        timeout: Duration::from_secs(2),
    })
    .expect("client")
}

/// Base URL nothing listens on
fn refused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

const ROOM_PAGE: &str = "<html><script>var ROOMID = 23058;\nvar DANMU_RND = 1;</script></html>";
const PLAYER_FRAGMENT: &str =
    "<uid>0</uid>\n<dm_server>livecmt-2.bilibili.com</dm_server>\n<dm_port>788</dm_port>";
const PLAY_URL_OK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<video><result>suee</result><timelength>0</timelength><durl><order>1</order><length>0</length><url>http://x/stream.flv</url></durl></video>";

#[tokio::test]
async fn resolve_room_id_sends_page_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1"))
        .and(header("accept", "text/html"))
        .and(header("user-agent", TEST_UA))
        .and(|req: &Request| {
            req.headers
                .get("accept-language")
                .and_then(|v| v.to_str().ok())
                == Some(ACCEPT_LANGUAGE)
        })
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOM_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.resolve_room_id("1").await, Some("23058".to_string()));
}

#[tokio::test]
async fn resolve_room_id_returns_none_without_pattern() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/offline"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nothing here</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.resolve_room_id("offline").await, None);
}

#[tokio::test]
async fn resolve_room_id_returns_none_on_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string(ROOM_PAGE))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.resolve_room_id("1").await, None);
}

#[tokio::test]
async fn resolve_room_id_returns_none_when_unreachable() {
    let client = client_for(&refused_base_url());
    assert_eq!(client.resolve_room_id("1").await, None);
}

#[tokio::test]
async fn locate_chat_server_parses_fragment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/player"))
        .and(query_param("id", "cid:23058"))
        .and(header("accept", "*/*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAYER_FRAGMENT))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let lookup = client.locate_chat_server("23058").await;
    assert_eq!(
        lookup,
        ChatServerLookup::Found(ChatServerAddress::new("livecmt-2.bilibili.com", "788"))
    );
    assert!(!lookup.may_not_exist());
}

#[tokio::test]
async fn locate_chat_server_flags_missing_room_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/player"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let lookup = client.locate_chat_server("999999999").await;
    assert!(!lookup.is_success());
    assert!(lookup.may_not_exist());
}

#[tokio::test]
async fn locate_chat_server_connection_refused_is_not_missing() {
    let client = client_for(&refused_base_url());
    let lookup = client.locate_chat_server("23058").await;
    assert_eq!(lookup, ChatServerLookup::Unavailable);
    assert!(!lookup.may_not_exist());
}

#[tokio::test]
async fn locate_chat_server_timeout_is_not_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/player"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PLAYER_FRAGMENT)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let lookup = client.locate_chat_server("23058").await;
    assert_eq!(lookup, ChatServerLookup::Unavailable);
}

#[tokio::test]
async fn locate_chat_server_server_error_is_not_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.locate_chat_server("23058").await, ChatServerLookup::Unavailable);
}

#[tokio::test]
async fn locate_chat_server_parse_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/player"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<dm_server>only</dm_server>"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.locate_chat_server("23058").await, ChatServerLookup::Unavailable);
}

#[tokio::test]
async fn resolve_stream_url_signs_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .and(query_param("appkey", "test-key"))
        .and(query_param("cid", "23058"))
        .and(query_param("player", "1"))
        .and(query_param("quality", "0"))
        .and(|req: &Request| {
            // sign must cover everything before "&sign="
            let query = req.url.query().unwrap_or_default();
            match query.split_once("&sign=") {
                Some((params, sign)) => sign == sign_params(params, "test-secret"),
                None => false,
            }
        })
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAY_URL_OK))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let url = client.resolve_stream_url("23058").await.expect("stream url");
    assert_eq!(url, "http://x/stream.flv");
}

#[tokio::test]
async fn resolve_stream_url_rejects_failure_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<video><result>fail</result></video>"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.resolve_stream_url("23058").await.unwrap_err();
    assert!(matches!(err, BilibiliError::Protocol(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn resolve_stream_url_propagates_network_error() {
    let client = client_for(&refused_base_url());
    let err = client.resolve_stream_url("23058").await.unwrap_err();
    assert!(matches!(err, BilibiliError::Network(_)), "unexpected error: {err}");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn resolve_stream_url_propagates_http_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.resolve_stream_url("23058").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn resolve_stream_url_requires_room_id() {
    let client = client_for(&refused_base_url());
    let err = client.resolve_stream_url("").await.unwrap_err();
    assert!(matches!(err, BilibiliError::InvalidInput(_)));
}

#[tokio::test]
async fn discover_resolves_alias_to_stream_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOM_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .and(query_param("cid", "23058"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAY_URL_OK))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let discovery = client.discover("1").await;
    assert!(discovery.is_success());
    assert_eq!(discovery.room_id(), Some("23058"));
    assert_eq!(discovery.stream_url(), Some("http://x/stream.flv"));
}

#[tokio::test]
async fn discover_stops_when_room_unresolved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAY_URL_OK))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.discover("missing").await, Discovery::Unresolved);
}

#[tokio::test]
async fn discover_folds_stream_errors_into_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOM_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<video><result>fail</result></video>"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let discovery = client.discover("1").await;
    assert!(!discovery.is_success());
    assert_eq!(
        discovery,
        Discovery::RoomOnly {
            room_id: "23058".to_string()
        }
    );
}

#[tokio::test]
async fn discover_treats_empty_url_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOM_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playurl"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<video><result>suee</result><durl><url></url></durl></video>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let discovery = client.discover("1").await;
    assert!(!discovery.is_success());
    assert_eq!(discovery.room_id(), Some("23058"));
}
