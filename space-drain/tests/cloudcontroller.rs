use serde_json::json;
use space_drain::cloudcontroller::{
    AccessToken, AppLister, AppListerClient, BindDrainClient, CreateDrainClient, Curler,
    DrainBinder, DrainCreator, DrainLister, Grant, HttpCurlClient, ListDrainsClient,
    TokenFetcher, UaaTokenFetcher,
};
use space_drain_test_common::{fixtures, init};
use std::sync::Arc;
use url::Url;
use wiremock::{
    matchers::{
        basic_auth, bearer_token, body_json, body_string_contains, method, path, query_param,
        query_param_is_missing,
    },
    Mock, MockServer, ResponseTemplate,
};

fn token() -> AccessToken {
    AccessToken::new("test-token")
}

fn curler(server: &MockServer) -> Arc<dyn Curler> {
    Arc::new(HttpCurlClient::new(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    ))
}

fn fetcher(url: &str, grant: Grant) -> UaaTokenFetcher {
    UaaTokenFetcher::new(
        reqwest::Client::new(),
        &Url::parse(url).unwrap(),
        "cf".into(),
        "".into(),
        grant,
    )
    .unwrap()
}

fn password() -> Grant {
    Grant::Password {
        username: "admin".into(),
        password: "secret".into(),
    }
}

#[tokio::test]
async fn test_token_password_grant() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(basic_auth("cf", ""))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token("abc")))
        .expect(1)
        .mount(&server)
        .await;

    let token = fetcher(&server.uri(), password()).fetch_token().await.unwrap();

    assert_eq!(token.token(), "abc");
    assert_eq!(token.expires_in(), Some(599));
}

#[tokio::test]
async fn test_token_refresh_grant() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token("def")))
        .expect(1)
        .mount(&server)
        .await;

    let token = fetcher(
        &server.uri(),
        Grant::RefreshToken("my-refresh-token".into()),
    )
    .fetch_token()
    .await
    .unwrap();

    assert_eq!(token.token(), "def");
}

#[tokio::test]
async fn test_token_rejected() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "unauthorized",
            "error_description": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let err = fetcher(&server.uri(), password())
        .fetch_token()
        .await
        .unwrap_err();

    assert_eq!(err.code(), "AuthError");
    assert!(err.to_string().contains("Bad credentials"));
}

#[tokio::test]
async fn test_token_empty() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&server)
        .await;

    let err = fetcher(&server.uri(), password())
        .fetch_token()
        .await
        .unwrap_err();

    assert_eq!(err.code(), "AuthError");
}

#[tokio::test]
async fn test_token_unreachable() {
    init();

    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let err = fetcher(&uri, password()).fetch_token().await.unwrap_err();

    assert_eq!(err.code(), "AuthError");
}

#[tokio::test]
async fn test_curl_injects_token() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let body = curler(&server)
        .curl(reqwest::Method::GET, "/v2/info", None, &token())
        .await
        .unwrap();

    assert_eq!(body, b"{}");
}

#[tokio::test]
async fn test_curl_keeps_base_path() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cf/v2/info"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let curler = HttpCurlClient::new(
        reqwest::Client::new(),
        Url::parse(&format!("{}/cf", server.uri())).unwrap(),
    );

    let body = curler
        .curl(reqwest::Method::GET, "/v2/info", None, &token())
        .await
        .unwrap();

    assert_eq!(body, b"{}");
}

#[tokio::test]
async fn test_token_keeps_base_path() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/uaa/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token("abc")))
        .expect(1)
        .mount(&server)
        .await;

    let token = fetcher(&format!("{}/uaa/", server.uri()), password())
        .fetch_token()
        .await
        .unwrap();

    assert_eq!(token.token(), "abc");
}

#[tokio::test]
async fn test_curl_api_error() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = curler(&server)
        .curl(reqwest::Method::GET, "/v2/info", None, &token())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "APIError");
    assert_eq!(
        err.to_string(),
        "Request failed: 503 Service Unavailable: unavailable"
    );
}

#[tokio::test]
async fn test_list_drains() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/space-1/user_provided_service_instances"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(
            vec![
                fixtures::service_instance(
                    "d1",
                    "my-drain",
                    Some("https://sink.example/?drain-type=all"),
                ),
                fixtures::service_instance("s1", "credentials", None),
            ],
            Some("/v2/spaces/space-1/user_provided_service_instances?page=2"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/space-1/user_provided_service_instances"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(
            vec![fixtures::service_instance(
                "d2",
                "other-drain",
                Some("syslog://logs.example:514"),
            )],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/user_provided_service_instances/d1/service_bindings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(
            vec![
                fixtures::service_binding("b1", "a1", "d1"),
                fixtures::service_binding("b2", "a2", "d1"),
            ],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/user_provided_service_instances/d2/service_bindings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(vec![], None)))
        .expect(1)
        .mount(&server)
        .await;

    // the non-drain instance must never be asked for its bindings

    Mock::given(method("GET"))
        .and(path("/v2/user_provided_service_instances/s1/service_bindings"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let drains = ListDrainsClient::new(curler(&server))
        .list_drains("space-1", &token())
        .await
        .unwrap();

    assert_eq!(drains.len(), 2);

    assert_eq!(drains[0].guid, "d1");
    assert_eq!(drains[0].name, "my-drain");
    assert_eq!(drains[0].drain_type, "all");
    assert_eq!(drains[0].space_guid, "space-1");
    assert_eq!(drains[0].app_guids, vec!["a1", "a2"]);

    assert_eq!(drains[1].guid, "d2");
    assert_eq!(drains[1].url, "syslog://logs.example:514");
    assert_eq!(drains[1].drain_type, "logs");
    assert!(drains[1].app_guids.is_empty());
}

#[tokio::test]
async fn test_list_drains_empty() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/space-1/user_provided_service_instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(vec![], None)))
        .mount(&server)
        .await;

    let drains = ListDrainsClient::new(curler(&server))
        .list_drains("space-1", &token())
        .await
        .unwrap();

    assert!(drains.is_empty());
}

#[tokio::test]
async fn test_list_drains_invalid_body() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/space-1/user_provided_service_instances"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = ListDrainsClient::new(curler(&server))
        .list_drains("space-1", &token())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "DecodeError");
}

#[tokio::test]
async fn test_create_drain() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/user_provided_service_instances"))
        .and(bearer_token("test-token"))
        .and(body_json(json!({
            "name": "my-drain",
            "space_guid": "space-1",
            "syslog_drain_url": "https://sink.example/?drain-type=all",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(fixtures::service_instance(
            "d1",
            "my-drain",
            Some("https://sink.example/?drain-type=all"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    CreateDrainClient::new(curler(&server))
        .create_drain(
            "my-drain",
            "https://sink.example",
            "space-1",
            "all",
            &token(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_apps() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .and(query_param("q", "space_guid:space-1"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(
            vec![
                fixtures::app("a1", "web", "STARTED"),
                fixtures::app("a2", "worker", "STOPPED"),
            ],
            Some("/v2/apps?q=space_guid:space-1&page=2"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::page(
            vec![fixtures::app("a3", "space-drain", "STARTED")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let apps = AppListerClient::new(curler(&server))
        .list_apps("space-1", &token())
        .await
        .unwrap();

    assert_eq!(apps, vec!["a1", "a2", "a3"]);
}

#[tokio::test]
async fn test_bind_drain() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/service_bindings"))
        .and(body_json(json!({
            "service_instance_guid": "d1",
            "app_guid": "a1",
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(fixtures::service_binding("b1", "a1", "d1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    BindDrainClient::new(curler(&server))
        .bind_drain("a1", "d1", &token())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bind_drain_already_bound() {
    init();

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/service_bindings"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 90003,
            "description": "The app space binding to service is taken",
            "error_code": "CF-ServiceBindingAppServiceTaken"
        })))
        .mount(&server)
        .await;

    let err = BindDrainClient::new(curler(&server))
        .bind_drain("a1", "d1", &token())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "APIError");
    assert!(err.to_string().contains("CF-ServiceBindingAppServiceTaken"));
}
