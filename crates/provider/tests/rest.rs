//! REST provider against a local mock server.

use httpmock::prelude::*;
use ladok_core::{ActivityGrant, GroupId, TransportError};
use ladok_provider::transport::{Format, Service};
use ladok_provider::{
    Environment, FeedSelector, HttpTransport, LadokProvider, RestProvider, TransportConfig,
};
use reqwest::Method;
use serde_json::json;

const KATALOG_JSON: &str = "application/vnd.ladok-kataloginformation+json";
const PROFILE_UID: &str = "11111111-2222-0000-0000-000000000000";

const EGNA: &str = r#"{
    "Anvandarbehorighet": [
        {
            "Uid": "a5c2c8bb-1d1f-11ec-9d3e-7c7e3f7f0b1a",
            "BehorighetsprofilRef": {"Uid": "11111111-2222-0000-0000-000000000000"},
            "Status": "AKTIV"
        }
    ],
    "link": []
}"#;

const PROFILE: &str = r#"{
    "Uid": "11111111-2222-0000-0000-000000000000",
    "Systemaktiviteter": [
        {"ID": 61001, "Rattighetsniva": "rattighetsniva.las"},
        {"ID": 90019, "Rattighetsniva": "rattighetsniva.lokal"}
    ]
}"#;

const ERROR_500: &str = r#"{
    "FelUID": "c0f52d2c-3a5f-11ec-aa00-acd34b504da7",
    "Felkategori": "commons.fel.kategori.applikationsfel",
    "FelkategoriText": "Generellt fel i applikationen",
    "Meddelande": "java.lang.NullPointerException null",
    "link": []
}"#;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>urn:id:12</id>
  <entry>
    <id>entry-1</id>
    <content type="application/vnd.ladok+xml">
      <ki:AnvandareSkapadEvent xmlns:ki="http://schemas.ladok.se/kataloginformation" xmlns:base="http://schemas.ladok.se">
        <base:HandelseUID>h-1</base:HandelseUID>
        <ki:AnvandareUID>u-1</ki:AnvandareUID>
        <ki:Fornamn>Anna</ki:Fornamn>
      </ki:AnvandareSkapadEvent>
    </content>
  </entry>
</feed>"#;

fn provider(server: &MockServer, environment: Environment) -> RestProvider {
    let config = TransportConfig::new(server.base_url()).with_environment(environment);
    RestProvider::new(&config).unwrap()
}

#[tokio::test]
async fn held_groups_are_read_from_egna() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/kataloginformation/anvandarbehorighet/egna");
            then.status(200)
                .header("content-type", KATALOG_JSON)
                .body(EGNA);
        })
        .await;

    let groups = provider(&server, Environment::Production)
        .fetch_held_permission_groups()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(groups, vec![GroupId::from(PROFILE_UID)]);
}

#[tokio::test]
async fn group_definition_is_read_from_profile() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/kataloginformation/behorighetsprofil/{PROFILE_UID}"));
            then.status(200)
                .header("content-type", KATALOG_JSON)
                .body(PROFILE);
        })
        .await;

    let grants = provider(&server, Environment::Production)
        .fetch_permission_group_definition(&GroupId::from(PROFILE_UID))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        grants,
        vec![
            ActivityGrant::new(61001, "rattighetsniva.las"),
            ActivityGrant::new(90019, "rattighetsniva.lokal"),
        ]
    );
}

#[tokio::test]
async fn server_error_body_is_returned_as_api_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/kataloginformation/anvandarbehorighet/egna");
            then.status(500)
                .header("content-type", KATALOG_JSON)
                .body(ERROR_500);
        })
        .await;

    let err = provider(&server, Environment::Production)
        .fetch_held_permission_groups()
        .await
        .unwrap_err();

    match err {
        TransportError::Api(api) => {
            assert_eq!(api.fel_uid, "c0f52d2c-3a5f-11ec-aa00-acd34b504da7");
            assert_eq!(api.meddelande, "java.lang.NullPointerException null");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn int_test_feed_uses_handelser_path() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/handelser/feed/first");
            then.status(200)
                .header("content-type", "application/atom+xml")
                .body(FEED);
        })
        .await;

    let doc = provider(&server, Environment::IntTest)
        .fetch_feed(FeedSelector::First)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(doc.id, "urn:id:12");
    let created = doc.entries[0].content.anvandare_skapad.as_ref().unwrap();
    assert_eq!(created.handelse_uid, "h-1");
    assert_eq!(created.fornamn, "Anna");
}

#[tokio::test]
async fn historical_feed_uses_numeric_segment() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/uppfoljning/feed/4015");
            then.status(200)
                .header("content-type", "application/atom+xml")
                .body(FEED);
        })
        .await;

    provider(&server, Environment::Production)
        .fetch_feed(FeedSelector::Historical(4015))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_content_type_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/kataloginformation/anvandarbehorighet/egna");
            then.status(200).header("content-type", "text/html").body("<html/>");
        })
        .await;

    let err = provider(&server, Environment::Production)
        .fetch_held_permission_groups()
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::UnsupportedContentType("text/html".into()));
}

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&TransportConfig::new(server.base_url())).unwrap()
}

#[tokio::test]
async fn request_body_is_wrapped_in_data_envelope() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/kataloginformation/anvandarbehorighet")
                .header("content-type", "application/json")
                .header("accept", KATALOG_JSON)
                .json_body(json!({"data": {"AnvandareUID": "u-1", "Aktiv": true}}));
            then.status(201)
                .header("content-type", KATALOG_JSON)
                .body(r#"{"Uid": "created-1"}"#);
        })
        .await;

    let created: serde_json::Value = transport(&server)
        .call(
            Method::POST,
            "kataloginformation/anvandarbehorighet",
            &Service::Kataloginformation.accept(Format::Json),
            Some(&json!({"AnvandareUID": "u-1", "Aktiv": true})),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created["Uid"], "created-1");
}

#[tokio::test]
async fn no_content_is_success_for_send() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/kataloginformation/anvandarbehorighet/a-1")
                .json_body(json!({"data": {"Status": "AVSLUTAD"}}));
            then.status(204);
        })
        .await;

    transport(&server)
        .send(
            Method::PUT,
            "kataloginformation/anvandarbehorighet/a-1",
            &Service::Kataloginformation.accept(Format::Json),
            Some(&json!({"Status": "AVSLUTAD"})),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn no_content_is_empty_body_for_typed_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/kataloginformation/anvandarbehorighet/egna");
            then.status(204);
        })
        .await;

    let err = provider(&server, Environment::Production)
        .fetch_held_permission_groups()
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::EmptyBody { status: 204 });
}
