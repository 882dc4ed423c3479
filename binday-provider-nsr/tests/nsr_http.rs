//! HTTP behaviour of the NSR provider against a local mock server.

use binday_core::model::MatchId;
use binday_core::ports::{FetchCause, FetchRequest, Provider, ProviderError};
use binday_provider_nsr::{DEMO_FIXTURE, NsrProvider};
use chrono::NaiveDate;
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Client;

const SEARCH_PATH: &str = "/api/wastecalendar/search";

fn provider_for(server: &ServerGuard) -> NsrProvider {
    NsrProvider::new(Client::new()).with_search_url(format!("{}{SEARCH_PATH}", server.url()))
}

fn request(match_id: &str) -> FetchRequest {
    FetchRequest::new("Bjuv", "Storgatan 1", MatchId::from(match_id))
}

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid test date")
}

#[tokio::test]
async fn search_sends_encoded_query_and_parses_matches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::UrlEncoded("query".into(), "Storgatan 1, Bjuv".into()))
        .with_status(200)
        // NSR sometimes labels JSON as HTML.
        .with_header("content-type", "text/html")
        .with_body(
            r#"{"fp": [
                {"id": "1", "Adress": "Storgatan 1", "Ort": "Bjuv"},
                {"id": "2", "Adress": "", "Ort": "Bjuv"},
                {"id": 3, "Adress": "Storgatan 1 B"}
            ]}"#,
        )
        .create_async()
        .await;

    let matches = provider_for(&server)
        .search("  Storgatan 1, Bjuv ")
        .await
        .expect("search succeeds");

    let labels: Vec<&str> = matches.iter().map(|found| found.label.as_str()).collect();
    assert_eq!(labels, vec!["Storgatan 1, Bjuv", "Storgatan 1 B"]);
    assert_eq!(matches.get(1).map(|found| found.id.clone()), Some(MatchId::from("3")));
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_query_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let matches = provider_for(&server).search("   ").await.expect("no error");

    assert!(matches.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn http_429_is_rate_limited() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let result = provider_for(&server).search("Storgatan 1").await;

    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn error_status_carries_truncated_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("x".repeat(1_000))
        .create_async()
        .await;

    let result = provider_for(&server).search("Storgatan 1").await;

    match result {
        Err(ProviderError::Upstream { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_fetch_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = provider_for(&server).search("Storgatan 1").await;

    assert!(matches!(
        result,
        Err(ProviderError::FetchFailed(FetchCause::Decode(_)))
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_fetch_failure() {
    let provider = NsrProvider::new(Client::new()).with_search_url("http://127.0.0.1:1/search");

    let result = provider.search("Storgatan 1").await;

    assert!(matches!(
        result,
        Err(ProviderError::FetchFailed(FetchCause::Network(_)))
    ));
}

#[tokio::test]
async fn fetch_normalizes_selected_record() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::UrlEncoded("query".into(), "Storgatan 1".into()))
        .with_status(200)
        .with_body(
            r#"{"fp": [
                {"id": "other", "Adress": "Storgatan 1 B", "Ort": "Bjuv", "Exec": null},
                {"id": "42", "Adress": "Storgatan 1", "Ort": "Bjuv", "Exec": {
                    "Datum": ["2024-03-10", "2024-03-01", "garbage", "2024-03-10", "2024-04-01"],
                    "AvfallsTyp": ["KÄRL 1", "KÄRL 2", "KÄRL 1", "Grovsopor"],
                    "AvfallsTypFormaterat": ["Mat", "Papper", "Mat", "Grovsopor"],
                    "DatumFormaterat": []
                }}
            ]}"#,
        )
        .create_async()
        .await;

    let snapshot = provider_for(&server)
        .fetch(&request("42"))
        .await
        .expect("fetch succeeds");

    assert_eq!(snapshot.provider_id.0, "nsr");
    assert_eq!(snapshot.provider_name, "NSR AB");
    assert_eq!(snapshot.kommun, "Bjuv");
    assert_eq!(snapshot.match_label, "Storgatan 1, Bjuv");

    let events: Vec<(NaiveDate, &str, Option<&str>)> = snapshot
        .events
        .iter()
        .map(|event| {
            (
                event.date,
                event.type_raw.as_str(),
                event.container_number.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        events,
        vec![
            (date("2024-03-01"), "KÄRL 2", Some("2")),
            (date("2024-03-10"), "KÄRL 1", Some("1")),
            (date("2024-03-10"), "Grovsopor", None),
        ]
    );
}

#[tokio::test]
async fn fetch_of_vanished_property_is_match_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"fp": [{"id": "1", "Adress": "Storgatan 1", "Ort": "Bjuv"}]}"#)
        .create_async()
        .await;
    let provider = provider_for(&server);

    let result = provider.fetch(&request("999")).await;
    assert!(matches!(result, Err(ProviderError::MatchNotFound)));

    // The search itself still succeeds with results.
    assert_eq!(provider.search("Storgatan 1").await.expect("search").len(), 1);
}

#[tokio::test]
async fn fetch_rate_limit_is_not_match_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .create_async()
        .await;

    let result = provider_for(&server).fetch(&request("1")).await;

    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn demo_and_live_payloads_normalize_identically() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", SEARCH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(DEMO_FIXTURE)
        .create_async()
        .await;

    let live = provider_for(&server);
    let demo = NsrProvider::demo(Client::new());

    for match_id in ["3405617", "3405618", "3412001"] {
        let from_live = live.fetch(&request(match_id)).await.expect("live fetch");
        let from_demo = demo.fetch(&request(match_id)).await.expect("demo fetch");
        assert!(!from_demo.events.is_empty());
        assert_eq!(from_live, from_demo);
    }

    let live_matches = live.search("Storgatan 1").await.expect("live search");
    let demo_matches = demo.search("Storgatan 1").await.expect("demo search");
    assert_eq!(live_matches, demo_matches);
}

#[tokio::test]
async fn demo_fixture_schedule_is_sorted() {
    let demo = NsrProvider::demo(Client::new());

    let snapshot = demo.fetch(&request("3405617")).await.expect("demo fetch");

    let dates: Vec<NaiveDate> = snapshot.events.iter().map(|event| event.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(snapshot.events.len(), 7);
    assert_eq!(snapshot.match_label, "Storgatan 1, Bjuv");
}
