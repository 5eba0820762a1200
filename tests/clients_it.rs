use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trackbridge::model::WorkLog;
use trackbridge::trello::TrelloClient;
use trackbridge::youtrack::YouTrackClient;
use trackbridge::{BoardSource, IssueTracker};

const CARD_ID: &str = "5a4a0a4e1234567890abcdef";
const IDLE_CARD_ID: &str = "5a4a0a4f1234567890abcdef";
const DONE_CARD_ID: &str = "5a4a0a501234567890abcdef";

fn trello(server: &MockServer) -> TrelloClient {
    TrelloClient::with_base_url(
        "key".into(),
        "token".into(),
        Url::parse(&format!("{}/", server.uri())).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn youtrack(server: &MockServer) -> YouTrackClient {
    YouTrackClient::new(
        Url::parse(&server.uri()).unwrap(),
        "perm-token".into(),
        false,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn work_log(issue_id: &str) -> WorkLog {
    WorkLog {
        issue_id: issue_id.into(),
        duration_minutes: 45,
        description: "code review".into(),
        work_type: "Development".into(),
        date: Utc.with_ymd_and_hms(2018, 1, 1, 1, 1, 1).unwrap(),
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn moved(id: &str, at: &str, from: &str, to: &str) -> serde_json::Value {
    json!({ "id": id, "type": "updateCard", "date": at,
            "data": { "listBefore": { "name": from }, "listAfter": { "name": to } } })
}

#[tokio::test]
async fn trello_returns_only_cards_in_the_list() {
    let server = MockServer::start().await;
    let back_in_doing = rfc3339(Utc::now() - chrono::Duration::minutes(120));

    Mock::given(method("GET"))
        .and(path("/1/boards/board-1/cards"))
        .and(query_param("key", "key"))
        .and(query_param("token", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": CARD_ID, "name": "https://yt.example.com/issue/MAT-1 login", "desc": "details" },
            { "id": IDLE_CARD_ID, "name": "sitting in Todo", "desc": "" },
            { "id": DONE_CARD_ID, "name": "finished", "desc": "" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Newest first, as Trello returns them.
    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{CARD_ID}/actions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            moved("a4", &back_in_doing, "Review", "Doing"),
            moved("a3", "2018-01-01T11:30:00.000Z", "Doing", "Review"),
            moved("a2", "2018-01-01T10:00:00.000Z", "Todo", "Doing"),
            { "id": "a1", "type": "createCard", "date": "2018-01-01T09:00:00.000Z",
              "data": { "list": { "name": "Todo" } } }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{IDLE_CARD_ID}/actions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "b1", "type": "createCard", "date": "2018-01-01T09:00:00.000Z",
              "data": { "list": { "name": "Todo" } } }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{DONE_CARD_ID}/actions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            moved("c2", "2018-01-01T11:00:00.000Z", "Doing", "Done"),
            { "id": "c1", "type": "createCard", "date": "2018-01-01T09:00:00.000Z",
              "data": { "list": { "name": "Doing" } } }
        ])))
        .mount(&server)
        .await;

    let cards = trello(&server).get_cards("board-1", "Doing").await.unwrap();
    let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["https://yt.example.com/issue/MAT-1 login"]);
    assert_eq!(cards[0].description, "details");
    // 90 minutes in 2018 plus the current two-hour stint.
    assert_eq!(cards[0].duration_minutes, 210);
    assert_eq!(cards[0].date.timestamp(), 0x5a4a0a4e);
}

#[tokio::test]
async fn trello_card_in_todo_is_not_in_doing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/boards/b/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": IDLE_CARD_ID, "name": "sitting in Todo", "desc": "" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{IDLE_CARD_ID}/actions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "b1", "type": "createCard", "date": "2018-01-01T09:00:00.000Z",
              "data": { "list": { "name": "Todo" } } }
        ])))
        .mount(&server)
        .await;

    let cards = trello(&server).get_cards("b", "Doing").await.unwrap();
    assert!(cards.is_empty());
}

#[tokio::test]
async fn trello_follows_action_pages() {
    let server = MockServer::start().await;
    let back_in_doing = rfc3339(Utc::now() - chrono::Duration::minutes(60));

    Mock::given(method("GET"))
        .and(path("/1/boards/board-1/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": CARD_ID, "name": "long lived", "desc": "" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{CARD_ID}/actions")))
        .and(query_param("limit", "2"))
        .and(query_param_is_missing("before"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            moved("a3", &back_in_doing, "Review", "Doing"),
            moved("a2", "2018-01-01T11:30:00.000Z", "Doing", "Review")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/1/cards/{CARD_ID}/actions")))
        .and(query_param("before", "a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            moved("a1", "2018-01-01T10:00:00.000Z", "Todo", "Doing")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let cards = trello(&server)
        .with_action_page_size(2)
        .get_cards("board-1", "Doing")
        .await
        .unwrap();
    assert_eq!(cards.len(), 1);
    // 90 minutes from the older page plus the current one-hour stint.
    assert_eq!(cards[0].duration_minutes, 150);
}

#[tokio::test]
async fn trello_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/boards/board-1/cards"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = trello(&server).get_cards("board-1", "Doing").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn youtrack_resolves_issue_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/MAT-123"))
        .and(header("Authorization", "Bearer perm-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idReadable": "MAT-123",
            "summary": "this title is from youtrack",
            "customFields": [ { "name": "State", "value": { "name": "Open" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issue = youtrack(&server).resolve_issue("MAT-123").await.unwrap();
    assert_eq!(issue.find_field("summary"), Some("this title is from youtrack"));
    assert_eq!(issue.find_field("State"), Some("Open"));
}

#[tokio::test]
async fn youtrack_missing_issue_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/GONE-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = youtrack(&server).resolve_issue("GONE-1").await.unwrap_err();
    assert!(err.to_string().contains("GONE-1 not found"));
}

#[tokio::test]
async fn youtrack_submits_work_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issues/MAT-123/timeTracking/workItems"))
        .and(header("Authorization", "Bearer perm-token"))
        .and(body_json(json!({
            "date": 1_514_768_461_000_i64,
            "duration": { "minutes": 45 },
            "text": "code review",
            "type": { "name": "Development" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1-1" })))
        .expect(1)
        .mount(&server)
        .await;

    youtrack(&server)
        .submit_work_log(&work_log("MAT-123"))
        .await
        .unwrap();
}

#[tokio::test]
async fn youtrack_rejected_work_item_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issues/MAT-9/timeTracking/workItems"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad work type"))
        .mount(&server)
        .await;

    let err = youtrack(&server)
        .submit_work_log(&work_log("MAT-9"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad work type"));
}
