use std::sync::Arc;

use welcomebot::testing::MockTimeline;
use welcomebot::{Booster, BoosterSettings, MastodonClient, MastodonCredentials, Status, StatusId};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn booster(mock: &MockTimeline, batch_size: u32) -> Booster<MockTimeline> {
    Booster::new(
        Arc::new(mock.clone()),
        BoosterSettings {
            batch_size,
            dry_run: false,
        },
    )
    .expect("valid settings")
}

fn ids(raw: &[&str]) -> Vec<StatusId> {
    raw.iter().map(|id| StatusId::from(*id)).collect()
}

fn statuses(range: std::ops::RangeInclusive<u32>) -> Vec<Status> {
    range.map(|id| Status::public(id.to_string())).collect()
}

#[tokio::test]
async fn two_page_scan_boosts_everything_in_order() {
    let mock = MockTimeline::with_posts(statuses(40..=50));
    let cursor = booster(&mock, 3)
        .scan("introductions", Some(&StatusId::from("45")))
        .await
        .expect("scan");

    assert_eq!(cursor, Some(StatusId::from("50")));
    assert_eq!(mock.reblogged(), ids(&["50", "49", "48", "47", "46"]));
    let windows: Vec<_> = mock
        .page_queries()
        .into_iter()
        .map(|query| (query.since_id, query.max_id))
        .collect();
    assert_eq!(
        windows,
        vec![
            (Some(StatusId::from("45")), None),
            (Some(StatusId::from("45")), Some(StatusId::from("48"))),
        ]
    );
}

#[tokio::test]
async fn cursor_ignores_how_many_pages_followed() {
    let mock = MockTimeline::with_posts(statuses(1..=100));
    let cursor = booster(&mock, 7)
        .scan("introductions", Some(&StatusId::from("60")))
        .await
        .expect("scan");

    assert_eq!(cursor, Some(StatusId::from("100")));
    assert_eq!(mock.reblogged().len(), 40);
    // 40 posts in pages of 7: five full pages, one of five
    assert_eq!(mock.page_queries().len(), 6);
}

#[tokio::test]
async fn rescanning_without_new_posts_is_a_no_op() {
    let mock = MockTimeline::with_posts(statuses(1..=5));
    let booster = booster(&mock, 3);

    let first = booster
        .scan("introductions", Some(&StatusId::from("2")))
        .await
        .expect("first scan");
    assert_eq!(first, Some(StatusId::from("5")));
    mock.clear_calls();

    let second = booster
        .scan("introductions", first.as_ref())
        .await
        .expect("second scan");
    assert_eq!(second, first);
    assert!(mock.reblogged().is_empty());

    let third = booster
        .scan("introductions", second.as_ref())
        .await
        .expect("third scan");
    assert_eq!(third, first);
    assert!(mock.reblogged().is_empty());
}

#[tokio::test]
async fn new_posts_after_a_scan_are_picked_up_once() {
    let mock = MockTimeline::with_posts(statuses(1..=3));
    let booster = booster(&mock, 2);

    let cursor = booster
        .resolve_cursor("introductions", None)
        .await
        .expect("bootstrap");
    assert_eq!(cursor, Some(StatusId::from("3")));

    mock.publish(statuses(4..=8));
    let cursor = booster
        .scan("introductions", cursor.as_ref())
        .await
        .expect("scan");
    assert_eq!(cursor, Some(StatusId::from("8")));
    assert_eq!(mock.reblogged(), ids(&["8", "7", "6", "5", "4"]));
}

#[tokio::test]
async fn empty_hashtag_bootstraps_to_nothing_then_sees_everything() {
    let mock = MockTimeline::new();
    let booster = booster(&mock, 20);

    let cursor = booster
        .most_recent_id("introductions")
        .await
        .expect("bootstrap");
    assert_eq!(cursor, None);

    mock.publish(statuses(1..=2));
    let next = booster
        .scan("introductions", cursor.as_ref())
        .await
        .expect("scan");
    assert_eq!(next, Some(StatusId::from("2")));
    assert_eq!(mock.reblogged(), ids(&["2", "1"]));
}

#[tokio::test]
async fn full_page_with_reply_counts_all_but_boosts_two() {
    let mock = MockTimeline::new();
    let mut reply = Status::public("49");
    reply.in_reply_to_account_id = Some("12".into());
    mock.push_page(vec![Status::public("50"), reply, Status::public("48")]);

    let outcome = booster(&mock, 3)
        .process_batch("introductions", Some(&StatusId::from("40")), None)
        .await
        .expect("batch");
    assert_eq!(outcome.count, 3);
    assert_eq!(mock.reblogged(), ids(&["50", "48"]));
}

#[tokio::test]
async fn scan_against_http_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "tok" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/timelines/tag/introductions"))
        .and(query_param("since_id", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "42", "visibility": "public", "account": { "acct": "alice" } },
            { "id": "41", "visibility": "public", "in_reply_to_id": "7", "in_reply_to_account_id": "3" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/statuses/42/reblog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "43", "visibility": "public"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = MastodonCredentials {
        api_base_url: reqwest::Url::parse(&server.uri()).expect("server uri"),
        username: "bot".into(),
        password: "pw".into(),
        client_id: "id".into(),
        client_secret: "secret".into(),
    };
    let client = MastodonClient::login(&credentials, None)
        .await
        .expect("login");
    let booster = Booster::new(Arc::new(client), BoosterSettings::default()).expect("booster");

    let cursor = booster
        .scan("#introductions", Some(&StatusId::from("40")))
        .await
        .expect("scan");
    assert_eq!(cursor, Some(StatusId::from("42")));
}
