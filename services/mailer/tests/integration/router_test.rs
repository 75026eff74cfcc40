use std::str::FromStr;
use std::time::Duration as StdDuration;

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use chrono::Duration;
use cron::Schedule;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailcraft_core::retry::RetryPolicy;
use mailcraft_mailer::domain::repository::GrantStore;
use mailcraft_mailer::infra::nylas::{NylasClient, NylasSettings};
use mailcraft_mailer::infra::openai::OpenAiClient;
use mailcraft_mailer::infra::session::{MemoryGrantStore, SessionStore};
use mailcraft_mailer::router::build_router;
use mailcraft_mailer::scheduler::CampaignScheduler;
use mailcraft_mailer::state::AppState;
use mailcraft_session::grant::Grant;
use mailcraft_testing::fixture::{chat_completion, nylas_list, nylas_message, nylas_token};
use mailcraft_testing::session::MockSession;

use crate::helpers::memory_db;

const RECURRENCE: &str = "0 0 9 * * Mon *";

struct Harness {
    server: TestServer,
    upstream: MockServer,
    grants: MemoryGrantStore,
    session: MockSession,
}

impl Harness {
    async fn new() -> Self {
        let upstream = MockServer::start().await;
        let grants = MemoryGrantStore::new();
        let state = AppState {
            db: memory_db().await,
            sessions: SessionStore::Memory(grants.clone()),
            nylas: NylasClient::new(NylasSettings {
                api_uri: upstream.uri(),
                api_key: "nyk-test".to_owned(),
                client_id: "client-1".to_owned(),
                client_secret: "secret-1".to_owned(),
                redirect_uri: "http://127.0.0.1:5000/oauth/exchange".to_owned(),
                provider: "google".to_owned(),
            }),
            openai: OpenAiClient::new(upstream.uri(), "sk-test", "gpt-4o-mini"),
            scheduler: CampaignScheduler::new(
                StdDuration::from_secs(30),
                Schedule::from_str(RECURRENCE).unwrap(),
            ),
            retry: RetryPolicy::once(),
            session_ttl_secs: 3600,
            cookie_secure: false,
            sender: None,
            recurrence_expr: RECURRENCE.to_owned(),
        };
        Self {
            server: TestServer::new(build_router(state)).unwrap(),
            upstream,
            grants,
            session: MockSession::new(),
        }
    }

    /// Harness whose session already holds an active grant.
    async fn signed_in() -> Self {
        let harness = Self::new().await;
        harness
            .grants
            .put(
                &harness.session.session_id,
                &Grant::new("grant-1", Some("me@example.com".to_owned()), Duration::hours(1)),
            )
            .await
            .unwrap();
        harness
    }

    fn cookie(&self) -> HeaderValue {
        HeaderValue::from_str(&self.session.cookie()).unwrap()
    }
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_live_and_ready() {
    let h = Harness::new().await;

    h.server.get("/healthz").await.assert_status_ok();
    let ready = h.server.get("/readyz").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["detail"], "memory");
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_protected_route_without_session() {
    let h = Harness::new().await;

    let resp = h.server.get("/nylas/recent-emails").await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "NOT_AUTHENTICATED");
    assert_eq!(body["reauthenticate"], "/nylas/auth");
}

#[tokio::test]
async fn should_report_expired_grant() {
    let h = Harness::new().await;
    h.grants
        .put(
            &h.session.session_id,
            &Grant::new("grant-1", None, Duration::seconds(-10)),
        )
        .await
        .unwrap();

    let resp = h
        .server
        .get("/nylas/view-campaigns")
        .add_header(header::COOKIE, h.cookie())
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "GRANT_EXPIRED");
}

#[tokio::test]
async fn should_redirect_to_provider_when_signed_out() {
    let h = Harness::new().await;

    let resp = h.server.get("/nylas/auth").await;

    resp.assert_status(StatusCode::SEE_OTHER);
    let location = resp.header(header::LOCATION);
    let location = location.to_str().unwrap();
    assert!(location.starts_with(&format!("{}/v3/connect/auth?", h.upstream.uri())));
    assert!(location.contains("client_id=client-1"));
}

#[tokio::test]
async fn should_describe_active_grant() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .get("/nylas/auth")
        .add_header(header::COOKIE, h.cookie())
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["grant_id"], "grant-1");
    assert_eq!(body["email"], "me@example.com");
    assert!(body["expires_in"].as_i64().unwrap() > 3500);
}

#[tokio::test]
async fn should_exchange_code_and_set_session_cookie() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/v3/connect/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(nylas_token("grant-7", "me@example.com")),
        )
        .expect(1)
        .mount(&h.upstream)
        .await;

    let resp = h.server.get("/oauth/exchange?code=abc").await;

    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header(header::LOCATION), "/nylas/auth");
    let cookie = resp.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("mailcraft_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn should_reject_exchange_without_code() {
    let h = Harness::new().await;

    let resp = h.server.get("/oauth/exchange").await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "MISSING_FIELD");
}

#[tokio::test]
async fn should_clear_grant_on_logout() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .delete("/nylas/auth")
        .add_header(header::COOKIE, h.cookie())
        .await;

    resp.assert_status(StatusCode::NO_CONTENT);
    assert!(h.grants.get(&h.session.session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn should_self_check_provider_client() {
    let h = Harness::new().await;

    let resp = h.server.get("/test-nylas").await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "success");
}

// ── Inbox & assist ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_recent_emails_for_grant() {
    let h = Harness::signed_in().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nylas_list(vec![nylas_message(
            "m1",
            "Hello",
            "Body",
            "ada@example.com",
        )])))
        .expect(1)
        .mount(&h.upstream)
        .await;

    let resp = h
        .server
        .get("/nylas/recent-emails")
        .add_header(header::COOKIE, h.cookie())
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body[0]["id"], "m1");
    assert_eq!(body[0]["subject"], "Hello");
}

#[tokio::test]
async fn should_generate_marketing_email() {
    let h = Harness::signed_in().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(" Big sale! ")))
        .mount(&h.upstream)
        .await;

    let resp = h
        .server
        .post("/nylas/generate-email")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({ "prompt": "spring sale" }))
        .await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["email_content"], "Big sale!");
}

// ── Recipients & campaigns ───────────────────────────────────────────────────

#[tokio::test]
async fn should_upsert_recipients_without_duplicates() {
    let h = Harness::signed_in().await;

    for name in ["Ada", "Ada Lovelace"] {
        h.server
            .post("/nylas/manage-recepients")
            .add_header(header::COOKIE, h.cookie())
            .json(&json!({ "name": name, "email": "ada@example.com" }))
            .await
            .assert_status_ok();
    }
    h.server
        .post("/nylas/import-csv")
        .add_header(header::COOKIE, h.cookie())
        .text("name,email\nGrace,grace@example.com\n")
        .await
        .assert_status_ok();

    let resp = h
        .server
        .get("/nylas/manage-recepients")
        .add_header(header::COOKIE, h.cookie())
        .await;
    let body: Value = resp.json();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["name"], "Ada Lovelace");

    let count: Value = h
        .server
        .get("/nylas/send-bulk-email")
        .add_header(header::COOKIE, h.cookie())
        .await
        .json();
    assert_eq!(count["recipient_count"], 2);
}

#[tokio::test]
async fn should_create_schedule_and_list_campaign() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .post("/nylas/create-campaign")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({
            "name": "Launch",
            "subject": "We are live",
            "body": "Come and see",
            "schedule_type": "once",
            "schedule_days": 2,
        }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let created: Value = resp.json();
    assert_eq!(created["status"], "scheduled");
    assert_eq!(created["job"]["type"], "once");
    let id = created["id"].as_i64().unwrap();

    let listed: Value = h
        .server
        .get("/nylas/view-campaigns")
        .add_header(header::COOKIE, h.cookie())
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id);

    let resp = h
        .server
        .post(&format!("/nylas/schedule-campaign/{id}"))
        .add_header(header::COOKIE, h.cookie())
        .await;
    resp.assert_status_ok();
    let job: Value = resp.json();
    assert_eq!(job["campaign_id"], id);
}

#[tokio::test]
async fn should_reject_unknown_schedule_type() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .post("/nylas/create-campaign")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({
            "name": "Launch",
            "subject": "We are live",
            "body": "Come and see",
            "schedule_type": "hourly",
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "INVALID_SCHEDULE");
}

#[tokio::test]
async fn should_reject_schedule_days_past_the_calendar() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .post("/nylas/create-campaign")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({
            "name": "Launch",
            "subject": "We are live",
            "body": "Come and see",
            "schedule_type": "once",
            "schedule_days": i64::MAX,
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "INVALID_SCHEDULE");
}

#[tokio::test]
async fn should_return_not_found_for_unknown_campaign() {
    let h = Harness::signed_in().await;

    let resp = h
        .server
        .post("/nylas/schedule-campaign/42")
        .add_header(header::COOKIE, h.cookie())
        .await;

    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_fail_bulk_send_when_every_recipient_fails() {
    let h = Harness::signed_in().await;
    Mock::given(method("POST"))
        .and(path("/v3/grants/grant-1/messages/send"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "invalid recipient" }
        })))
        .mount(&h.upstream)
        .await;
    h.server
        .post("/nylas/manage-recepients")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .await
        .assert_status_ok();

    let resp = h
        .server
        .post("/nylas/send-bulk-email")
        .add_header(header::COOKIE, h.cookie())
        .json(&json!({ "subject": "News", "body": "Fresh news" }))
        .await;

    resp.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = resp.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errors"][0]["email"], "ada@example.com");
    assert_eq!(body["errors"][0]["kind"], "UPSTREAM_STATUS");
}
