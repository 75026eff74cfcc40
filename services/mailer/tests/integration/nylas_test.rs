use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailcraft_mailer::domain::repository::{MailProvider, OAuthPort};
use mailcraft_mailer::domain::types::{OutgoingMessage, Participant};
use mailcraft_mailer::error::ExternalError;
use mailcraft_mailer::infra::nylas::{NylasClient, NylasSettings};
use mailcraft_testing::fixture::{
    nylas_contact, nylas_draft, nylas_envelope, nylas_list, nylas_message, nylas_token,
};

fn client(server: &MockServer) -> NylasClient {
    NylasClient::new(NylasSettings {
        api_uri: server.uri(),
        api_key: "nyk-test".to_owned(),
        client_id: "client-1".to_owned(),
        client_secret: "secret-1".to_owned(),
        redirect_uri: "http://127.0.0.1:5000/oauth/exchange".to_owned(),
        provider: "google".to_owned(),
    })
}

#[tokio::test]
async fn should_list_messages_with_limit_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/messages"))
        .and(query_param("limit", "5"))
        .and(header("Authorization", "Bearer nyk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nylas_list(vec![
            nylas_message("m1", "Hello", "First body", "ada@example.com"),
            nylas_message("m2", "Again", "Second body", "grace@example.com"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client(&server).list_messages("grant-1", 5).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].subject_or_empty(), "Hello");
    assert_eq!(messages[1].sender().unwrap().email, "grace@example.com");
    assert_eq!(messages[0].thread_id.as_deref(), Some("thread-m1"));
}

#[tokio::test]
async fn should_map_missing_message_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/messages/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "request_id": "r1",
            "error": { "type": "not_found_error", "message": "message not found" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .find_message("grant-1", "gone")
        .await
        .unwrap_err();

    assert_eq!(err, ExternalError::NotFound("message not found".to_owned()));
}

#[tokio::test]
async fn should_map_revoked_grant_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/drafts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("grant revoked"))
        .mount(&server)
        .await;

    let err = client(&server).list_drafts("grant-1").await.unwrap_err();

    assert_eq!(err.kind(), "UNAUTHORIZED");
}

#[tokio::test]
async fn should_post_outgoing_message_to_send_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/grants/grant-1/messages/send"))
        .and(body_partial_json(json!({
            "subject": "Re: Lunch",
            "body": "Sure",
            "to": [{ "email": "ada@example.com" }],
            "reply_to_message_id": "m1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(nylas_envelope(json!({
            "id": "sent-1",
            "thread_id": "thread-m1",
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server)
        .send_message(
            "grant-1",
            &OutgoingMessage {
                subject: "Re: Lunch".to_owned(),
                body: "Sure".to_owned(),
                to: vec![Participant::email_only("ada@example.com")],
                reply_to_message_id: Some("m1".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(sent.id.as_deref(), Some("sent-1"));
}

#[tokio::test]
async fn should_create_and_list_drafts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/grants/grant-1/drafts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(nylas_envelope(nylas_draft("d1", "Hi", "ada@example.com"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/drafts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(nylas_list(vec![nylas_draft("d1", "Hi", "ada@example.com")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let nylas = client(&server);

    let draft = nylas
        .create_draft(
            "grant-1",
            &OutgoingMessage {
                subject: "Hi".to_owned(),
                to: vec![Participant::email_only("ada@example.com")],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let drafts = nylas.list_drafts("grant-1").await.unwrap();

    assert_eq!(draft.id, "d1");
    assert_eq!(drafts[0].to[0].email, "ada@example.com");
}

#[tokio::test]
async fn should_list_contacts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nylas_list(vec![
            nylas_contact("c1", "Ada", "Lovelace", Some("ada@example.com")),
            nylas_contact("c2", "No", "Mail", None),
        ])))
        .mount(&server)
        .await;

    let contacts = client(&server).list_contacts("grant-1").await.unwrap();

    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].display_name(), "Ada Lovelace");
    assert_eq!(contacts[1].primary_email(), None);
}

#[tokio::test]
async fn should_exchange_code_for_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/connect/token"))
        .and(body_partial_json(json!({
            "client_id": "client-1",
            "client_secret": "secret-1",
            "code": "code-abc",
            "grant_type": "authorization_code",
            "redirect_uri": "http://127.0.0.1:5000/oauth/exchange",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(nylas_token("grant-9", "ada@example.com")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server).exchange_code("code-abc").await.unwrap();

    assert_eq!(grant.grant_id, "grant-9");
    assert_eq!(grant.email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn should_report_rejected_code_as_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "type": "invalid_request", "message": "code expired" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).exchange_code("stale").await.unwrap_err();

    assert_eq!(
        err,
        ExternalError::Status {
            status: 400,
            message: "code expired".to_owned()
        }
    );
}

#[tokio::test]
async fn should_report_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/grants/grant-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).list_messages("grant-1", 5).await.unwrap_err();

    assert_eq!(err.kind(), "DECODE");
}
