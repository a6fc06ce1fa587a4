use std::sync::Arc;

use bulk_mailer::error::ErrorResponse;
use bulk_mailer::mailer::{BulkDispatcher, DeliveryStatus, MailerConfig};
use bulk_mailer::routes::send::{SendResponse, send};
use bulk_mailer::test_support::{
    ScriptedConnector, ScriptedGateway, TestRocketBuilder, scripted_dispatcher,
};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use serde_json::json;

async fn client_with(dispatcher: BulkDispatcher) -> Client {
    TestRocketBuilder::new()
        .manage_dispatcher(dispatcher)
        .mount_api_routes(routes![send])
        .async_client()
        .await
}

#[tokio::test]
async fn partial_failure_reports_every_recipient() {
    let gateway = Arc::new(
        ScriptedGateway::new().fail_recipient("b@y.com", "550 mailbox unavailable"),
    );
    let client = client_with(scripted_dispatcher(Arc::clone(&gateway))).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(
            json!({
                "emails": "a@x.com, b@y.com; c@z.org",
                "subject": "Quarterly update",
                "message": "Hello\nSee you soon"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let payload: SendResponse = response.into_json().await.expect("valid JSON payload");
    assert!(payload.success);
    assert_eq!(payload.success_count, 2);
    assert_eq!(payload.failure_count, 1);
    assert_eq!(
        payload.message,
        "Sent to 2 recipient(s), failed to send to 1 recipient(s)"
    );

    let addresses: Vec<&str> = payload.results.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(addresses, vec!["a@x.com", "b@y.com", "c@z.org"]);
    assert_eq!(payload.results[1].status, DeliveryStatus::Failed);
    assert_eq!(
        payload.results[1].error_detail.as_deref(),
        Some("550 mailbox unavailable")
    );

    let message = gateway.last_message().expect("a message was sent");
    assert_eq!(message.subject, "Quarterly update");
    assert_eq!(message.html_body, "Hello<br>See you soon");
}

#[tokio::test]
async fn total_failure_returns_server_error() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .fail_recipient("a@x.com", "rejected")
            .fail_recipient("b@y.com", "rejected"),
    );
    let client = client_with(scripted_dispatcher(gateway)).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(json!({"emails": "a@x.com b@y.com", "subject": "Hi", "message": "Body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let payload: SendResponse = response.into_json().await.expect("valid JSON payload");
    assert!(!payload.success);
    assert_eq!(payload.failure_count, 2);
    assert_eq!(payload.message, "Failed to send emails to all 2 recipient(s)");
}

#[tokio::test]
async fn unreachable_server_sends_nothing() {
    let gateway = Arc::new(ScriptedGateway::new().unreachable());
    let client = client_with(scripted_dispatcher(Arc::clone(&gateway))).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(json!({"emails": "a@x.com", "subject": "Hi", "message": "Body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.error, "TransportUnavailable");
    assert_eq!(gateway.verify_calls(), 1);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn invalid_addresses_are_listed_and_nothing_is_sent() {
    let gateway = Arc::new(ScriptedGateway::new());
    let client = client_with(scripted_dispatcher(Arc::clone(&gateway))).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(
            json!({"emails": "a@x.com, nope, also@bad", "subject": "Hi", "message": "Body"})
                .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.error, "InvalidAddresses");
    assert_eq!(
        payload.invalid_emails,
        Some(vec!["nope".to_string(), "also@bad".to_string()])
    );
    assert_eq!(gateway.verify_calls(), 0);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let client = client_with(scripted_dispatcher(Arc::new(ScriptedGateway::new()))).await;

    for body in [
        json!({"subject": "Hi", "message": "Body"}),
        json!({"emails": "a@x.com", "subject": "   ", "message": "Body"}),
        json!({"emails": "a@x.com", "subject": "Hi"}),
    ] {
        let response = client
            .post("/api/send")
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
        assert_eq!(payload.error, "MissingFields");
    }
}

#[tokio::test]
async fn separators_only_means_no_recipients() {
    let client = client_with(scripted_dispatcher(Arc::new(ScriptedGateway::new()))).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(json!({"emails": " ,;  ", "subject": "Hi", "message": "Body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.error, "NoRecipients");
}

#[tokio::test]
async fn missing_credentials_fail_before_contacting_server() {
    let gateway = Arc::new(ScriptedGateway::new());
    let dispatcher = BulkDispatcher::new(
        MailerConfig::unconfigured(),
        Arc::new(ScriptedConnector::new(Arc::clone(&gateway))),
    );
    let client = client_with(dispatcher).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(json!({"emails": "a@x.com", "subject": "Hi", "message": "Body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.error, "MisconfiguredCredentials");
    assert_eq!(gateway.verify_calls(), 0);
}

#[tokio::test]
async fn malformed_json_returns_json_error() {
    let client = client_with(scripted_dispatcher(Arc::new(ScriptedGateway::new()))).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let payload: serde_json::Value = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload["success"], false);
}

#[tokio::test]
async fn malformed_sender_is_a_configuration_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    let dispatcher = BulkDispatcher::new(
        MailerConfig::for_sender("not an address", "pw"),
        Arc::new(ScriptedConnector::new(Arc::clone(&gateway))),
    );
    let client = client_with(dispatcher).await;

    let response = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(json!({"emails": "a@x.com", "subject": "Hi", "message": "Body"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);

    let payload: ErrorResponse = response.into_json().await.expect("valid JSON payload");
    assert_eq!(payload.error, "MisconfiguredSender");
    assert_eq!(gateway.verify_calls(), 0);
}
