//! admin-ajax transport against a mock server.
//!
//! GREEN when:
//! - the request carries action + nonce in the query and the three form fields
//! - `{"success": true}` is accepted
//! - `{"success": false}` and non-JSON 2xx bodies are application rejections
//! - non-2xx statuses and refused connections are transport failures
//! - a full controller edit over HTTP persists and advances focus

use httpmock::prelude::*;
use serde_json::json;
use smoc_field::{
    shared_registry, AuthToken, ControllerConfig, EditOutcome, FailureOrigin, FieldAttrs,
    FieldController, FieldKey, OrderUpdate, RecordId, Transport, UpdateError,
};
use smoc_transport_http::AdminAjaxTransport;

const AJAX_PATH: &str = "/wp-admin/admin-ajax.php";

fn request(endpoint: String) -> OrderUpdate {
    OrderUpdate {
        endpoint,
        record_type: "product".to_string(),
        record_id: RecordId::new(42).unwrap(),
        menu_order: 7,
        auth_token: AuthToken::parse(Some("abc123")).unwrap(),
    }
}

#[tokio::test]
async fn success_envelope_is_accepted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(AJAX_PATH)
                .query_param("action", "smoc_reorder")
                .query_param("_wpnonce", "abc123")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("post_type=product")
                .body_contains("post_id=42")
                .body_contains("post_menu_order=7");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let t = AdminAjaxTransport::new();
    let ack = t.update_order(&request(server.url(AJAX_PATH))).await.unwrap();
    assert_eq!(ack.message, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn custom_action_goes_in_the_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(AJAX_PATH)
                .query_param("action", "shop_reorder");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let t = AdminAjaxTransport::new_with_action("shop_reorder".to_string());
    assert!(t.update_order(&request(server.url(AJAX_PATH))).await.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn success_false_is_rejected_with_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(AJAX_PATH);
            then.status(200)
                .json_body(json!({"success": false, "data": {"message": "not allowed"}}));
        })
        .await;

    let err = AdminAjaxTransport::new()
        .update_order(&request(server.url(AJAX_PATH)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        UpdateError::Rejected {
            message: Some("not allowed".to_string())
        }
    );
    assert_eq!(err.origin(), FailureOrigin::Rejected);
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(AJAX_PATH);
            then.status(200).body("0");
        })
        .await;

    let err = AdminAjaxTransport::new()
        .update_order(&request(server.url(AJAX_PATH)))
        .await
        .unwrap_err();
    assert_eq!(err.origin(), FailureOrigin::Rejected);
}

#[tokio::test]
async fn error_status_is_a_transport_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(AJAX_PATH);
            // check_ajax_referer() answers a bad nonce with 403 "-1".
            then.status(403).body("-1");
        })
        .await;

    let err = AdminAjaxTransport::new()
        .update_order(&request(server.url(AJAX_PATH)))
        .await
        .unwrap_err();
    assert_eq!(err.origin(), FailureOrigin::Transport);
    assert!(err.to_string().contains("status=403"), "{err}");
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    let err = AdminAjaxTransport::new()
        .update_order(&request("http://127.0.0.1:1/wp-admin/admin-ajax.php".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.origin(), FailureOrigin::Transport);
}

#[tokio::test]
async fn controller_edit_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(AJAX_PATH)
                .query_param("_wpnonce", "n-42")
                .body_contains("post_menu_order=3");
            then.status(200).json_body(json!({"success": true}));
        })
        .await;

    let ctl = FieldController::new(
        ControllerConfig::new("page", server.url(AJAX_PATH)),
        shared_registry([
            (FieldKey::new("smoc-42"), FieldAttrs::new("42", "n-42", 1)),
            (FieldKey::new("smoc-43"), FieldAttrs::new("43", "n-43", 2)),
        ]),
        AdminAjaxTransport::new(),
    );

    let k42 = FieldKey::new("smoc-42");
    assert!(ctl.on_focus(&k42));
    let out = ctl.on_confirm_key(&k42, "3").await;
    assert_eq!(
        out,
        EditOutcome::Updated {
            value: 3,
            next: Some(FieldKey::new("smoc-43"))
        }
    );
    assert_eq!(ctl.focused(), Some(FieldKey::new("smoc-43")));
    mock.assert_async().await;
}
