//! smoc-transport-http
//!
//! [`Transport`] over the WordPress admin-ajax reorder action.
//!
//! ```text
//! POST {endpoint}?action=smoc_reorder&_wpnonce={token}
//! Content-Type: application/x-www-form-urlencoded
//!
//! post_type={record_type}&post_id={record_id}&post_menu_order={value}
//! ```
//!
//! Result mapping:
//! - 2xx with `{"success": true}`: accepted
//! - 2xx with `success: false`, or a body that is not the JSON envelope:
//!   rejected by the application
//! - connection failure or non-2xx status: transport failure

use serde::Deserialize;
use serde_json::Value;
use smoc_field::{OrderUpdate, Transport, UpdateAck, UpdateError};
use tracing::debug;

pub use smoc_field::DEFAULT_ACTION;

/// reqwest-backed admin-ajax transport.
///
/// The endpoint comes from each [`OrderUpdate`]; only the action is fixed
/// per transport. Nonces are sent but never logged.
#[derive(Debug, Clone)]
pub struct AdminAjaxTransport {
    http: reqwest::Client,
    action: String,
}

impl Default for AdminAjaxTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminAjaxTransport {
    pub fn new() -> Self {
        Self::new_with_action(DEFAULT_ACTION.to_string())
    }

    pub fn new_with_action(action: String) -> Self {
        Self::with_client(reqwest::Client::new(), action)
    }

    /// Use a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(http: reqwest::Client, action: String) -> Self {
        Self { http, action }
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

#[async_trait::async_trait]
impl Transport for AdminAjaxTransport {
    fn name(&self) -> &'static str {
        "admin-ajax"
    }

    async fn update_order(&self, req: &OrderUpdate) -> Result<UpdateAck, UpdateError> {
        let post_id = req.record_id.to_string();
        let menu_order = req.menu_order.to_string();

        let resp = self
            .http
            .post(&req.endpoint)
            .query(&[
                ("action", self.action.as_str()),
                ("_wpnonce", req.auth_token.as_str()),
            ])
            .form(&[
                ("post_type", req.record_type.as_str()),
                ("post_id", post_id.as_str()),
                ("post_menu_order", menu_order.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UpdateError::Transport(format!("admin-ajax request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpdateError::Transport(format!(
                "admin-ajax http error status={}",
                status.as_u16()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| UpdateError::Transport(format!("admin-ajax body read failed: {e}")))?;

        let body: AjaxResponse = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) => {
                debug!(record_id = %req.record_id, error = %e, "admin-ajax response json decode failed");
                return Err(UpdateError::Rejected {
                    message: Some("unreadable response".to_string()),
                });
            }
        };

        if body.success {
            Ok(UpdateAck {
                message: body.message(),
            })
        } else {
            Err(UpdateError::Rejected {
                message: body.message(),
            })
        }
    }
}

/// `wp_send_json_success` / `wp_send_json_error` envelope.
#[derive(Debug, Clone, Deserialize)]
struct AjaxResponse {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

impl AjaxResponse {
    /// `data` as a plain string, or its `message` field.
    fn message(&self) -> Option<String> {
        match self.data.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> AjaxResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn message_from_string_or_object_data() {
        assert_eq!(
            parse(json!({"success": false, "data": "nope"})).message(),
            Some("nope".to_string())
        );
        assert_eq!(
            parse(json!({"success": false, "data": {"message": "bad nonce"}})).message(),
            Some("bad nonce".to_string())
        );
        assert_eq!(parse(json!({"success": true})).message(), None);
        assert_eq!(parse(json!({"success": true, "data": 3})).message(), None);
    }

    #[test]
    fn default_action_is_reorder() {
        assert_eq!(AdminAjaxTransport::new().action(), "smoc_reorder");
        assert_eq!(AdminAjaxTransport::new().action(), smoc_field::DEFAULT_ACTION);
    }
}
