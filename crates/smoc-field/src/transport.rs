//! Transport boundary: the adapter that persists one order update.
//!
//! The surrounding application implements [`Transport`] (HTTP, in-memory,
//! mock); the controller only ever calls it through
//! [`crate::FieldController::submit`], after the field is validated and
//! locked.

use std::fmt;
use std::sync::Arc;

use crate::field::FailureOrigin;
use crate::validate::{AuthToken, RecordId};

/// Action name the reorder endpoint dispatches updates on.
pub const DEFAULT_ACTION: &str = "smoc_reorder";

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One order update, as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    /// Request endpoint from the controller config.
    pub endpoint: String,
    /// Record-type discriminator from the controller config (e.g. `"product"`).
    pub record_type: String,
    pub record_id: RecordId,
    pub menu_order: i64,
    pub auth_token: AuthToken,
}

/// Affirmative answer from the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAck {
    /// Optional free-form payload returned with the acknowledgement.
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why an update was not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The request completed but the application refused it.
    Rejected { message: Option<String> },
    /// The request never completed (network, HTTP status, abandoned).
    Transport(String),
}

impl UpdateError {
    pub fn origin(&self) -> FailureOrigin {
        match self {
            UpdateError::Rejected { .. } => FailureOrigin::Rejected,
            UpdateError::Transport(_) => FailureOrigin::Transport,
        }
    }
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::Rejected { message: Some(m) } => {
                write!(f, "update rejected: {m}")
            }
            UpdateError::Rejected { message: None } => write!(f, "update rejected"),
            UpdateError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for UpdateError {}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Adapter that sends one order update and reports the result.
///
/// Implementations must be `Send + Sync` so a controller can be shared
/// across tasks, and object-safe so callers can hold `Box<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs (e.g. `"admin-ajax"`).
    fn name(&self) -> &'static str;

    /// Persist `req.menu_order` for `req.record_id`.
    ///
    /// Called at most once per locked field at a time. No retry is expected.
    async fn update_order(&self, req: &OrderUpdate) -> Result<UpdateAck, UpdateError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn update_order(&self, req: &OrderUpdate) -> Result<UpdateAck, UpdateError> {
        (**self).update_order(req).await
    }
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn update_order(&self, req: &OrderUpdate) -> Result<UpdateAck, UpdateError> {
        (**self).update_order(req).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    #[async_trait::async_trait]
    impl Transport for RejectAll {
        fn name(&self) -> &'static str {
            "reject-all"
        }

        async fn update_order(&self, _req: &OrderUpdate) -> Result<UpdateAck, UpdateError> {
            Err(UpdateError::Rejected {
                message: Some("nope".to_string()),
            })
        }
    }

    fn sample() -> OrderUpdate {
        OrderUpdate {
            endpoint: "http://localhost/wp-admin/admin-ajax.php".to_string(),
            record_type: "product".to_string(),
            record_id: RecordId::new(42).unwrap(),
            menu_order: 7,
            auth_token: AuthToken::parse(Some("abc")).unwrap(),
        }
    }

    #[tokio::test]
    async fn boxed_transport_delegates() {
        let t: Box<dyn Transport> = Box::new(RejectAll);
        assert_eq!(t.name(), "reject-all");
        let err = t.update_order(&sample()).await.unwrap_err();
        assert_eq!(err.origin(), FailureOrigin::Rejected);
    }

    #[tokio::test]
    async fn arc_transport_delegates() {
        let t = Arc::new(RejectAll);
        assert!(t.update_order(&sample()).await.is_err());
    }

    #[test]
    fn update_error_display() {
        assert_eq!(
            UpdateError::Rejected { message: None }.to_string(),
            "update rejected"
        );
        assert_eq!(
            UpdateError::Rejected {
                message: Some("bad nonce".into())
            }
            .to_string(),
            "update rejected: bad nonce"
        );
        assert_eq!(
            UpdateError::Transport("connection refused".into()).to_string(),
            "transport error: connection refused"
        );
    }

    #[test]
    fn origins_are_distinguished() {
        assert_eq!(
            UpdateError::Transport("x".into()).origin(),
            FailureOrigin::Transport
        );
        assert_eq!(
            UpdateError::Rejected { message: None }.origin(),
            FailureOrigin::Rejected
        );
    }
}
