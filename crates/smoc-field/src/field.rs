//! Per-field edit/submit state machine.
//!
//! # Design
//!
//! Every change to an [`EditableField`] goes through [`EditableField::apply`],
//! which enforces two invariants:
//!
//! 1. **Legal transitions only.** Illegal events return [`TransitionError`]
//!    and leave the field untouched.
//! 2. **Revert on failure.** Every event that ends an attempt without success
//!    resets the displayed value to `current_value`.
//!
//! # State diagram
//!
//! ```text
//!            Focus                 Lock{value}             Accept
//!   Idle ◄──────────── Idle ──────────────────► Pending ──────────► Success
//!    ▲                  │                          │                   │
//!    │                  │ RejectInput              │ Fail(origin)      │ Focus
//!    │                  ▼                          ▼                   │
//!    └──── Focus ──── Error ◄──────────────────────┘                   │
//!    └─────────────────────────────────────────────────────────────────┘
//!
//!   Idle | Success | Error ── Disable(cause) ──► Disabled (terminal)
//! ```
//!
//! `Pending` is the lock: while a submission is in flight the field accepts
//! only `Accept` or `Fail`.

use std::fmt;

use tracing::warn;

use crate::registry::{FieldAttrs, FieldKey};
use crate::validate::{parse_order_value, AuthToken, ConfigError, RecordId};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where a failed submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureOrigin {
    /// The request completed but the application refused the update.
    Rejected,
    /// The request never completed.
    Transport,
}

/// Why a field shows its error indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    InvalidValue,
    Rejected,
    Transport,
}

impl From<FailureOrigin> for ErrorCause {
    fn from(o: FailureOrigin) -> Self {
        match o {
            FailureOrigin::Rejected => ErrorCause::Rejected,
            FailureOrigin::Transport => ErrorCause::Transport,
        }
    }
}

/// Lifecycle state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldStatus {
    Idle,
    /// Submission in flight; the field is locked.
    Pending,
    Success,
    Error(ErrorCause),
    /// Misconfigured field. **Terminal.**
    Disabled(ConfigError),
}

impl FieldStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disabled(_))
    }
}

// ---------------------------------------------------------------------------
// FieldEvent
// ---------------------------------------------------------------------------

/// Events that drive an [`EditableField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    /// Field gained focus: snapshot the revert target, hide indicators.
    Focus,
    /// Operator changed the displayed text.
    Input(String),
    /// Operator declined the confirmation prompt.
    Decline,
    /// Typed value failed to parse.
    RejectInput,
    /// Configuration problem found; the field is disabled for good.
    Disable(ConfigError),
    /// Submission of `value` started.
    Lock { value: i64 },
    /// The in-flight submission was persisted.
    Accept,
    /// The in-flight submission failed.
    Fail(FailureOrigin),
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when an event cannot legally be applied in the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: FieldStatus,
    pub event: String,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal field transition: {:?} + {}", self.from, self.event)
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// EditableField
// ---------------------------------------------------------------------------

/// Logical state of one row's order input.
#[derive(Debug, Clone)]
pub struct EditableField {
    key: FieldKey,
    record_id: Result<RecordId, ConfigError>,
    auth_token: Result<AuthToken, ConfigError>,
    /// Last value known to be persisted; the revert target.
    current_value: i64,
    /// Text currently displayed, possibly unconfirmed.
    pending_value: String,
    /// Value being submitted while `Pending`.
    in_flight: Option<i64>,
    status: FieldStatus,
    title: Option<String>,
}

impl EditableField {
    /// Create the logical state for a field on its first interaction.
    ///
    /// Record id and auth token are validated here, once. A field failing
    /// either check starts out `Disabled`.
    ///
    /// A rendered value that does not parse leaves the revert target at 0;
    /// the displayed text is kept until the first focus replaces it.
    pub fn open(key: FieldKey, attrs: &FieldAttrs) -> Self {
        let record_id = attrs
            .record_id
            .as_deref()
            .ok_or(ConfigError::InvalidRecordId)
            .and_then(RecordId::parse);
        let auth_token = AuthToken::parse(attrs.auth_token.as_deref());
        let current_value = match parse_order_value(&attrs.value) {
            Ok(v) => v,
            Err(err) => {
                warn!(field = %key, %err, "[menu order] rendered value unreadable; reverting to 0");
                0
            }
        };

        let mut field = Self {
            key,
            record_id,
            auth_token,
            current_value,
            pending_value: attrs.value.clone(),
            in_flight: None,
            status: FieldStatus::Idle,
            title: None,
        };

        let identity = field.identity().map(|_| ());
        if let Err(cause) = identity {
            field.disable(cause);
        }
        field
    }

    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// `None` when the rendered record id was invalid.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id.ok()
    }

    pub fn current_value(&self) -> i64 {
        self.current_value
    }

    pub fn pending_value(&self) -> &str {
        &self.pending_value
    }

    pub fn status(&self) -> FieldStatus {
        self.status
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// `true` while a submission for this field is in flight.
    pub fn is_locked(&self) -> bool {
        self.status == FieldStatus::Pending
    }

    pub fn is_disabled(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the control accepts operator input right now.
    pub fn is_interactive(&self) -> bool {
        !self.is_locked() && !self.is_disabled()
    }

    /// Re-verify record id and token, in that order.
    pub fn identity(&self) -> Result<(RecordId, &AuthToken), ConfigError> {
        let id = self.record_id?;
        let token = self.auth_token.as_ref().map_err(|e| *e)?;
        Ok((id, token))
    }

    /// Apply an event.
    ///
    /// # Errors
    /// Returns [`TransitionError`] for illegal transitions; the field is left
    /// unchanged.
    pub fn apply(&mut self, event: &FieldEvent) -> Result<(), TransitionError> {
        use FieldEvent::*;
        use FieldStatus::*;

        match (&self.status, event) {
            // ------------------------------------------------------------------
            // Terminal: focus and repeated disables are silently absorbed.
            // ------------------------------------------------------------------
            (Disabled(_), Focus | Disable(_)) => {}

            // Locked controls cannot take focus.
            (Pending, Focus) => {}

            // ------------------------------------------------------------------
            // Editable states
            // ------------------------------------------------------------------
            (Idle | Success | Error(_), Focus) => {
                if let Ok(v) = parse_order_value(&self.pending_value) {
                    self.current_value = v;
                }
                self.pending_value = self.current_value.to_string();
                self.title = Some(self.current_value.to_string());
                self.status = Idle;
            }

            (Idle | Success | Error(_), Input(text)) => self.pending_value = text.clone(),

            (Idle | Success | Error(_), Decline) => self.revert(),

            (Idle | Success | Error(_), RejectInput) => {
                self.revert();
                self.status = Error(ErrorCause::InvalidValue);
            }

            (Idle | Success | Error(_), Disable(cause)) => self.disable(*cause),

            (Idle | Success | Error(_), Lock { value }) => {
                self.in_flight = Some(*value);
                self.status = Pending;
            }

            // ------------------------------------------------------------------
            // In flight
            // ------------------------------------------------------------------
            (Pending, Accept) => {
                // Lock always records the value before entering Pending.
                let value = self.in_flight.take().unwrap_or(self.current_value);
                self.current_value = value;
                self.pending_value = value.to_string();
                self.title = Some(value.to_string());
                self.status = Success;
            }

            (Pending, Fail(origin)) => {
                self.in_flight = None;
                self.revert();
                self.status = Error((*origin).into());
            }

            // ------------------------------------------------------------------
            // Everything else is illegal.
            // ------------------------------------------------------------------
            (state, ev) => {
                return Err(TransitionError {
                    from: *state,
                    event: format!("{ev:?}"),
                });
            }
        }

        Ok(())
    }

    fn revert(&mut self) {
        self.pending_value = self.current_value.to_string();
    }

    fn disable(&mut self, cause: ConfigError) {
        self.revert();
        self.title = Some(cause.message().to_string());
        self.status = FieldStatus::Disabled(cause);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
