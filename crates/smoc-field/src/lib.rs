//! smoc-field
//!
//! Inline menu-order editing core.
//! - Each rendered order input is an [`EditableField`] driven by an explicit
//!   state machine (`Idle → Pending → Success | Error`, terminal `Disabled`)
//! - [`FieldController`] is the only path from an operator edit to the
//!   [`Transport`]; it validates, locks the field, sends, applies the result
//!   and advances focus on success
//! - [`FieldRegistry`] holds the view order used for focus-advance
//! - [`IndicatorBoard`] keeps the loader / success / error indicators, one
//!   set per record, created on demand
//!
//! No rendering and no network code lives here. Front-ends implement the
//! view side; `smoc-transport-http` implements the transport.

mod confirm;
mod controller;
mod field;
mod indicator;
mod registry;
mod transport;
mod validate;

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, CONFIRM_PROMPT};

pub use controller::{ControllerConfig, EditOutcome, FieldController, IgnoreReason};

pub use field::{
    EditableField, ErrorCause, FailureOrigin, FieldEvent, FieldStatus, TransitionError,
};

pub use indicator::{IndicatorBoard, IndicatorKind, IndicatorSet};

pub use registry::{FieldAttrs, FieldKey, FieldRegistry, RegisteredField};

pub use transport::{OrderUpdate, Transport, UpdateAck, UpdateError, DEFAULT_ACTION};

pub use validate::{
    parse_order_value, AuthToken, ConfigError, InvalidValue, RecordId, MSG_INVALID_AUTH_TOKEN,
    MSG_INVALID_RECORD_ID, MSG_INVALID_VALUE, MSG_MISSING_CONTEXT,
};

use std::sync::{Arc, RwLock};

/// Registry handle shared between the view and a controller.
pub type SharedRegistry = Arc<RwLock<FieldRegistry>>;

/// Helper to build a shared registry with minimal boilerplate in tests/callers.
pub fn shared_registry<I>(items: I) -> SharedRegistry
where
    I: IntoIterator<Item = (FieldKey, FieldAttrs)>,
{
    Arc::new(RwLock::new(FieldRegistry::from_fields(items)))
}
