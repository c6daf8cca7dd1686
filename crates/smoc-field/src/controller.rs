//! Field Controller: the SINGLE path from an operator edit to the transport.
//!
//! # Invariants
//!
//! **One submission per field.** A field is locked (`Pending`) from the moment
//! its value passes validation until the transport resolves. Any blur, confirm
//! key or submit arriving for a locked field is dropped, not queued. Other
//! fields are unaffected: their submissions may be in flight at the same time
//! and complete in any order.
//!
//! **Revert on failure.** Every path that ends without a persisted value
//! leaves the displayed value equal to the last confirmed one.
//!
//! **Always unlock.** The lock is released when the transport resolves, and
//! also when the in-flight future is dropped or the transport panics; such an
//! abandoned attempt is recorded as a transport failure.
//!
//! ```text
//! on_blur ── unchanged? ── confirm? ──┐
//!                                     ├──► submit
//! on_confirm_key ─────────────────────┘      │
//!                                            ├── record id / context / token ──► Disabled
//!                                            ├── value parses?  ─────────────► Error (revert)
//!                                            ├── Lock (Pending, loader)
//!                                            ├── Transport::update_order(..).await
//!                                            └── Accept ─► Success, focus next
//!                                                Fail   ─► Error (revert)
//! ```
//!
//! Field state sits behind a `std::sync::Mutex` that is never held across an
//! `.await`, so futures for different fields can be polled concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLockReadGuard};

use tracing::{debug, error, info, warn};

use crate::confirm::{AlwaysConfirm, Confirm, CONFIRM_PROMPT};
use crate::field::{EditableField, FailureOrigin, FieldEvent};
use crate::indicator::{IndicatorBoard, IndicatorSet};
use crate::registry::{FieldKey, FieldRegistry};
use crate::SharedRegistry;
use crate::transport::{OrderUpdate, Transport, UpdateAck, UpdateError};
use crate::validate::{parse_order_value, ConfigError, RecordId, MSG_INVALID_VALUE};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Page context every submission needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Record-type discriminator sent with each update (e.g. `"product"`).
    pub record_type: String,
    /// Endpoint the transport posts to.
    pub endpoint: String,
}

impl ControllerConfig {
    pub fn new(record_type: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.record_type.trim().is_empty() && !self.endpoint.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an interaction was dropped without touching the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The key is not in the registry.
    UnknownField,
    /// A submission for this field is already in flight.
    Locked,
    /// The field is permanently disabled.
    Disabled,
}

/// What one interaction did to its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Ignored(IgnoreReason),
    /// Blur with the value unchanged; nothing to persist.
    Unchanged,
    /// Operator declined the confirmation prompt; value reverted.
    Declined,
    /// Configuration error found; the field is now disabled.
    Disabled(ConfigError),
    /// Value did not parse; reverted, field still editable.
    InvalidValue,
    /// Persisted. `next` is the field focus advanced to, if any.
    Updated { value: i64, next: Option<FieldKey> },
    /// Transport or application failure; value reverted.
    Failed(FailureOrigin),
}

// ---------------------------------------------------------------------------
// FieldController
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ViewState {
    fields: HashMap<FieldKey, EditableField>,
    indicators: IndicatorBoard,
    focused: Option<FieldKey>,
}

/// Drives every editable order field of one view.
///
/// ```text
/// view ──► FieldController ──► Transport::update_order
///             │        ▲
///             │        └── FieldRegistry (read-only: next field)
///             └── EditableField state + IndicatorBoard
/// ```
pub struct FieldController<T, C = AlwaysConfirm>
where
    T: Transport,
    C: Confirm,
{
    config: ControllerConfig,
    registry: SharedRegistry,
    transport: T,
    confirm: C,
    state: Mutex<ViewState>,
}

impl<T: Transport> FieldController<T, AlwaysConfirm> {
    /// Controller whose blur confirmation always approves.
    pub fn new(config: ControllerConfig, registry: SharedRegistry, transport: T) -> Self {
        Self::with_confirm(config, registry, transport, AlwaysConfirm)
    }
}

impl<T, C> FieldController<T, C>
where
    T: Transport,
    C: Confirm,
{
    pub fn with_confirm(
        config: ControllerConfig,
        registry: SharedRegistry,
        transport: T,
        confirm: C,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
            confirm,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Shared handle on the registry, for the view to update membership.
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -- Operator interactions ----------------------------------------------

    /// Field gained focus.
    ///
    /// Snapshots the revert target and hides the field's indicators. Returns
    /// `false` when the key is unknown or the control is not interactive
    /// (locked or disabled), in which case focus does not move.
    pub fn on_focus(&self, key: &FieldKey) -> bool {
        let mut guard = self.lock_state();
        let ViewState {
            fields,
            indicators,
            focused,
        } = &mut *guard;
        self.focus_in(fields, indicators, focused, key)
    }

    /// Focus left the field after the operator typed `new_value`.
    ///
    /// Unchanged values are not submitted. Changed values are submitted only
    /// after the operator confirms; a declined prompt reverts the field.
    pub async fn on_blur(&self, key: &FieldKey, new_value: &str) -> EditOutcome {
        if let Some(outcome) = self.blur_gate(key, new_value) {
            return outcome;
        }
        if !self.confirm.confirm(CONFIRM_PROMPT) {
            self.decline(key);
            return EditOutcome::Declined;
        }
        self.submit(key, new_value).await
    }

    /// Explicit confirm keystroke: submit without asking.
    pub async fn on_confirm_key(&self, key: &FieldKey, new_value: &str) -> EditOutcome {
        self.submit(key, new_value).await
    }

    /// Validate, lock, send, apply the result.
    pub async fn submit(&self, key: &FieldKey, new_value: &str) -> EditOutcome {
        let req = match self.begin(key, new_value) {
            Ok(req) => req,
            Err(outcome) => return outcome,
        };

        debug!(
            record_id = %req.record_id,
            menu_order = req.menu_order,
            transport = self.transport.name(),
            "submitting menu order"
        );

        let flight = InFlight {
            controller: self,
            key: key.clone(),
            armed: true,
        };
        let result = self.transport.update_order(&req).await;
        flight.finish(result)
    }

    // -- Read access --------------------------------------------------------

    /// Snapshot of a field's logical state; `None` until its first interaction.
    pub fn field(&self, key: &FieldKey) -> Option<EditableField> {
        self.lock_state().fields.get(key).cloned()
    }

    /// The field that currently holds focus.
    pub fn focused(&self) -> Option<FieldKey> {
        self.lock_state().focused.clone()
    }

    pub fn indicators(&self, record_id: RecordId) -> Option<IndicatorSet> {
        self.lock_state().indicators.get(record_id).cloned()
    }

    // -- Internals ----------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, FieldRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Field state for `key`, created from the registry on first interaction.
    fn open<'s>(
        &self,
        fields: &'s mut HashMap<FieldKey, EditableField>,
        indicators: &mut IndicatorBoard,
        key: &FieldKey,
    ) -> Option<&'s mut EditableField> {
        if !fields.contains_key(key) {
            let attrs = self.read_registry().get(key)?.attrs.clone();
            let field = EditableField::open(key.clone(), &attrs);
            if field.is_disabled() {
                warn!(field = %key, "[menu order] {}", field.title().unwrap_or_default());
                sync_indicators(indicators, &field);
            }
            fields.insert(key.clone(), field);
        }
        fields.get_mut(key)
    }

    fn focus_in(
        &self,
        fields: &mut HashMap<FieldKey, EditableField>,
        indicators: &mut IndicatorBoard,
        focused: &mut Option<FieldKey>,
        key: &FieldKey,
    ) -> bool {
        let Some(field) = self.open(fields, indicators, key) else {
            return false;
        };
        if !field.is_interactive() {
            return false;
        }
        apply(field, FieldEvent::Focus);
        sync_indicators(indicators, field);
        *focused = Some(key.clone());
        true
    }

    /// `Some(outcome)` when the blur stops before the confirmation prompt.
    fn blur_gate(&self, key: &FieldKey, new_value: &str) -> Option<EditOutcome> {
        let mut guard = self.lock_state();
        let ViewState {
            fields, indicators, ..
        } = &mut *guard;
        let Some(field) = self.open(fields, indicators, key) else {
            return Some(EditOutcome::Ignored(IgnoreReason::UnknownField));
        };
        if let Some(reason) = ignore_reason(field) {
            return Some(EditOutcome::Ignored(reason));
        }
        if parse_order_value(new_value) == Ok(field.current_value()) {
            return Some(EditOutcome::Unchanged);
        }
        apply(field, FieldEvent::Input(new_value.to_string()));
        None
    }

    fn decline(&self, key: &FieldKey) {
        let mut guard = self.lock_state();
        if let Some(field) = guard.fields.get_mut(key) {
            // A concurrent submit may have locked the field meanwhile.
            if field.is_interactive() {
                apply(field, FieldEvent::Decline);
            }
        }
    }

    /// Steps 1–4: validate, then lock. `Err` carries the final outcome.
    fn begin(&self, key: &FieldKey, new_value: &str) -> Result<OrderUpdate, EditOutcome> {
        let mut guard = self.lock_state();
        let ViewState {
            fields, indicators, ..
        } = &mut *guard;
        let field = self
            .open(fields, indicators, key)
            .ok_or(EditOutcome::Ignored(IgnoreReason::UnknownField))?;

        if let Some(reason) = ignore_reason(field) {
            debug!(field = %key, ?reason, "submission dropped");
            return Err(EditOutcome::Ignored(reason));
        }
        apply(field, FieldEvent::Input(new_value.to_string()));

        // Identity was checked when the field opened; re-check before sending.
        let identity = field.identity().map(|(id, token)| (id, token.clone()));
        let (record_id, auth_token) = match identity {
            Ok(pair) => pair,
            Err(cause) => return Err(disable(field, indicators, cause)),
        };
        if !self.config.is_complete() {
            return Err(disable(field, indicators, ConfigError::MissingContext));
        }

        let menu_order = match parse_order_value(new_value) {
            Ok(v) => v,
            Err(err) => {
                apply(field, FieldEvent::RejectInput);
                sync_indicators(indicators, field);
                warn!(field = %key, %err, "[menu order] {}", MSG_INVALID_VALUE);
                return Err(EditOutcome::InvalidValue);
            }
        };

        apply(field, FieldEvent::Lock { value: menu_order });
        sync_indicators(indicators, field);

        Ok(OrderUpdate {
            endpoint: self.config.endpoint.clone(),
            record_type: self.config.record_type.clone(),
            record_id,
            menu_order,
            auth_token,
        })
    }

    /// Steps 6–8: apply the transport result and release the lock.
    fn complete(&self, key: &FieldKey, result: Result<UpdateAck, UpdateError>) -> EditOutcome {
        let mut guard = self.lock_state();
        let ViewState {
            fields,
            indicators,
            focused,
        } = &mut *guard;
        let Some(field) = fields.get_mut(key) else {
            return EditOutcome::Ignored(IgnoreReason::UnknownField);
        };

        match result {
            Ok(_) => {
                apply(field, FieldEvent::Accept);
                sync_indicators(indicators, field);
                let value = field.current_value();
                info!(field = %key, menu_order = value, "menu order updated");

                let next = self.read_registry().next_after(key).map(|f| f.key.clone());
                if let Some(next_key) = &next {
                    self.focus_in(fields, indicators, focused, next_key);
                }
                EditOutcome::Updated { value, next }
            }
            Err(err) => {
                let origin = err.origin();
                apply(field, FieldEvent::Fail(origin));
                sync_indicators(indicators, field);
                warn!(field = %key, ?origin, "[menu order] {err}");
                EditOutcome::Failed(origin)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InFlight guard
// ---------------------------------------------------------------------------

/// Releases the field lock however the in-flight submission ends.
struct InFlight<'a, T: Transport, C: Confirm> {
    controller: &'a FieldController<T, C>,
    key: FieldKey,
    armed: bool,
}

impl<T: Transport, C: Confirm> InFlight<'_, T, C> {
    fn finish(mut self, result: Result<UpdateAck, UpdateError>) -> EditOutcome {
        self.armed = false;
        self.controller.complete(&self.key, result)
    }
}

impl<T: Transport, C: Confirm> Drop for InFlight<'_, T, C> {
    fn drop(&mut self) {
        if self.armed {
            warn!(field = %self.key, "submission abandoned before completion");
            self.controller.complete(
                &self.key,
                Err(UpdateError::Transport(
                    "submission abandoned before completion".to_string(),
                )),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ignore_reason(field: &EditableField) -> Option<IgnoreReason> {
    if field.is_disabled() {
        Some(IgnoreReason::Disabled)
    } else if field.is_locked() {
        Some(IgnoreReason::Locked)
    } else {
        None
    }
}

fn apply(field: &mut EditableField, event: FieldEvent) {
    if let Err(err) = field.apply(&event) {
        error!(field = %field.key(), %err, "field transition refused");
    }
}

fn sync_indicators(indicators: &mut IndicatorBoard, field: &EditableField) {
    if let Some(id) = field.record_id() {
        indicators.get_or_create(id).reflect(&field.status());
    }
}

fn disable(
    field: &mut EditableField,
    indicators: &mut IndicatorBoard,
    cause: ConfigError,
) -> EditOutcome {
    apply(field, FieldEvent::Disable(cause));
    sync_indicators(indicators, field);
    warn!(field = %field.key(), "[menu order] {cause}");
    EditOutcome::Disabled(cause)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
