//! Command handler modules for the `smoc` binary.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod session;
pub mod update;

use anyhow::Result;
use smoc_config::{report_unused_keys, ReorderConfig, UnusedKeyPolicy};
use smoc_field::{EditOutcome, ErrorCause, FailureOrigin, FieldStatus, IgnoreReason};
use smoc_transport_http::AdminAjaxTransport;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config, report unused keys, apply env overrides.
pub fn load_reorder_config(paths: &[String]) -> Result<ReorderConfig> {
    let loaded = smoc_config::load_layered_yaml(paths)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config has keys nothing reads");
    }

    loaded.reorder()
}

pub fn transport_for(cfg: &ReorderConfig) -> AdminAjaxTransport {
    AdminAjaxTransport::new_with_action(cfg.action.clone())
}

/// One-line, grep-friendly rendering of an outcome.
pub fn describe(outcome: &EditOutcome) -> String {
    match outcome {
        EditOutcome::Ignored(reason) => {
            let why = match reason {
                IgnoreReason::UnknownField => "unknown field",
                IgnoreReason::Locked => "update in flight",
                IgnoreReason::Disabled => "field disabled",
            };
            format!("outcome=ignored reason=\"{why}\"")
        }
        EditOutcome::Unchanged => "outcome=unchanged".to_string(),
        EditOutcome::Declined => "outcome=declined".to_string(),
        EditOutcome::Disabled(cause) => format!("outcome=disabled message=\"{cause}\""),
        EditOutcome::InvalidValue => format!(
            "outcome=invalid message=\"{}\"",
            smoc_field::MSG_INVALID_VALUE
        ),
        EditOutcome::Updated { value, next } => match next {
            Some(next) => format!("outcome=updated menu_order={value} next={next}"),
            None => format!("outcome=updated menu_order={value}"),
        },
        EditOutcome::Failed(origin) => {
            let origin = match origin {
                FailureOrigin::Rejected => "rejected",
                FailureOrigin::Transport => "transport",
            };
            format!("outcome=failed origin={origin}")
        }
    }
}

/// Whether the outcome should turn into a non-zero exit for one-shot use.
pub fn is_failure(outcome: &EditOutcome) -> bool {
    matches!(
        outcome,
        EditOutcome::Ignored(_)
            | EditOutcome::Disabled(_)
            | EditOutcome::InvalidValue
            | EditOutcome::Failed(_)
    )
}

pub fn status_label(status: &FieldStatus) -> String {
    match status {
        FieldStatus::Idle => "idle".to_string(),
        FieldStatus::Pending => "pending".to_string(),
        FieldStatus::Success => "updated".to_string(),
        FieldStatus::Error(cause) => match cause {
            ErrorCause::InvalidValue => "error(invalid value)".to_string(),
            ErrorCause::Rejected => "error(rejected)".to_string(),
            ErrorCause::Transport => "error(transport)".to_string(),
        },
        FieldStatus::Disabled(cause) => format!("disabled({cause})"),
    }
}
