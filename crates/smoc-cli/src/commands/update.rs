//! `smoc update`: one edit through the field controller.
//!
//! The record is registered as a single-field view and the value goes in
//! through the confirm-key path, so validation, locking and the transport
//! behave exactly as in a session.

use anyhow::{bail, Result};
use smoc_field::{shared_registry, EditOutcome, FieldAttrs, FieldController, FieldKey, FieldStatus};

use super::{describe, is_failure, load_reorder_config, transport_for};

pub async fn run(
    config_paths: &[String],
    post_id: String,
    nonce: Option<String>,
    current: i64,
    value: &str,
) -> Result<()> {
    let cfg = load_reorder_config(config_paths)?;

    let key = FieldKey::new(format!("smoc-{}", post_id.trim()));
    let attrs = FieldAttrs {
        record_id: Some(post_id),
        auth_token: nonce,
        value: current.to_string(),
    };

    let ctl = FieldController::new(
        cfg.controller_config(),
        shared_registry([(key.clone(), attrs)]),
        transport_for(&cfg),
    );

    // A misconfigured record refuses focus; report why instead of "ignored".
    let outcome = if ctl.on_focus(&key) {
        ctl.on_confirm_key(&key, value).await
    } else {
        match ctl.field(&key).map(|f| f.status()) {
            Some(FieldStatus::Disabled(cause)) => EditOutcome::Disabled(cause),
            _ => ctl.on_confirm_key(&key, value).await,
        }
    };
    println!("{} {}", key, describe(&outcome));

    if is_failure(&outcome) {
        bail!("menu order not updated: {}", describe(&outcome));
    }
    Ok(())
}
