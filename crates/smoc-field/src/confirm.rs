//! Confirmation gate asked before a blur submits a changed value.

/// Prompt shown when focus leaves a field whose value changed.
pub const CONFIRM_PROMPT: &str = "Should the menu order value be updated?";

/// Asks the operator to approve a change.
///
/// Implemented for any `Fn(&str) -> bool`, so tests and front-ends can pass
/// a closure.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Approves every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
