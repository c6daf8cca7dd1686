//! Status indicators: loader, success and error, one set per record.
//!
//! Sets are created lazily the first time a record needs one and are reused
//! across repeated edits of the same field. At most one indicator of a set is
//! visible at a time.

use std::collections::HashMap;

use crate::field::FieldStatus;
use crate::validate::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Loader,
    Success,
    Error,
}

impl IndicatorKind {
    /// Accessible label announced for the indicator.
    pub fn aria_label(self) -> &'static str {
        match self {
            IndicatorKind::Loader => "Updating menu order...",
            IndicatorKind::Success => "The menu order has been updated successfully.",
            IndicatorKind::Error => "An error ocurred while updating menu order.",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            IndicatorKind::Loader => "loader",
            IndicatorKind::Success => "success",
            IndicatorKind::Error => "error",
        }
    }
}

/// The three indicators owned by one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSet {
    record_id: RecordId,
    visible: Option<IndicatorKind>,
}

impl IndicatorSet {
    fn new(record_id: RecordId) -> Self {
        Self {
            record_id,
            visible: None,
        }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    /// The indicator currently shown, if any.
    pub fn visible(&self) -> Option<IndicatorKind> {
        self.visible
    }

    pub fn is_visible(&self, kind: IndicatorKind) -> bool {
        self.visible == Some(kind)
    }

    /// Show `kind`, hiding the other two.
    pub fn show(&mut self, kind: IndicatorKind) {
        self.visible = Some(kind);
    }

    pub fn hide_all(&mut self) {
        self.visible = None;
    }

    /// Stable element identifier for renderers, e.g. `smoc-42-loader`.
    pub fn element_id(&self, kind: IndicatorKind) -> String {
        format!("smoc-{}-{}", self.record_id, kind.suffix())
    }

    /// Make the visible indicator match a field status.
    pub fn reflect(&mut self, status: &FieldStatus) {
        match status {
            FieldStatus::Idle => self.hide_all(),
            FieldStatus::Pending => self.show(IndicatorKind::Loader),
            FieldStatus::Success => self.show(IndicatorKind::Success),
            // Every failure origin lands here. Showing the error also clears
            // the loader and any success flash left from a previous edit.
            FieldStatus::Error(_) | FieldStatus::Disabled(_) => self.show(IndicatorKind::Error),
        }
    }
}

/// Lazily populated map of record id → indicator set.
#[derive(Debug, Clone, Default)]
pub struct IndicatorBoard {
    sets: HashMap<RecordId, IndicatorSet>,
}

impl IndicatorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set for `record_id`, created hidden on first use.
    pub fn get_or_create(&mut self, record_id: RecordId) -> &mut IndicatorSet {
        self.sets
            .entry(record_id)
            .or_insert_with(|| IndicatorSet::new(record_id))
    }

    pub fn get(&self, record_id: RecordId) -> Option<&IndicatorSet> {
        self.sets.get(&record_id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
