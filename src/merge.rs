use crate::editor::AttendanceEditor;
use crate::model::{AttendanceRecord, AttendanceStatus, ConductField, ConductSlot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub applied: usize,
    pub orphans: usize,
    pub statuses_set: usize,
}

/// Overlays a saved record onto freshly built editor rows.
///
/// Entries for students no longer on the roster are skipped. Status goes through the same
/// transition as a live toggle, so on a no-class day it is left at the day-type code.
pub fn apply_record(record: &AttendanceRecord, editor: &mut AttendanceEditor) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for entry in &record.students {
        if !editor.contains(&entry.id) {
            summary.orphans += 1;
            continue;
        }
        summary.applied += 1;

        if let Some(status) = AttendanceStatus::from_saved_text(&entry.status) {
            if !editor.day_type().is_no_class()
                && editor.apply_status(&entry.id, status).is_ok()
            {
                summary.statuses_set += 1;
            }
        }

        for slot in ConductSlot::ALL {
            let Some(Some(saved)) = entry.conduct.get(slot.index()) else {
                continue;
            };
            // Row presence was checked above.
            let _ = editor.apply_conduct(&entry.id, slot, ConductField::Value, &saved.value);
            let _ = editor.apply_conduct(&entry.id, slot, ConductField::Reason, &saved.reason);
        }
    }
    log::debug!(
        "merged record {} {}: {} applied, {} orphaned, {} statuses",
        record.section,
        record.date,
        summary.applied,
        summary.orphans,
        summary.statuses_set
    );
    summary
}
