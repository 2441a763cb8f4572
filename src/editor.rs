use crate::error::AttendanceError;
use crate::model::{AttendanceStatus, ConductEntry, ConductField, ConductSlot, DayType};
use crate::roster::Roster;
use crate::sort::{self, SortColumn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Unset,
    Selected(AttendanceStatus),
    NoClass(DayType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    None,
    Check,
    Absent,
    Late,
    NoClass,
}

impl StatusStyle {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Check => "check",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::NoClass => "noClass",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorRow {
    pub student_id: String,
    pub class_number: String,
    pub last_name: String,
    pub first_name: String,
    pub status: RowStatus,
    pub conduct: [ConductEntry; 3],
}

impl EditorRow {
    pub fn status_text(&self) -> String {
        match self.status {
            RowStatus::Unset => String::new(),
            RowStatus::Selected(s) => s.display_text().to_string(),
            RowStatus::NoClass(dt) => dt.code().to_string(),
        }
    }

    pub fn status_style(&self) -> StatusStyle {
        match self.status {
            RowStatus::Unset => StatusStyle::None,
            RowStatus::Selected(AttendanceStatus::Present) => StatusStyle::Check,
            RowStatus::Selected(AttendanceStatus::Absent) => StatusStyle::Absent,
            RowStatus::Selected(_) => StatusStyle::Late,
            RowStatus::NoClass(_) => StatusStyle::NoClass,
        }
    }

    pub fn selected(&self) -> Option<AttendanceStatus> {
        match self.status {
            RowStatus::Selected(s) => Some(s),
            _ => None,
        }
    }

    pub fn status_enabled(&self) -> bool {
        !matches!(self.status, RowStatus::NoClass(_))
    }

    pub fn conduct(&self, slot: ConductSlot) -> &ConductEntry {
        &self.conduct[slot.index()]
    }
}

/// One editable row per roster student.
///
/// On a no-class day every row is pinned to the day-type code and status changes are refused;
/// conduct fields stay editable either way.
#[derive(Debug, Clone, Default)]
pub struct AttendanceEditor {
    day_type: DayType,
    rows: Vec<EditorRow>,
    index: HashMap<String, usize>,
    order: Vec<usize>,
}

impl AttendanceEditor {
    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops every row and recreates one fresh row per roster student. Sort order resets.
    pub fn rebuild(&mut self, roster: &Roster, day_type: DayType) {
        self.rows = roster
            .students()
            .iter()
            .map(|s| EditorRow {
                student_id: s.id.clone(),
                class_number: s.class_number.clone(),
                last_name: s.last_name.clone(),
                first_name: s.first_name.clone(),
                status: RowStatus::Unset,
                conduct: Default::default(),
            })
            .collect();
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.student_id.clone(), i))
            .collect();
        self.order = (0..self.rows.len()).collect();
        self.toggle_day_type(day_type);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
        self.order.clear();
    }

    pub fn row(&self, student_id: &str) -> Option<&EditorRow> {
        self.index.get(student_id).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.index.contains_key(student_id)
    }

    /// Rows in their current display order.
    pub fn rows(&self) -> impl Iterator<Item = &EditorRow> {
        self.order.iter().map(move |&i| &self.rows[i])
    }

    fn row_mut(&mut self, student_id: &str) -> Result<&mut EditorRow, AttendanceError> {
        match self.index.get(student_id) {
            Some(&i) => Ok(&mut self.rows[i]),
            None => Err(AttendanceError::UnknownStudent(student_id.to_string())),
        }
    }

    /// Selects one status for a student, replacing any earlier selection.
    pub fn apply_status(
        &mut self,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<(), AttendanceError> {
        let day_type = self.day_type;
        let row = self.row_mut(student_id)?;
        if day_type.is_no_class() {
            return Err(AttendanceError::StatusLocked(day_type.code()));
        }
        row.status = RowStatus::Selected(status);
        Ok(())
    }

    pub fn apply_conduct(
        &mut self,
        student_id: &str,
        slot: ConductSlot,
        field: ConductField,
        text: &str,
    ) -> Result<(), AttendanceError> {
        let row = self.row_mut(student_id)?;
        let entry = &mut row.conduct[slot.index()];
        match field {
            ConductField::Value => entry.value = text.to_string(),
            ConductField::Reason => entry.reason = text.to_string(),
        }
        Ok(())
    }

    /// Switches the day type in place. A no-class type forces every row to its code; returning
    /// to a regular day leaves every row unset.
    pub fn toggle_day_type(&mut self, day_type: DayType) {
        self.day_type = day_type;
        let status = if day_type.is_no_class() {
            RowStatus::NoClass(day_type)
        } else {
            RowStatus::Unset
        };
        for row in &mut self.rows {
            row.status = status;
        }
    }

    /// Reorders the displayed rows only; row identity and contents are untouched.
    pub fn sort_by(&mut self, column: SortColumn) {
        self.order = sort::sorted_order(&self.rows, &self.order, column);
    }
}
