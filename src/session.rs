use crate::editor::AttendanceEditor;
use crate::error::AttendanceError;
use crate::gateway::{Collection, PersistenceGateway};
use crate::merge::apply_record;
use crate::model::{
    record_key, AttendanceRecord, AttendanceStatus, ConductField, ConductSlot, DayType,
};
use crate::roster::{load_roster, Roster};
use crate::save::{self, SaveOutcome, SaveRequest};
use crate::sort::SortColumn;

/// Selection, roster and editor for the attendance screen, owned by the daemon state.
///
/// Every selection change bumps `generation`; edits carrying an older generation are refused.
#[derive(Debug, Default)]
pub struct AttendanceSession {
    section: String,
    date: String,
    day_type: DayType,
    roster: Roster,
    editor: AttendanceEditor,
    generation: u64,
    busy: bool,
    saved_record_found: bool,
    notice: Option<String>,
}

impl AttendanceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn editor(&self) -> &AttendanceEditor {
        &self.editor
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn saved_record_found(&self) -> bool {
        self.saved_record_found
    }

    /// Neutral message left by the last refresh when a read failed.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn open(
        &mut self,
        gw: &dyn PersistenceGateway,
        section: &str,
        date: &str,
        day_type: DayType,
    ) {
        self.section = section.to_string();
        self.date = date.to_string();
        self.day_type = day_type;
        self.refresh(gw);
    }

    pub fn select_section(&mut self, gw: &dyn PersistenceGateway, section: &str) {
        self.section = section.to_string();
        self.refresh(gw);
    }

    pub fn set_date(&mut self, gw: &dyn PersistenceGateway, date: &str) {
        self.date = date.to_string();
        self.refresh(gw);
    }

    pub fn set_day_type(&mut self, gw: &dyn PersistenceGateway, day_type: DayType) {
        self.day_type = day_type;
        self.refresh(gw);
    }

    /// Rebuilds roster and editor for the current selection, then overlays any saved record.
    fn refresh(&mut self, gw: &dyn PersistenceGateway) {
        self.generation += 1;
        self.notice = None;
        self.saved_record_found = false;

        if self.section.is_empty() {
            self.roster = Roster::default();
            self.editor.clear();
            return;
        }

        match load_roster(gw, &self.section) {
            Ok(roster) => {
                if roster.is_empty() {
                    log::info!("section {} has no students", self.section);
                }
                self.editor.rebuild(&roster, self.day_type);
                self.roster = roster;
            }
            Err(e) => {
                log::warn!("{}", e);
                self.roster = Roster::default();
                self.editor.clear();
                self.notice = Some(format!("No students could be loaded for {}.", self.section));
                return;
            }
        }

        if self.date.is_empty() || self.editor.is_empty() {
            return;
        }
        if let Err(e) = self.load_saved(gw) {
            log::warn!("{}", e);
            self.notice = Some("Saved attendance could not be loaded.".to_string());
        }
    }

    fn load_saved(&mut self, gw: &dyn PersistenceGateway) -> Result<(), AttendanceError> {
        let key = record_key(&self.section, &self.date);
        let doc = gw
            .get(Collection::Attendance, &key)
            .map_err(|e| AttendanceError::Fetch {
                what: "attendance record",
                message: e.to_string(),
            })?;
        let Some(doc) = doc else {
            return Ok(());
        };
        let record = AttendanceRecord::from_doc(&key, &doc)?;
        let summary = apply_record(&record, &mut self.editor);
        self.saved_record_found = true;
        log::info!(
            "attendance loaded: {} ({} rows, {} orphaned)",
            key,
            summary.applied,
            summary.orphans
        );
        Ok(())
    }

    pub fn check_generation(&self, given: Option<u64>) -> Result<(), AttendanceError> {
        match given {
            Some(g) if g != self.generation => Err(AttendanceError::StaleGeneration {
                given: g,
                current: self.generation,
            }),
            _ => Ok(()),
        }
    }

    pub fn apply_status(
        &mut self,
        generation: Option<u64>,
        student_id: &str,
        status: AttendanceStatus,
    ) -> Result<(), AttendanceError> {
        self.check_generation(generation)?;
        self.editor.apply_status(student_id, status)
    }

    pub fn apply_conduct(
        &mut self,
        generation: Option<u64>,
        student_id: &str,
        slot: ConductSlot,
        field: ConductField,
        text: &str,
    ) -> Result<(), AttendanceError> {
        self.check_generation(generation)?;
        self.editor.apply_conduct(student_id, slot, field, text)
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        self.editor.sort_by(column);
    }

    /// Runs the save with the busy flag raised for the duration of the write.
    pub fn save(&mut self, gw: &dyn PersistenceGateway) -> Result<SaveOutcome, AttendanceError> {
        let req = SaveRequest {
            section: &self.section,
            date: &self.date,
            day_type: self.day_type,
        };
        self.busy = true;
        log::info!("saving attendance records...");
        let result = save::save(gw, &req, &self.editor, &self.roster);
        self.busy = false;
        if result.is_ok() {
            self.saved_record_found = true;
        }
        result
    }
}
