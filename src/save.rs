use crate::editor::AttendanceEditor;
use crate::error::AttendanceError;
use crate::gateway::{Collection, PersistenceGateway};
use crate::model::{record_key, AttendanceRecord, DayType, RecordEntry};
use crate::roster::Roster;

#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub section: &'a str,
    pub date: &'a str,
    pub day_type: DayType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolMetadata {
    pub school_year: String,
    pub term: String,
    pub subject: String,
}

impl SchoolMetadata {
    /// Taken from the first roster student; empty when the roster is empty.
    pub fn from_roster(roster: &Roster) -> Self {
        let Some(first) = roster.first() else {
            return Self::default();
        };
        let clean = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();
        SchoolMetadata {
            school_year: first
                .school_year
                .as_deref()
                .map(|sy| sy.replace('–', "-").trim().to_string())
                .unwrap_or_default(),
            term: clean(&first.term),
            subject: clean(&first.subject),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub key: String,
    pub student_count: usize,
}

/// Assembles the record for the current editor state without writing it.
pub fn build_record(
    req: &SaveRequest<'_>,
    editor: &AttendanceEditor,
    roster: &Roster,
) -> Result<AttendanceRecord, AttendanceError> {
    if req.section.trim().is_empty() || req.date.trim().is_empty() {
        return Err(AttendanceError::validation(
            "Please select both Section and Date.",
        ));
    }
    let is_no_class = req.day_type.is_no_class();

    let students: Vec<RecordEntry> = editor
        .rows()
        .filter_map(|row| {
            let student = roster.get(&row.student_id)?;
            let status = if is_no_class {
                req.day_type.code().to_string()
            } else {
                row.status_text()
            };
            Some(RecordEntry {
                id: row.student_id.clone(),
                class_number: student.class_number.clone(),
                last_name: student.last_name.clone(),
                first_name: student.first_name.clone(),
                full_name: format!("{}, {}", student.last_name, student.first_name),
                password: student.password.clone().unwrap_or_default(),
                status,
                conduct: row.conduct.iter().cloned().map(Some).collect(),
            })
        })
        .collect();

    let meta = SchoolMetadata::from_roster(roster);
    Ok(AttendanceRecord {
        date: req.date.to_string(),
        section: req.section.to_string(),
        school_year: meta.school_year,
        term: meta.term,
        subject: meta.subject,
        day_type: Some(req.day_type.code().to_string()).filter(|c| !c.is_empty()),
        students,
    })
}

/// Writes the editor state as one whole-document overwrite at `section_date`.
pub fn save(
    gw: &dyn PersistenceGateway,
    req: &SaveRequest<'_>,
    editor: &AttendanceEditor,
    roster: &Roster,
) -> Result<SaveOutcome, AttendanceError> {
    let record = build_record(req, editor, roster)?;
    let key = record_key(req.section, req.date);
    let doc = serde_json::to_value(&record).map_err(|e| AttendanceError::Write {
        what: "attendance record",
        message: e.to_string(),
    })?;
    if let Err(e) = gw.set(Collection::Attendance, &key, &doc) {
        log::error!("save {} failed: {}", key, e);
        return Err(AttendanceError::Write {
            what: "attendance record",
            message: e.to_string(),
        });
    }
    log::info!("saved attendance {} ({} students)", key, record.students.len());
    Ok(SaveOutcome {
        key,
        student_count: record.students.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::merge::apply_record;
    use crate::model::{AttendanceStatus, ConductField, ConductSlot};
    use crate::roster::load_roster;
    use serde_json::json;

    fn directory() -> MemoryGateway {
        MemoryGateway::with_students(vec![
            json!({
                "Idnumber": "s1", "Section": "7A", "CN": "1",
                "LastName": "Abad", "FirstName": "Lea", "passWord": "pw1",
                "schoolYear": "  2024–2025 ", "term": " Term 1 ", "subject": "Math "
            }),
            json!({ "Idnumber": "s2", "Section": "7A", "CN": "2", "LastName": "Cruz", "FirstName": "Ben" }),
        ])
    }

    fn loaded(gw: &MemoryGateway, day_type: DayType) -> (Roster, AttendanceEditor) {
        let roster = load_roster(gw, "7A").expect("roster");
        let mut ed = AttendanceEditor::default();
        ed.rebuild(&roster, day_type);
        (roster, ed)
    }

    fn fill_conduct(ed: &mut AttendanceEditor, id: &str, values: [&str; 6]) {
        for (i, slot) in ConductSlot::ALL.into_iter().enumerate() {
            ed.apply_conduct(id, slot, ConductField::Value, values[i * 2])
                .expect("value");
            ed.apply_conduct(id, slot, ConductField::Reason, values[i * 2 + 1])
                .expect("reason");
        }
    }

    #[test]
    fn empty_date_is_rejected_without_writing() {
        let gw = directory();
        let (roster, ed) = loaded(&gw, DayType::Regular);
        let req = SaveRequest {
            section: "7A",
            date: "",
            day_type: DayType::Regular,
        };
        let e = save(&gw, &req, &ed, &roster).expect_err("validation");
        assert_eq!(e.code(), "validation_failed");
        assert_eq!(gw.writes.get(), 0);
    }

    #[test]
    fn saved_record_round_trips_through_merge() {
        let gw = directory();
        let (roster, mut ed) = loaded(&gw, DayType::Regular);
        ed.apply_status("s1", AttendanceStatus::Present).expect("present");
        fill_conduct(&mut ed, "s1", ["A", "-", "B+", "late", "A", "-"]);

        let req = SaveRequest {
            section: "7A",
            date: "2024-01-15",
            day_type: DayType::Regular,
        };
        let outcome = save(&gw, &req, &ed, &roster).expect("save");
        assert_eq!(outcome.key, "7A_2024-01-15");
        assert_eq!(outcome.student_count, 2);
        assert_eq!(gw.writes.get(), 1);

        let doc = gw
            .doc(Collection::Attendance, "7A_2024-01-15")
            .expect("stored");
        assert!(doc.get("dayType").is_none());
        assert_eq!(doc["students"][0]["status"], "✔");
        assert_eq!(doc["students"][0]["passWord"], "pw1");
        assert_eq!(doc["students"][0]["fullName"], "Abad, Lea");
        assert_eq!(doc["students"][1]["status"], "");

        let record =
            AttendanceRecord::from_doc("7A_2024-01-15", &doc).expect("valid stored record");
        let (_, mut reloaded) = loaded(&gw, DayType::Regular);
        apply_record(&record, &mut reloaded);
        let s1 = reloaded.row("s1").expect("s1");
        assert_eq!(s1.selected(), Some(AttendanceStatus::Present));
        let fields: Vec<&str> = s1
            .conduct
            .iter()
            .flat_map(|c| [c.value.as_str(), c.reason.as_str()])
            .collect();
        assert_eq!(fields, vec!["A", "-", "B+", "late", "A", "-"]);
    }

    #[test]
    fn holiday_forces_uniform_status() {
        let gw = directory();
        let (roster, mut ed) = loaded(&gw, DayType::Regular);
        ed.apply_status("s1", AttendanceStatus::Absent).expect("absent");
        ed.apply_status("s2", AttendanceStatus::Late).expect("late");
        ed.toggle_day_type(DayType::Holiday);

        let req = SaveRequest {
            section: "7A",
            date: "2024-12-25",
            day_type: DayType::Holiday,
        };
        let record = build_record(&req, &ed, &roster).expect("record");
        assert_eq!(record.day_type.as_deref(), Some("HOL"));
        assert!(record.students.iter().all(|s| s.status == "HOL"));
    }

    #[test]
    fn metadata_is_trimmed_and_dash_normalized() {
        let gw = directory();
        let (roster, _) = loaded(&gw, DayType::Regular);
        let meta = SchoolMetadata::from_roster(&roster);
        assert_eq!(meta.school_year, "2024-2025");
        assert_eq!(meta.term, "Term 1");
        assert_eq!(meta.subject, "Math");
        assert_eq!(
            SchoolMetadata::from_roster(&Roster::default()),
            SchoolMetadata::default()
        );
    }

    #[test]
    fn rows_missing_from_roster_are_dropped() {
        let gw = directory();
        let (_, ed) = loaded(&gw, DayType::Regular);
        let smaller = Roster::from_students(
            "7A",
            load_roster(&gw, "7A")
                .expect("roster")
                .students()
                .iter()
                .filter(|s| s.id == "s2")
                .cloned(),
        );
        let req = SaveRequest {
            section: "7A",
            date: "2024-01-15",
            day_type: DayType::Regular,
        };
        let record = build_record(&req, &ed, &smaller).expect("record");
        assert_eq!(record.students.len(), 1);
        assert_eq!(record.students[0].id, "s2");
    }

    #[test]
    fn write_failure_is_reported() {
        let gw = directory();
        let (roster, ed) = loaded(&gw, DayType::Regular);
        gw.fail_writes.set(true);
        let req = SaveRequest {
            section: "7A",
            date: "2024-01-15",
            day_type: DayType::Regular,
        };
        let e = save(&gw, &req, &ed, &roster).expect_err("write should fail");
        assert_eq!(e.code(), "write_failed");
        assert!(e.to_string().contains("permission denied"));
    }
}
