use crate::editor::EditorRow;
use crate::gateway::{PersistenceGateway, SqliteGateway};
use crate::ipc::error::{attendance_err, err, ok};
use crate::ipc::helpers::{get_optional_str, get_optional_u64, get_required_str, require_db};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, ConductField, ConductSlot, DayType};
use crate::save::SchoolMetadata;
use crate::session::AttendanceSession;
use crate::sort::SortColumn;
use serde_json::json;

const DEFAULT_RECENT_LIMIT: u64 = 10;
const MAX_RECENT_LIMIT: u64 = 100;

fn row_json(row: &EditorRow) -> serde_json::Value {
    let conduct: Vec<serde_json::Value> = ConductSlot::ALL
        .iter()
        .map(|slot| {
            let c = row.conduct(*slot);
            json!({ "value": c.value, "reason": c.reason })
        })
        .collect();
    json!({
        "studentId": row.student_id,
        "classNumber": row.class_number,
        "lastName": row.last_name,
        "firstName": row.first_name,
        "status": row.selected().map(|s| s.code()),
        "statusText": row.status_text(),
        "statusStyle": row.status_style().name(),
        "statusEnabled": row.status_enabled(),
        "conduct": conduct,
    })
}

fn session_json(session: &AttendanceSession) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = session.editor().rows().map(row_json).collect();
    let meta = SchoolMetadata::from_roster(session.roster());
    json!({
        "section": session.section(),
        "date": session.date(),
        "dayType": session.day_type().code(),
        "generation": session.generation(),
        "busy": session.busy(),
        "savedRecordFound": session.saved_record_found(),
        "notice": session.notice(),
        "studentCount": session.editor().len(),
        "schoolYear": meta.school_year,
        "term": meta.term,
        "subject": meta.subject,
        "rows": rows,
    })
}

fn parse_day_type(req: &Request, raw: Option<&str>) -> Result<DayType, serde_json::Value> {
    let raw = raw.unwrap_or("");
    DayType::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("unknown dayType: {}", raw),
            Some(json!({ "allowed": ["", "HOL", "ILD", "SAT", "SUN"] })),
        )
    })
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let section = match get_required_str(req, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = get_optional_str(req, "date").unwrap_or_default();
    let day_type = match parse_day_type(req, get_optional_str(req, "dayType").as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    state.attendance.open(&gw, &section, date.trim(), day_type);
    ok(&req.id, session_json(&state.attendance))
}

fn handle_select_section(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let section = match get_required_str(req, "section") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    state.attendance.select_section(&gw, &section);
    ok(&req.id, session_json(&state.attendance))
}

fn handle_set_date(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let date = match get_required_str(req, "date") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    state.attendance.set_date(&gw, date.trim());
    ok(&req.id, session_json(&state.attendance))
}

fn handle_set_day_type(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let raw = match get_required_str(req, "dayType") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let day_type = match parse_day_type(req, Some(&raw)) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    state.attendance.set_day_type(&gw, day_type);
    ok(&req.id, session_json(&state.attendance))
}

fn edited_row(state: &AppState, req: &Request, student_id: &str) -> serde_json::Value {
    let row = state
        .attendance
        .editor()
        .row(student_id)
        .map(row_json)
        .unwrap_or(serde_json::Value::Null);
    ok(
        &req.id,
        json!({ "generation": state.attendance.generation(), "row": row }),
    )
}

fn handle_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match get_required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let raw = match get_required_str(req, "status") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(status) = AttendanceStatus::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown status: {}", raw),
            Some(json!({ "allowed": ["P", "A", "L", "X"] })),
        );
    };
    let generation = match get_optional_u64(req, "generation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = state
        .attendance
        .apply_status(generation, &student_id, status)
    {
        return attendance_err(&req.id, &e);
    }
    edited_row(state, req, &student_id)
}

fn handle_set_conduct(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match get_required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let slot_raw = match req.params.get("slot") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return err(&req.id, "bad_params", "missing slot", None),
    };
    let Some(slot) = ConductSlot::parse(&slot_raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown conduct slot: {}", slot_raw),
            None,
        );
    };
    let field_raw = match get_required_str(req, "field") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(field) = ConductField::parse(&field_raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown conduct field: {}", field_raw),
            None,
        );
    };
    let text = get_optional_str(req, "text").unwrap_or_default();
    let generation = match get_optional_u64(req, "generation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = state
        .attendance
        .apply_conduct(generation, &student_id, slot, field, &text)
    {
        return attendance_err(&req.id, &e);
    }
    edited_row(state, req, &student_id)
}

fn handle_sort(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = match get_required_str(req, "column") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(column) = SortColumn::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown sort column: {}", raw),
            Some(json!({ "allowed": ["CN", "LastName", "FirstName"] })),
        );
    };
    state.attendance.sort_by(column);
    ok(&req.id, session_json(&state.attendance))
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_json(&state.attendance))
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    match state.attendance.save(&gw) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "key": outcome.key,
                "studentCount": outcome.student_count,
                "message": "Attendance saved successfully!",
            }),
        ),
        Err(e) => attendance_err(&req.id, &e),
    }
}

fn handle_records_recent(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let limit = match get_optional_u64(req, "limit") {
        Ok(v) => v.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT),
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    let records = match gw.recent_attendance(limit as usize) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("failed to list attendance records: {:?}", e);
            return err(&req.id, "fetch_failed", e.to_string(), None);
        }
    };
    let rows: Vec<serde_json::Value> = records
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "date": r.date.filter(|d| !d.is_empty()).unwrap_or_else(|| "No Date".to_string()),
                "section": r
                    .section
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "No Section".to_string()),
            })
        })
        .collect();
    ok(&req.id, json!({ "records": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(handle_open(state, req)),
        "attendance.selectSection" => Some(handle_select_section(state, req)),
        "attendance.setDate" => Some(handle_set_date(state, req)),
        "attendance.setDayType" => Some(handle_set_day_type(state, req)),
        "attendance.setStatus" => Some(handle_set_status(state, req)),
        "attendance.setConduct" => Some(handle_set_conduct(state, req)),
        "attendance.sort" => Some(handle_sort(state, req)),
        "attendance.state" => Some(handle_state(state, req)),
        "attendance.save" => Some(handle_save(state, req)),
        "attendance.records.recent" => Some(handle_records_recent(state, req)),
        _ => None,
    }
}
