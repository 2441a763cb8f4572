use crate::gateway::{Collection, PersistenceGateway, SqliteGateway};
use crate::ipc::error::{attendance_err, err, ok};
use crate::ipc::helpers::{get_optional_str, require_db};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::roster;
use serde_json::json;
use uuid::Uuid;

fn handle_students_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("students").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing students", None);
    };

    let mut docs: Vec<(String, serde_json::Value)> = Vec::with_capacity(raw.len());
    for (idx, item) in raw.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            return err(
                &req.id,
                "bad_params",
                "student document must be an object",
                Some(json!({ "index": idx })),
            );
        };
        let mut doc = obj.clone();
        let doc_id = match doc.remove("docId") {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let doc = serde_json::Value::Object(doc);
        if let Err(e) = Student::from_doc(&doc_id, &doc) {
            return err(
                &req.id,
                e.code(),
                e.to_string(),
                Some(json!({ "index": idx, "docId": doc_id })),
            );
        }
        docs.push((doc_id, doc));
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    let gw = SqliteGateway::new(&tx);
    for (doc_id, doc) in &docs {
        if let Err(e) = gw.set(Collection::Students, doc_id, doc) {
            log::error!("student import failed at {}: {:?}", doc_id, e);
            return err(
                &req.id,
                "write_failed",
                e.to_string(),
                Some(json!({ "docId": doc_id })),
            );
        }
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }

    log::info!("{} student documents imported", docs.len());
    let ids: Vec<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
    ok(&req.id, json!({ "imported": docs.len(), "docIds": ids }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let section = get_optional_str(req, "section");
    let gw = SqliteGateway::new(conn);
    match roster::list_students(&gw, section.as_deref()) {
        Ok(students) => {
            let rows: Vec<serde_json::Value> = students.iter().map(student_json).collect();
            ok(&req.id, json!({ "students": rows }))
        }
        Err(e) => attendance_err(&req.id, &e),
    }
}

fn student_json(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "section": s.section,
        "classNumber": s.class_number,
        "lastName": s.last_name,
        "firstName": s.first_name,
        "schoolYear": s.school_year,
        "term": s.term,
        "subject": s.subject,
    })
}

fn handle_sections_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let gw = SqliteGateway::new(conn);
    match roster::list_sections(&gw) {
        Ok(sections) => ok(&req.id, json!({ "sections": sections })),
        Err(e) => attendance_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.import" => Some(handle_students_import(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "sections.list" => Some(handle_sections_list(state, req)),
        _ => None,
    }
}
