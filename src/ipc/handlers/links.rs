use crate::ipc::error::{attendance_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::links;
use serde_json::json;

fn handle_links_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let attendance_id = req
        .params
        .get("attendanceId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let expiry = req
        .params
        .get("expiry")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");
    let duration = match req.params.get("durationMinutes") {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok())),
        None => None,
    };
    let Some(duration) = duration.filter(|_| !attendance_id.is_empty() && !expiry.is_empty())
    else {
        return err(
            &req.id,
            "bad_params",
            "Please fill in all link generation fields.",
            None,
        );
    };

    match links::generate(&state.config.quiz_base_url, attendance_id, expiry, duration) {
        Ok(link) => ok(
            &req.id,
            json!({ "url": link.url, "expiresAtMs": link.expires_at_ms }),
        ),
        Err(e) => attendance_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "links.generate" => Some(handle_links_generate(state, req)),
        _ => None,
    }
}
