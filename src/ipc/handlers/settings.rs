use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, require_db};
use crate::ipc::types::{AppState, Request};
use crate::settings::{self, SchoolSettings, SettingsError};
use serde_json::json;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match settings::load(conn) {
        Ok(s) => ok(&req.id, json!({ "settings": s })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_settings_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let incoming: SchoolSettings = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    match settings::save(conn, incoming) {
        Ok(saved) => ok(&req.id, json!({ "settings": saved })),
        Err(SettingsError::LogoTooLarge(len)) => err(
            &req.id,
            "logo_too_large",
            "Image size exceeds 1MB limit. Please choose a smaller image.",
            Some(json!({ "length": len })),
        ),
        Err(SettingsError::Storage(e)) => {
            log::error!("failed to save school settings: {:?}", e);
            err(&req.id, "db_update_failed", e.to_string(), None)
        }
        Err(e @ SettingsError::NotConfigured) => {
            err(&req.id, "settings_missing", e.to_string(), None)
        }
    }
}

fn handle_settings_context(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(&state.db, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let school_year = get_optional_str(req, "schoolYear");
    let semester = get_optional_str(req, "semester");
    let loaded = match settings::load(conn) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match settings::term_context(&loaded, school_year.as_deref(), semester.as_deref()) {
        Ok(ctx) => ok(&req.id, json!({ "context": ctx })),
        Err(e @ SettingsError::NotConfigured) => {
            err(&req.id, "settings_missing", e.to_string(), None)
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.save" => Some(handle_settings_save(state, req)),
        "settings.context" => Some(handle_settings_context(state, req)),
        _ => None,
    }
}
