use serde_json::json;

use crate::ipc::error::{err, ok, require_app};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassFilter;

fn handle_dashboard_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "loading": app.is_loading(),
            "dashboard": app.dashboard(),
        }),
    )
}

fn handle_dashboard_set_class_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let filter = match req.params.get("className") {
        None | Some(serde_json::Value::Null) => ClassFilter::All,
        Some(serde_json::Value::String(s)) => ClassFilter::from_param(Some(s.as_str())),
        Some(_) => {
            return err(
                &req.id,
                "bad_params",
                "className must be a string or null",
                None,
            )
        }
    };
    app.set_class_filter(filter);
    ok(
        &req.id,
        json!({
            "loading": app.is_loading(),
            "dashboard": app.dashboard(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(handle_dashboard_get(state, req)),
        "dashboard.setClassFilter" => Some(handle_dashboard_set_class_filter(state, req)),
        _ => None,
    }
}
