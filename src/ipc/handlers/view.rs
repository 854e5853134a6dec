use serde_json::json;

use crate::app::{App, View};
use crate::ipc::error::{err, ok, require_app};
use crate::ipc::types::{AppState, Request};
use crate::store::RosterStore;

/// Shared body for every response that re-renders the current screen.
pub fn screen_json<S: RosterStore>(app: &App<S>) -> serde_json::Value {
    json!({
        "view": app.current_view(),
        "loading": app.is_loading(),
        "classFilter": app.class_filter(),
        "screen": app.screen(),
    })
}

fn handle_view_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    ok(&req.id, screen_json(app))
}

fn handle_view_navigate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("view").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing view", None);
    };
    let Some(view) = View::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown view: {raw}"),
            Some(json!({ "allowed": ["dashboard", "list", "form"] })),
        );
    };
    app.navigate(view);
    ok(&req.id, screen_json(app))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "view.get" => Some(handle_view_get(state, req)),
        "view.navigate" => Some(handle_view_navigate(state, req)),
        _ => None,
    }
}
