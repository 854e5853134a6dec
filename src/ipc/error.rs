use serde_json::json;

use crate::app::App;
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteRosterStore;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn no_workspace(req: &Request) -> serde_json::Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}

/// The running app, or the `no_workspace` response to send back. Any roster
/// push a previous write deferred is delivered before the request is served.
pub fn require_app<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut App<SqliteRosterStore>, serde_json::Value> {
    let app = state.app.as_mut().ok_or_else(|| no_workspace(req))?;
    app.catch_up();
    Ok(app)
}
