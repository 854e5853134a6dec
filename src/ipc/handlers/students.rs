use serde_json::json;

use crate::app::DeleteOutcome;
use crate::ipc::error::{err, ok, require_app};
use crate::ipc::handlers::view::screen_json;
use crate::ipc::types::{AppState, Request};

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "loading": app.is_loading(),
            "list": app.list(),
        }),
    )
}

fn handle_students_request_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let prompt = app.request_delete(&student_id);
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "prompt": prompt,
        }),
    )
}

fn handle_students_confirm_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let Some(approved) = req.params.get("approved").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing approved", None);
    };
    let outcome = match app.confirm_delete(approved) {
        Ok(o) => o,
        Err(_) => {
            return err(
                &req.id,
                "no_pending_delete",
                "call students.requestDelete first",
                None,
            )
        }
    };
    let outcome = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::Declined => "declined",
        DeleteOutcome::Failed => "failed",
    };
    let mut result = screen_json(app);
    result["outcome"] = json!(outcome);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.requestDelete" => Some(handle_students_request_delete(state, req)),
        "students.confirmDelete" => Some(handle_students_confirm_delete(state, req)),
        _ => None,
    }
}
