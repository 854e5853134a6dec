use serde_json::json;

use crate::app::SubmitOutcome;
use crate::ipc::error::{err, ok, require_app};
use crate::ipc::handlers::view::screen_json;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assessment, Gender, StudentDraft};

struct ErrObj {
    message: String,
    details: Option<serde_json::Value>,
}

fn bad(message: impl Into<String>) -> ErrObj {
    ErrObj {
        message: message.into(),
        details: None,
    }
}

/// Absent text fields become empty strings so the validator can report them.
fn text_param(params: &serde_json::Value, key: &str) -> Result<String, ErrObj> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(bad(format!("{key} must be a string"))),
    }
}

/// Numeric input; numeric strings are accepted the way a form field sends them.
fn score_param(params: &serde_json::Value, key: &str) -> Result<f64, ErrObj> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(0.0),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| bad(format!("{key} is not representable"))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| bad(format!("{key} must be numeric"))),
        Some(_) => Err(bad(format!("{key} must be numeric"))),
    }
}

fn parse_draft(params: &serde_json::Value) -> Result<StudentDraft, ErrObj> {
    let gender = match params.get("gender") {
        None | Some(serde_json::Value::Null) => Gender::Male,
        Some(serde_json::Value::String(s)) => match Gender::parse(s) {
            Some(g) => g,
            None => {
                return Err(ErrObj {
                    message: format!("unknown gender: {s}"),
                    details: Some(json!({ "allowed": Gender::ALL })),
                })
            }
        },
        Some(_) => return Err(bad("gender must be a string")),
    };

    let mut draft = StudentDraft {
        student_no: text_param(params, "studentNo")?,
        full_name: text_param(params, "fullName")?,
        gender,
        class_name: text_param(params, "className")?,
        ..StudentDraft::default()
    };
    for a in Assessment::ALL {
        draft.scores.set(a, score_param(params, a.field())?);
    }
    Ok(draft)
}

fn handle_form_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let draft = match parse_draft(&req.params) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", e.message, e.details),
    };
    let outcome = match app.submit_form(draft) {
        SubmitOutcome::Created => "created",
        SubmitOutcome::Invalid(_) => "invalid",
        SubmitOutcome::Failed => "failed",
        SubmitOutcome::Busy => {
            return err(&req.id, "busy", "a save is already in progress", None);
        }
    };
    let mut result = screen_json(app);
    result["outcome"] = json!(outcome);
    ok(&req.id, result)
}

fn handle_form_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let app = match require_app(state, req) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    app.cancel_form();
    ok(&req.id, screen_json(app))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "form.submit" => Some(handle_form_submit(state, req)),
        "form.cancel" => Some(handle_form_cancel(state, req)),
        _ => None,
    }
}
