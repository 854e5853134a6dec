use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::calc::{self, DashboardView};
use crate::model::{ClassFilter, Roster, ScoreBand, StudentDraft, StudentRecord};
use crate::store::{RosterStore, StoreError, Subscription};
use crate::validate::{validate, ValidationError};

pub const DELETE_PROMPT: &str = "Bu öğrenciyi silmek istediğinize emin misiniz?";
pub const CREATE_FAILED_MESSAGE: &str = "Kayıt sırasında bir hata oluştu. Lütfen tekrar deneyin.";
pub const DELETE_FAILED_MESSAGE: &str = "Silme sırasında bir hata oluştu. Lütfen tekrar deneyin.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Dashboard,
    List,
    Form,
}

impl View {
    pub fn parse(raw: &str) -> Option<View> {
        match raw {
            "dashboard" => Some(View::Dashboard),
            "list" => Some(View::List),
            "form" => Some(View::Form),
            _ => None,
        }
    }
}

/// Three-state selector; any state is reachable from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelector {
    current: View,
}

impl Default for ViewSelector {
    fn default() -> Self {
        Self {
            current: View::Dashboard,
        }
    }
}

impl ViewSelector {
    pub fn current(&self) -> View {
        self.current
    }

    pub fn navigate(&mut self, to: View) {
        self.current = to;
    }
}

/// A user-visible message with a stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub code: &'static str,
    pub message: String,
}

impl Notice {
    fn validation(e: &ValidationError) -> Self {
        Self {
            code: e.code(),
            message: e.user_message().to_string(),
        }
    }

    fn persistence(message: &str) -> Self {
        Self {
            code: "persistence_error",
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub draft: StudentDraft,
    /// Re-entrancy guard around `create`. Writes are synchronous, so it is
    /// only ever set inside `submit_form` and responses always report `false`.
    pub saving: bool,
    pub error: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRow {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub bands: [ScoreBand; 3],
}

impl ListRow {
    fn of(record: &StudentRecord) -> Self {
        let mut bands = [ScoreBand::Low; 3];
        for (a, v) in record.scores.iter() {
            bands[a.index()] = ScoreBand::of(v);
        }
        Self {
            record: record.clone(),
            bands,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub count: usize,
    pub rows: Vec<ListRow>,
    pub pending_delete: Option<String>,
    pub error: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub draft: StudentDraft,
    pub saving: bool,
    pub error: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Screen {
    /// First snapshot not yet delivered; `view` is what will render once it is.
    Loading { view: View },
    Dashboard(DashboardView),
    List(ListView),
    Form(FormView),
}

#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    Created,
    Invalid(ValidationError),
    Failed,
    /// Guard hit: a create from this form is already in flight. Unreachable
    /// over IPC while requests are handled one at a time.
    Busy,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    Failed,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NoPendingDelete;

/// Holds the live snapshot and the navigation/form/list state around it.
pub struct App<S: RosterStore> {
    store: S,
    subscription: Option<Subscription>,
    snapshot: Rc<RefCell<Option<Roster>>>,
    view: ViewSelector,
    filter: ClassFilter,
    form: FormState,
    pending_delete: Option<String>,
    list_error: Option<Notice>,
}

impl<S: RosterStore> App<S> {
    pub fn start(mut store: S) -> Result<Self, StoreError> {
        let snapshot: Rc<RefCell<Option<Roster>>> = Rc::new(RefCell::new(None));
        let sink = snapshot.clone();
        let subscription = store.subscribe(Box::new(move |roster| {
            debug!(records = roster.len(), "snapshot received");
            // Replaced wholesale, never patched.
            *sink.borrow_mut() = Some(roster);
        }))?;
        info!("app started");
        Ok(Self {
            store,
            subscription: Some(subscription),
            snapshot,
            view: ViewSelector::default(),
            filter: ClassFilter::All,
            form: FormState::default(),
            pending_delete: None,
            list_error: None,
        })
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.borrow().is_none()
    }

    pub fn current_view(&self) -> View {
        self.view.current()
    }

    pub fn class_filter(&self) -> &ClassFilter {
        &self.filter
    }

    #[cfg(test)]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[cfg(test)]
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    #[cfg(test)]
    pub fn roster(&self) -> Roster {
        self.snapshot.borrow().clone().unwrap_or_default()
    }

    pub fn navigate(&mut self, to: View) {
        let from = self.view.current();
        if from == View::Form && to != View::Form {
            // Leaving the form discards the draft.
            self.form = FormState::default();
        }
        self.pending_delete = None;
        if to != View::List {
            self.list_error = None;
        }
        self.view.navigate(to);
        debug!(?from, ?to, "navigate");
    }

    /// Kept verbatim across snapshots, even if the class disappears.
    pub fn set_class_filter(&mut self, filter: ClassFilter) {
        self.filter = filter;
    }

    pub fn dashboard(&self) -> Option<DashboardView> {
        let snap = self.snapshot.borrow();
        snap.as_ref().map(|roster| calc::dashboard(roster, &self.filter))
    }

    pub fn list(&self) -> Option<ListView> {
        let snap = self.snapshot.borrow();
        snap.as_ref().map(|roster| ListView {
            count: roster.len(),
            rows: roster.iter().map(ListRow::of).collect(),
            pending_delete: self.pending_delete.clone(),
            error: self.list_error.clone(),
        })
    }

    pub fn screen(&self) -> Screen {
        let view = self.view.current();
        if self.is_loading() {
            return Screen::Loading { view };
        }
        match view {
            View::Dashboard => self
                .dashboard()
                .map(Screen::Dashboard)
                .unwrap_or(Screen::Loading { view }),
            View::List => self
                .list()
                .map(Screen::List)
                .unwrap_or(Screen::Loading { view }),
            View::Form => Screen::Form(FormView {
                draft: self.form.draft.clone(),
                saving: self.form.saving,
                error: self.form.error.clone(),
            }),
        }
    }

    /// Validate, then create exactly once. On success the form resets and the
    /// view moves to List; on failure the view stays on Form with a message.
    pub fn submit_form(&mut self, draft: StudentDraft) -> SubmitOutcome {
        if self.form.saving {
            return SubmitOutcome::Busy;
        }
        self.form.draft = draft;
        if let Err(e) = validate(&self.form.draft) {
            self.form.error = Some(Notice::validation(&e));
            return SubmitOutcome::Invalid(e);
        }

        self.form.error = None;
        self.form.saving = true;
        let result = self.store.create(&self.form.draft);
        self.form.saving = false;

        match result {
            Ok(()) => {
                self.form = FormState::default();
                self.navigate(View::List);
                SubmitOutcome::Created
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "create failed");
                self.form.error = Some(Notice::persistence(CREATE_FAILED_MESSAGE));
                SubmitOutcome::Failed
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.navigate(View::List);
    }

    /// Arm the confirmation gate for `id`. Nothing is deleted until
    /// `confirm_delete(true)`.
    pub fn request_delete(&mut self, id: &str) -> &'static str {
        self.pending_delete = Some(id.to_string());
        self.list_error = None;
        DELETE_PROMPT
    }

    pub fn confirm_delete(&mut self, approved: bool) -> Result<DeleteOutcome, NoPendingDelete> {
        let id = self.pending_delete.take().ok_or(NoPendingDelete)?;
        if !approved {
            return Ok(DeleteOutcome::Declined);
        }
        match self.store.delete(&id) {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(e) => {
                warn!(student_id = %id, error = %e, code = e.code(), "delete failed");
                self.list_error = Some(Notice::persistence(DELETE_FAILED_MESSAGE));
                Ok(DeleteOutcome::Failed)
            }
        }
    }

    /// Deliver any roster push a previous write had to defer.
    pub fn catch_up(&mut self) {
        if let Err(e) = self.store.catch_up() {
            warn!(error = %e, code = e.code(), "deferred roster push still failing");
        }
    }

    /// Release the live feed. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.unsubscribe();
            info!("roster feed released");
        }
    }
}
