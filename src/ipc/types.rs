use std::path::PathBuf;

use serde::Deserialize;

use crate::app::App;
use crate::store::SqliteRosterStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub app: Option<App<SqliteRosterStore>>,
}

impl AppState {
    /// Tear down the running app, releasing its roster feed.
    pub fn close(&mut self) {
        if let Some(mut app) = self.app.take() {
            app.shutdown();
        }
        self.workspace = None;
    }
}
