use std::sync::Arc;

use crate::database::Database;
use crate::http_server::page::PageRenderer;

pub struct AppState {
    pub db: Arc<Database>,
    pub renderer: Arc<dyn PageRenderer>,
}
