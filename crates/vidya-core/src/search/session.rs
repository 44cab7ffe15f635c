//! Lazily-created search session shared by every search-stage call.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::provider::{ProviderError, Session, SessionStore};

pub const APP_NAME: &str = "vidya_planner_search";
pub const USER_ID: &str = "system";
pub const SESSION_ID: &str = "search_session";

/// Creates the search session on first use and hands out the same handle
/// afterwards.
///
/// A failed creation is not cached; the next call retries.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    session: OnceCell<Session>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            session: OnceCell::new(),
        }
    }

    pub async fn session(&self) -> Result<&Session, ProviderError> {
        self.session
            .get_or_try_init(|| async {
                let session = self
                    .store
                    .create_session(APP_NAME, USER_ID, SESSION_ID)
                    .await?;
                info!(session_id = %session.id, "created search session");
                Ok::<_, ProviderError>(session)
            })
            .await
    }
}
