use std::sync::Arc;

use chrono::Utc;

use vaultmesh_types::SessionToken;

use crate::models::DeviceSession;
use crate::store::Store;

#[derive(Clone)]
pub struct SessionRepo {
    store: Arc<Store>,
}

impl SessionRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, session: DeviceSession) -> DeviceSession {
        self.store
            .sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        session
    }

    /// Returns the session only if it has not passed its expiry.
    pub async fn find_valid(&self, token: &SessionToken) -> Option<DeviceSession> {
        let sessions = self.store.sessions.read().await;
        let session = sessions.get(token)?;
        if session.expires_at > Utc::now() {
            Some(session.clone())
        } else {
            None
        }
    }

    pub async fn delete(&self, token: &SessionToken) {
        self.store.sessions.write().await.remove(token);
    }
}
