use rizq_database::Database;

use crate::auth::HttpAuthProvider;

/// Shared handles cloned into every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub auth: HttpAuthProvider,
}
