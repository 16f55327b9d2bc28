//! Administrator account management.

use std::sync::Arc;

use pedidoflex_portal::persist::SnapshotStore;
use pedidoflex_portal::services::auth::AuthService;
use pedidoflex_portal::stores::UserStore;

/// Create an administrator account in the given data directory.
pub async fn create(
    data_dir: &str,
    email: &str,
    name: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let persist = Arc::new(SnapshotStore::new(data_dir));
    let users = UserStore::new(persist);
    users.hydrate().await?;

    let auth = AuthService::new(users);
    let user = auth.create_admin(email, name, password).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "administrator created");
    Ok(())
}
