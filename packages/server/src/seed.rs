use tracing::info;

use crate::config::SeedConfig;
use crate::gallery::{GalleryError, UserDirectory};

/// Create the configured accounts if the directory is empty.
///
/// Runs on every startup; once any user exists it does nothing.
pub async fn seed_default_users(
    directory: &UserDirectory,
    config: &SeedConfig,
) -> Result<usize, GalleryError> {
    if config.users.is_empty() || !directory.is_empty().await? {
        return Ok(0);
    }

    let users: Vec<(String, String)> = config
        .users
        .iter()
        .map(|u| (u.name.clone(), u.password.clone()))
        .collect();
    let created = directory.add_users_batch(&users).await?;
    info!("Seeded {} default users", created);
    Ok(created)
}
