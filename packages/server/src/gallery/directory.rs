use std::sync::Arc;

use common::docstore::{BatchWrite, Direction, Document, DocumentStore, Query, to_fields};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::GalleryError;
use super::model::{User, UserFields, paths};
use crate::utils::hash;

/// A user document including its credential.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// Absent on accounts created before passwords were hashed.
    pub password_hash: Option<String>,
}

impl UserRecord {
    fn from_document(doc: &Document) -> Result<Self, GalleryError> {
        let fields: UserFields = doc.decode()?;
        Ok(Self {
            id: doc.id.clone(),
            name: fields.name,
            password_hash: fields.password_hash,
        })
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Usernames are 1-32 characters of ASCII letters, digits, `_` or `-`.
pub fn validate_username(name: &str) -> Result<String, GalleryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GalleryError::Validation("Username is required".into()));
    }
    if name.len() > 32
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(GalleryError::Validation(
            "Username must be 1-32 characters of letters, digits, '_' or '-'".into(),
        ));
    }
    Ok(name.to_lowercase())
}

fn validate_password(password: &str, what: &str) -> Result<(), GalleryError> {
    if password.is_empty() {
        return Err(GalleryError::Validation(format!("{what} is required")));
    }
    if password.len() > 128 {
        return Err(GalleryError::Validation(format!(
            "{what} must be at most 128 characters"
        )));
    }
    Ok(())
}

async fn hash_blocking(password: &str) -> Result<String, GalleryError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash::hash_password(&password))
        .await
        .map_err(|e| GalleryError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| GalleryError::Internal(format!("password hash error: {e}")))
}

async fn verify_blocking(password: &str, stored: &str) -> Result<bool, GalleryError> {
    let (password, stored) = (password.to_string(), stored.to_string());
    tokio::task::spawn_blocking(move || hash::verify_password(&password, &stored))
        .await
        .map_err(|e| GalleryError::Internal(format!("verify task failed: {e}")))?
        .map_err(|e| GalleryError::Internal(format!("password verify error: {e}")))
}

/// Accounts and credentials, stored in the `users` collection.
/// Names are kept lowercase and compared case-insensitively.
#[derive(Clone)]
pub struct UserDirectory {
    docs: Arc<dyn DocumentStore>,
    /// Held across the name check and the insert of a registration.
    registration: Arc<Mutex<()>>,
}

impl UserDirectory {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self {
            docs,
            registration: Arc::new(Mutex::new(())),
        }
    }

    /// All users by name. Credentials are not included.
    pub async fn list_users(&self) -> Result<Vec<User>, GalleryError> {
        let docs = self
            .docs
            .query(
                &paths::users()?,
                &Query::new().order_by("name", Direction::Ascending),
            )
            .await?;
        docs.iter()
            .map(|doc| UserRecord::from_document(doc).map(|r| r.to_user()))
            .collect()
    }

    pub async fn is_empty(&self) -> Result<bool, GalleryError> {
        let docs = self
            .docs
            .query(&paths::users()?, &Query::new().limit(1))
            .await?;
        Ok(docs.is_empty())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, GalleryError> {
        let name = name.trim().to_lowercase();
        let docs = self
            .docs
            .query(
                &paths::users()?,
                &Query::new().where_eq("name", name).limit(1),
            )
            .await?;
        docs.first().map(UserRecord::from_document).transpose()
    }

    /// The user if `name` and `password` match an account with a hashed
    /// password, `None` otherwise. Unknown names and wrong passwords are
    /// indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn validate_user(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<User>, GalleryError> {
        let Some(record) = self.find_by_name(name).await? else {
            debug!("Login for unknown user");
            return Ok(None);
        };
        let Some(stored) = record.password_hash.as_deref() else {
            warn!(user = %record.name, "User has no password hash, refusing login");
            return Ok(None);
        };
        match verify_blocking(password, stored).await {
            Ok(true) => Ok(Some(record.to_user())),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!(user = %record.name, error = %e, "Stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    /// Create an account. Rejects missing fields and names already taken
    /// in any letter case.
    ///
    /// Registrations through clones of this directory are serialised, so two
    /// concurrent requests for the same name cannot both succeed. Another
    /// process writing to the same store is not covered.
    #[instrument(skip(self, password))]
    pub async fn add_user(&self, name: &str, password: &str) -> Result<User, GalleryError> {
        let name = validate_username(name)?;
        validate_password(password, "Password")?;
        let password_hash = hash_blocking(password).await?;

        let _guard = self.registration.lock().await;
        if self.find_by_name(&name).await?.is_some() {
            return Err(GalleryError::DuplicateName(
                "A user with this name already exists".into(),
            ));
        }

        let doc = self
            .docs
            .add(
                &paths::users()?,
                to_fields(&UserFields {
                    name: name.clone(),
                    password_hash: Some(password_hash),
                })?,
            )
            .await?;
        info!(user = %name, user_id = %doc.id, "User created");
        Ok(User { id: doc.id, name })
    }

    /// Create several accounts in one atomic batch. Names are not checked
    /// against existing users.
    pub async fn add_users_batch(&self, users: &[(String, String)]) -> Result<usize, GalleryError> {
        let collection = paths::users()?;
        let mut writes = Vec::with_capacity(users.len());
        for (name, password) in users {
            let name = validate_username(name)?;
            validate_password(password, "Password")?;
            let fields = to_fields(&UserFields {
                name,
                password_hash: Some(hash_blocking(password).await?),
            })?;
            let path = collection
                .doc(&Uuid::new_v4().simple().to_string())
                .map_err(GalleryError::Store)?;
            writes.push(BatchWrite::Set { path, fields });
        }
        let count = writes.len();
        self.docs.commit(writes).await?;
        Ok(count)
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        name: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), GalleryError> {
        validate_password(current_password, "Current password")?;
        validate_password(new_password, "New password")?;

        let record = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| GalleryError::NotFound(format!("User '{name}'")))?;
        let stored = record.password_hash.as_deref().ok_or_else(|| {
            GalleryError::CredentialMismatch(
                "This account has no password set and cannot change it".into(),
            )
        })?;
        if !verify_blocking(current_password, stored).await? {
            return Err(GalleryError::CredentialMismatch(
                "Current password is incorrect".into(),
            ));
        }

        let password_hash = hash_blocking(new_password).await?;
        self.docs
            .update(
                &paths::user(&record.id)?,
                to_fields(&json!({ "password_hash": password_hash }))?,
            )
            .await
            .map_err(|e| GalleryError::from_store(e, || format!("User '{name}'")))?;
        info!(user = %record.name, "Password changed");
        Ok(())
    }
}
