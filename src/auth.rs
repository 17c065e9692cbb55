use crate::backend::Backend;
use crate::error::{Result, StoryError};
use crate::models::{Role, User};
use tracing::{error, info, warn};

const ADMIN_REQUIRED: &str = "Admin privileges required.";

/// A signed-in user whose profile carries the admin role.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    pub user: User,
}

/// Drops the current session. A failed sign-out is only logged.
async fn force_sign_out(backend: &dyn Backend, user_id: &str) {
    match backend.sign_out().await {
        Ok(()) => warn!("Signed out user {}", user_id),
        Err(e) => error!("Sign out of user {} failed: {}", user_id, e),
    }
}

async fn role_of(backend: &dyn Backend, user_id: &str) -> Result<Role> {
    let role = backend.fetch_role(user_id).await?;
    Ok(role.map(|r| Role::from_column(&r)).unwrap_or_else(|| Role::Member(String::new())))
}

impl AdminSession {
    /// Resumes an existing session.
    ///
    /// `Ok(None)` when nobody is signed in. A signed-in user without the
    /// admin role is signed out and gets `Authorization`.
    pub async fn check_auth(backend: &dyn Backend) -> Result<Option<AdminSession>> {
        let Some(session) = backend.get_session().await? else {
            return Ok(None);
        };

        if role_of(backend, &session.user.id).await?.is_admin() {
            Ok(Some(AdminSession { user: session.user }))
        } else {
            warn!("User {} is not an admin", session.user.id);
            force_sign_out(backend, &session.user.id).await;
            Err(StoryError::Authorization(ADMIN_REQUIRED.to_string()))
        }
    }

    /// Signs in and checks the role. A non-admin is signed straight back out.
    pub async fn login(backend: &dyn Backend, email: &str, password: &str) -> Result<AdminSession> {
        let session = backend.sign_in_with_password(email, password).await.map_err(|e| {
            error!("Login error: {}", e);
            e
        })?;

        let role = match role_of(backend, &session.user.id).await {
            Ok(role) => role,
            Err(e) => {
                error!("Role lookup for {} failed: {}", session.user.id, e);
                force_sign_out(backend, &session.user.id).await;
                return Err(e);
            }
        };
        if !role.is_admin() {
            warn!("User {} is not an admin", session.user.id);
            force_sign_out(backend, &session.user.id).await;
            return Err(StoryError::Authorization(ADMIN_REQUIRED.to_string()));
        }

        info!("Admin {} signed in", session.user.id);
        Ok(AdminSession { user: session.user })
    }

    pub async fn logout(self, backend: &dyn Backend) -> Result<()> {
        backend.sign_out().await?;
        info!("Admin {} signed out", self.user.id);
        Ok(())
    }
}
