use crate::auth::AdminSession;
use crate::backend::ClientAccessor;
use crate::commands::Notice;
use crate::error::StoryError;
use crate::models::StoryStatus;
use crate::moderation::ModerationPipeline;
use crate::render::{render_message, render_moderation_card};
use tracing::error;

pub const NO_SUBMISSIONS: &str = "No submissions to review.";
pub const ACCESS_DENIED: &str = "Access denied. Admin privileges required.";
const CLIENT_MISSING: &str = "Backend client not initialized.";
const LOAD_FAILED_HTML: &str = "<p style=\"text-align: center; color: #d32f2f;\">Error loading submissions. Please refresh the page.</p>";

/// Which half of the admin page is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminView {
    Login { notice: Option<Notice> },
    Panel { posts_html: String },
}

/// Result of an approve/reject click.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub notice: Notice,
    /// The refreshed queue, present after a successful change.
    pub posts_html: Option<String>,
}

/// The moderation page, holding whoever is signed in.
pub struct AdminConsole<'a> {
    accessor: &'a ClientAccessor,
    session: Option<AdminSession>,
}

impl<'a> AdminConsole<'a> {
    pub fn new(accessor: &'a ClientAccessor) -> Self {
        AdminConsole {
            accessor,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    fn banner(&self, notice: Notice) -> Notice {
        notice.dismiss_after_secs(self.accessor.config().banner_dismiss_secs)
    }

    /// Runs on every page load.
    pub async fn check_auth(&mut self) -> AdminView {
        self.session = None;
        let Some(client) = self.accessor.get_client() else {
            return AdminView::Login {
                notice: Some(self.banner(Notice::error(CLIENT_MISSING))),
            };
        };

        match AdminSession::check_auth(client.as_ref()).await {
            Ok(Some(session)) => {
                self.session = Some(session);
                AdminView::Panel {
                    posts_html: self.load_posts().await,
                }
            }
            Ok(None) => AdminView::Login { notice: None },
            Err(StoryError::Authorization(_)) => AdminView::Login {
                notice: Some(self.banner(Notice::error(ACCESS_DENIED))),
            },
            Err(e) => {
                error!("Auth check error: {}", e);
                AdminView::Login {
                    notice: Some(self.banner(Notice::error("Error checking authentication."))),
                }
            }
        }
    }

    /// Login errors stay on the form until the next attempt.
    pub async fn login(&mut self, email: &str, password: &str) -> AdminView {
        let Some(client) = self.accessor.get_client() else {
            return AdminView::Login {
                notice: Some(Notice::error(CLIENT_MISSING)),
            };
        };

        match AdminSession::login(client.as_ref(), email, password).await {
            Ok(session) => {
                self.session = Some(session);
                AdminView::Panel {
                    posts_html: self.load_posts().await,
                }
            }
            Err(e) => {
                let message = match e {
                    StoryError::Authorization(_) => ACCESS_DENIED.to_string(),
                    StoryError::Backend(msg) if !msg.is_empty() => msg,
                    _ => "Login failed. Please try again.".to_string(),
                };
                AdminView::Login {
                    notice: Some(Notice::error(message)),
                }
            }
        }
    }

    pub async fn logout(&mut self) -> AdminView {
        if let (Some(session), Some(client)) = (self.session.take(), self.accessor.get_client()) {
            if let Err(e) = session.logout(client.as_ref()).await {
                error!("Logout error: {}", e);
            }
        }
        AdminView::Login { notice: None }
    }

    /// HTML for the whole moderation queue.
    pub async fn load_posts(&self) -> String {
        let Some(client) = self.accessor.get_client() else {
            return LOAD_FAILED_HTML.to_string();
        };
        let excerpt_length = self.accessor.config().excerpt_length;

        match ModerationPipeline::new(client.as_ref()).list_reviewable().await {
            Ok(stories) if stories.is_empty() => render_message(NO_SUBMISSIONS),
            Ok(stories) => stories
                .iter()
                .map(|story| render_moderation_card(story, excerpt_length))
                .collect(),
            Err(_) => LOAD_FAILED_HTML.to_string(),
        }
    }

    pub async fn update_status(&self, id: &str, status: StoryStatus) -> StatusChange {
        let verb = match status {
            StoryStatus::Approved => "approving",
            _ => "rejecting",
        };

        let result = match (&self.session, self.accessor.get_client()) {
            (None, _) => Err(StoryError::Authorization(ACCESS_DENIED.to_string())),
            (Some(_), None) => Err(StoryError::Configuration(CLIENT_MISSING.to_string())),
            (Some(_), Some(client)) => {
                ModerationPipeline::new(client.as_ref())
                    .set_status(id, status)
                    .await
            }
        };

        match result {
            Ok(()) => StatusChange {
                notice: self.banner(Notice::success(format!("Post {} successfully.", status))),
                posts_html: Some(self.load_posts().await),
            },
            Err(e) => {
                error!("Error updating post status: {}", e);
                StatusChange {
                    notice: self.banner(Notice::error(format!(
                        "Error {} post: {}",
                        verb,
                        e.user_message()
                    ))),
                    posts_html: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::Config;
    use crate::models::{ContentBlock, NewStory};
    use crate::testing::FaultyBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn seeded() -> Arc<FaultyBackend> {
        let backend = FaultyBackend::new();
        backend.inner.create_account("ed@storymakers.tw", "s3cret", "admin").unwrap();
        backend.inner.create_account("writer@example.com", "pw", "member").unwrap();
        Arc::new(backend)
    }

    async fn submit(backend: &FaultyBackend, title: &str) -> String {
        backend
            .insert_post(&NewStory {
                title: title.to_string(),
                slug: crate::slug::generate_slug(title),
                content: vec![ContentBlock::paragraph("Body")],
                status: StoryStatus::Pending,
                project_district: "Shilin".to_string(),
                cover_image_url: None,
                author_name: Some("Lin".to_string()),
                author_email: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_login_shows_queue() {
        let backend = seeded();
        submit(&backend, "Queued Story").await;
        let accessor = ClientAccessor::with_backend(Config::default(), backend.clone());
        let mut console = AdminConsole::new(&accessor);

        assert_eq!(console.check_auth().await, AdminView::Login { notice: None });

        match console.login("ed@storymakers.tw", "s3cret").await {
            AdminView::Panel { posts_html } => {
                assert!(posts_html.contains("Queued Story"));
                assert!(posts_html.contains("status-pending"));
            }
            other => panic!("expected panel, got {:?}", other),
        }

        assert!(matches!(console.check_auth().await, AdminView::Panel { .. }));
        assert_eq!(console.logout().await, AdminView::Login { notice: None });
        assert!(console.session().is_none());
    }

    #[tokio::test]
    async fn test_member_denied() {
        let backend = seeded();
        let accessor = ClientAccessor::with_backend(Config::default(), backend.clone());
        let mut console = AdminConsole::new(&accessor);

        match console.login("writer@example.com", "pw").await {
            AdminView::Login { notice: Some(notice) } => assert_eq!(notice.message, ACCESS_DENIED),
            other => panic!("expected denial, got {:?}", other),
        }
        assert!(backend.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_page_load_signs_out_member() {
        let backend = seeded();
        backend.sign_in_with_password("writer@example.com", "pw").await.unwrap();
        let accessor = ClientAccessor::with_backend(Config::default(), backend.clone());
        let mut console = AdminConsole::new(&accessor);

        match console.check_auth().await {
            AdminView::Login { notice: Some(notice) } => {
                assert_eq!(notice.message, ACCESS_DENIED);
                assert_eq!(notice.dismiss_after, Some(Duration::from_secs(5)));
            }
            other => panic!("expected denial, got {:?}", other),
        }
        assert!(backend.get_session().await.unwrap().is_none());
        assert_eq!(console.check_auth().await, AdminView::Login { notice: None });
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let backend = seeded();
        let accessor = ClientAccessor::with_backend(Config::default(), backend);
        let mut console = AdminConsole::new(&accessor);
        console.login("ed@storymakers.tw", "s3cret").await;

        assert!(console.load_posts().await.contains(NO_SUBMISSIONS));
    }

    #[tokio::test]
    async fn test_approve_refreshes_queue() {
        let backend = seeded();
        let id = submit(&backend, "Approve Me").await;
        let accessor = ClientAccessor::with_backend(Config::default(), backend.clone());
        let mut console = AdminConsole::new(&accessor);
        console.login("ed@storymakers.tw", "s3cret").await;

        let change = console.update_status(&id, StoryStatus::Approved).await;
        assert_eq!(change.notice.message, "Post approved successfully.");
        assert_eq!(change.notice.dismiss_after, Some(Duration::from_secs(5)));
        let html = change.posts_html.unwrap();
        assert!(html.contains("status-approved"));
        assert!(!html.contains(&format!("approve-{}", id)));
    }

    #[tokio::test]
    async fn test_update_error_notice() {
        let backend = FaultyBackend::new().failing_status_updates();
        backend.inner.create_account("ed@storymakers.tw", "s3cret", "admin").unwrap();
        let id = submit(&backend, "Stuck").await;
        let accessor = ClientAccessor::with_backend(Config::default(), Arc::new(backend));
        let mut console = AdminConsole::new(&accessor);
        console.login("ed@storymakers.tw", "s3cret").await;

        let change = console.update_status(&id, StoryStatus::Approved).await;
        assert_eq!(
            change.notice.message,
            "Error approving post: permission denied for table posts"
        );
        assert!(change.posts_html.is_none());

        let change = console.update_status(&id, StoryStatus::Rejected).await;
        assert!(change.notice.message.starts_with("Error rejecting post:"));
    }

    #[tokio::test]
    async fn test_update_requires_login() {
        let backend = seeded();
        let id = submit(&backend, "Nope").await;
        let accessor = ClientAccessor::with_backend(Config::default(), backend);
        let console = AdminConsole::new(&accessor);

        let change = console.update_status(&id, StoryStatus::Approved).await;
        assert!(change.notice.is_error());
    }
}
