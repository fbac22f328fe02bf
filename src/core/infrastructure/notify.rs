//! Notification side effects: pre-release invites, subscriber notices and
//! the publish-change signal consumed by the downstream publisher.

use async_trait::async_trait;
use handlebars::Handlebars;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::error::{NotifyError, Result};

/// Everything a notification body needs to describe a release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseNotice {
    pub release_id: Uuid,
    pub publication_title: String,
    pub slug: String,
    pub amendment: bool,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Invite one email address to pre-release access.
    async fn send_prerelease_invite(&self, email: &str, notice: &ReleaseNotice) -> Result<()>;

    /// Tell subscribers of the publication about this release.
    async fn notify_subscribers(&self, notice: &ReleaseNotice) -> Result<()>;

    /// Signal the downstream publisher that the release changed.
    async fn release_changed(&self, notice: &ReleaseNotice, immediate: bool) -> Result<()>;
}

const INVITE_TEMPLATE: &str = "\
You have been granted pre-release access to {{publication_title}}.\n\
The release will be available at /publication/{{slug}} once published.\n";

/// Posts JSON messages to the configured notifier endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: Url,
    templates: Handlebars<'static>,
}

impl HttpNotifier {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|_| NotifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
        })?;
        let mut templates = Handlebars::new();
        templates
            .register_template_string("prerelease_invite", INVITE_TEMPLATE)
            .map_err(NotifyError::Template)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            templates,
        })
    }

    fn route(&self, path: &str) -> Result<Url> {
        self.endpoint.join(path).map_err(|_| {
            NotifyError::InvalidEndpoint {
                endpoint: format!("{}{}", self.endpoint, path),
            }
            .into()
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_prerelease_invite(&self, email: &str, notice: &ReleaseNotice) -> Result<()> {
        let body = self
            .templates
            .render("prerelease_invite", notice)
            .map_err(NotifyError::Render)?;
        self.client
            .post(self.route("emails")?)
            .json(&json!({
                "to": email,
                "subject": format!("Pre-release access: {}", notice.publication_title),
                "body": body,
            }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(NotifyError::Http)?;
        info!("Sent pre-release invite to {}", email);
        Ok(())
    }

    async fn notify_subscribers(&self, notice: &ReleaseNotice) -> Result<()> {
        self.client
            .post(self.route("subscriber-notices")?)
            .json(notice)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(NotifyError::Http)?;
        info!("Queued subscriber notice for release {}", notice.release_id);
        Ok(())
    }

    async fn release_changed(&self, notice: &ReleaseNotice, immediate: bool) -> Result<()> {
        self.client
            .post(self.route("release-changes")?)
            .json(&json!({
                "release_id": notice.release_id,
                "slug": notice.slug,
                "immediate": immediate,
            }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(NotifyError::Http)?;
        info!("Signalled release change for {}", notice.release_id);
        Ok(())
    }
}

/// Logs and succeeds. Used when no notifier endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_prerelease_invite(&self, email: &str, _notice: &ReleaseNotice) -> Result<()> {
        debug!("No notifier endpoint configured; skipping invite to {}", email);
        Ok(())
    }

    async fn notify_subscribers(&self, notice: &ReleaseNotice) -> Result<()> {
        debug!(
            "No notifier endpoint configured; skipping subscriber notice for {}",
            notice.release_id
        );
        Ok(())
    }

    async fn release_changed(&self, notice: &ReleaseNotice, _immediate: bool) -> Result<()> {
        debug!(
            "No notifier endpoint configured; skipping change signal for {}",
            notice.release_id
        );
        Ok(())
    }
}

/// Records every call for assertions in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    invites: Mutex<Vec<String>>,
    subscriber_notices: Mutex<Vec<Uuid>>,
    changes: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invites(&self) -> Vec<String> {
        self.invites.lock().clone()
    }

    pub fn subscriber_notices(&self) -> Vec<Uuid> {
        self.subscriber_notices.lock().clone()
    }

    pub fn changes(&self) -> Vec<Uuid> {
        self.changes.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_prerelease_invite(&self, email: &str, _notice: &ReleaseNotice) -> Result<()> {
        self.invites.lock().push(email.to_string());
        Ok(())
    }

    async fn notify_subscribers(&self, notice: &ReleaseNotice) -> Result<()> {
        self.subscriber_notices.lock().push(notice.release_id);
        Ok(())
    }

    async fn release_changed(&self, notice: &ReleaseNotice, _immediate: bool) -> Result<()> {
        self.changes.lock().push(notice.release_id);
        Ok(())
    }
}
