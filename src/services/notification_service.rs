use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Outbound applicant notifications. Best-effort by contract: callers
/// dispatch off the mutation path and drop failures with a log line.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_application_received(
        &self,
        email: &str,
        name: &str,
        job_title: &str,
    ) -> anyhow::Result<()>;
}

/// Delivers notifications to an external webhook endpoint which owns the
/// actual email/calendar content.
pub struct WebhookNotifier {
    client: Client,
    target_url: String,
    secret: Option<String>,
}

impl WebhookNotifier {
    pub fn new(target_url: String, secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            target_url,
            secret,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_application_received(
        &self,
        email: &str,
        name: &str,
        job_title: &str,
    ) -> anyhow::Result<()> {
        let payload = json!({
            "event_type": "application_received",
            "email": email,
            "name": name,
            "job_title": job_title,
        });
        let mut request = self.client.post(&self.target_url).json(&payload);
        if let Some(secret) = &self.secret {
            request = request.header("X-Webhook-Secret", secret);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("notification webhook returned {}", response.status());
        }
        Ok(())
    }
}

/// Swallows notifications; used in tests and unconfigured deployments.
#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_application_received(
        &self,
        _email: &str,
        _name: &str,
        _job_title: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
