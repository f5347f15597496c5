//! Page-cache invalidation hints.
//!
//! After a successful mutation, actions name the page paths whose rendered
//! output is now stale. The hint is fire-and-forget: it is broadcast to
//! in-process subscribers and, when `REVALIDATE_URL` is set, posted to the
//! rendering layer's webhook on a spawned task. Failures are logged only.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Revalidator {
    tx:      broadcast::Sender<String>,
    webhook: Option<Webhook>,
}

#[derive(Clone)]
struct Webhook {
    client: reqwest::Client,
    url:    String,
}

impl Revalidator {
    pub fn new(webhook_url: Option<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let webhook = webhook_url.map(|url| Webhook { client: reqwest::Client::new(), url });
        Self { tx, webhook }
    }

    /// Receive every path invalidated from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn revalidate(&self, path: &str) {
        tracing::debug!(path, "Revalidating page");

        // No subscribers is the normal case; nothing to report.
        let _ = self.tx.send(path.to_owned());

        if let Some(webhook) = &self.webhook {
            let url = format!("{}?path={}", webhook.url, urlencoding::encode(path));
            let client = webhook.client.clone();
            let path = path.to_owned();
            tokio::spawn(async move {
                match client.post(&url).send().await {
                    Ok(resp) if resp.status().is_success() => {}
                    Ok(resp) => tracing::warn!(%path, status = %resp.status(), "Revalidation webhook rejected path"),
                    Err(err) => tracing::warn!(%path, error = %err, "Revalidation webhook unreachable"),
                }
            });
        }
    }

    pub fn revalidate_all<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.revalidate(path);
        }
    }
}
