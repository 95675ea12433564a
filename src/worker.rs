use std::time::Duration;
use tokio::sync::mpsc;
use crate::metrics::DELIVERY_FAILURES;
use crate::models::{ContactRequest, QueuedSubmission};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

// Background worker -> delivers queued submissions one by one
pub async fn delivery_worker(
    mut rx: mpsc::Receiver<QueuedSubmission>,
    client: reqwest::Client,
    webhook_url: Option<String>,
) {
    tracing::info!(webhook = webhook_url.as_deref().unwrap_or("<none>"), "Delivery worker started");

    while let Some(queued) = rx.recv().await {
        let result = match &webhook_url {
            Some(url) => deliver(&client, url, &queued.request).await,
            None => {
                tracing::info!(
                    identifier = %queued.identifier,
                    name = %queued.request.name,
                    email = %queued.request.email,
                    subject = queued.request.subject.as_deref().unwrap_or(""),
                    message_len = queued.request.message.len(),
                    "Contact submission received"
                );
                Ok(())
            }
        };

        if let Err(e) = &result {
            DELIVERY_FAILURES.inc();
            tracing::warn!(identifier = %queued.identifier, error = %e, "Failed to deliver submission");
        }

        // Handler may have gone away; nothing to do then
        let _ = queued.response_tx.send(result);
    }

    tracing::info!("Delivery worker stopped");
}

async fn deliver(client: &reqwest::Client, url: &str, request: &ContactRequest) -> Result<(), String> {
    let res = client
        .post(url)
        .timeout(DELIVERY_TIMEOUT)
        .json(request)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    let status = res.status();
    if status.is_success() {
        tracing::debug!(%status, "Submission delivered to webhook");
        Ok(())
    } else {
        Err(format!("Webhook returned {}", status))
    }
}
