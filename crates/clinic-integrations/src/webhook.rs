//! Billing webhook over HTTP.

use std::time::Duration;

use clinic_core::config::WebhookConfig;
use clinic_core::invoicing::{InvoiceSubmission, InvoiceWebhook, WebhookError};
use reqwest::blocking::Client;

/// Posts invoice submissions as JSON to a fixed URL.
pub struct HttpWebhook {
    http: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WebhookError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clinic-integrations/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebhookError::Transport(format!("client build failed: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, WebhookError> {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl InvoiceWebhook for HttpWebhook {
    /// Any HTTP reply is returned as its status code; only transport
    /// failures are errors.
    fn post(&self, submission: &InvoiceSubmission) -> Result<u16, WebhookError> {
        let response = self
            .http
            .post(&self.url)
            .json(submission)
            .send()
            .map_err(|e| {
                tracing::warn!(url = %self.url, error = %e, "webhook request failed");
                WebhookError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        tracing::info!(
            url = %self.url,
            invoice_number = %submission.invoice_number,
            status,
            "webhook replied"
        );
        Ok(status)
    }
}
