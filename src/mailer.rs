use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context};
use axum::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::MailConfig;

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: [EmailAddress<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

/// Sends through a transactional email HTTP API (Brevo-compatible payload).
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build mail http client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: &self.config.sender_email,
                name: Some(&self.config.sender_name),
            },
            to: [EmailAddress { email: to, name: None }],
            subject,
            html_content: html,
        };

        let response = self
            .client
            .post(self.config.api_url.as_str())
            .header("api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("send email via {}", self.config.api_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("mail API rejected message (status={status}): {text}");
        }
        Ok(())
    }
}

pub const VERIFY_SUBJECT: &str = "Verify Your Email";

pub fn verification_link(public_url: &str, token: &str) -> String {
    format!("{public_url}/api/auth/verify-email/{token}")
}

pub fn verification_email(verify_url: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; background: #f9f9f9; color: #333;">
  <h2 style="color: #4CAF50;">Welcome to Codec</h2>
  <p>Thanks for signing up! Please click the button below to verify your email:</p>
  <a href="{verify_url}" style="display: inline-block; padding: 10px 20px; background-color: #4CAF50; color: white; text-decoration: none; border-radius: 5px; margin-top: 10px;">Verify Email</a>
  <p>If you did not create an account, you can safely ignore this email.</p>
  <hr style="margin-top: 20px;">
  <p style="font-size: 12px; color: #777;">This is an automated message. Please do not reply.</p>
</div>"#
    )
}

/// Hand a verification email to the mailer in the background.
///
/// The caller's response never depends on the outcome; failures are logged.
pub fn dispatch_verification(
    mailer: Arc<dyn Mailer>,
    public_url: &str,
    to: String,
    token: &str,
) -> JoinHandle<()> {
    let html = verification_email(&verification_link(public_url, token));
    tokio::spawn(async move {
        match mailer.send(&to, VERIFY_SUBJECT, &html).await {
            Ok(()) => info!(email = %to, "verification email sent"),
            Err(e) => error!(email = %to, error = %format!("{e:#}"), "verification email failed"),
        }
    })
}
