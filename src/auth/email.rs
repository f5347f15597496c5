//! Email sending helpers.
//!
//! If SMTP is not configured (empty `smtp_host`), the sign-in link is logged
//! instead, which is enough to sign in during development without a mail server.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;
use crate::errors::{AppError, AppResult};

// ── Public helpers ────────────────────────────────────────────

pub fn magic_link_url(config: &Config, email: &str, token: &str) -> String {
    format!(
        "{}/api/v1/auth/callback?token={token}&email={}",
        config.app_base_url.trim_end_matches('/'),
        urlencoding::encode(email),
    )
}

pub async fn send_magic_link_email(config: &Config, to: &str, token: &str) -> AppResult<()> {
    let link = magic_link_url(config, to, token);

    if config.smtp_host.is_empty() {
        tracing::warn!(to, %link, "SMTP not configured, sign-in link printed here");
        return Ok(());
    }

    let body = format!(
        "Hi,\n\nUse the link below to sign in to Goal Tracker:\n\n{link}\n\nThis link expires in {} minutes and can only be used once. If you did not request it, ignore this email.\n\nGoal Tracker",
        config.magic_link_minutes,
    );

    send(config, to, "Your sign-in link for Goal Tracker", &body).await
}

// ── Internal ──────────────────────────────────────────────────

async fn send(config: &Config, to: &str, subject: &str, body: &str) -> AppResult<()> {
    let email = Message::builder()
        .from(
            config.smtp_from.parse()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid SMTP_FROM address")))?,
        )
        .to(to.parse().map_err(|_| AppError::BadRequest("Invalid email address".into()))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_owned())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build email: {e}")))?;

    let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("SMTP relay error: {e}")))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport
        .send(email)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to send email: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_encodes_email_and_points_at_callback() {
        let config = Config::for_tests();
        let link = magic_link_url(&config, "jane+goals@example.com", "tok");
        assert_eq!(
            link,
            "http://localhost:8080/api/v1/auth/callback?token=tok&email=jane%2Bgoals%40example.com"
        );
    }
}
