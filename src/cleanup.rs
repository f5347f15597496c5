//! Periodic purge of expired sessions and unused sign-in tokens.

use std::time::Duration;

use chrono::Utc;

use crate::{db::Db, state::AppState};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub sessions:            u64,
    pub verification_tokens: u64,
}

pub fn spawn_expired_credentials_cleanup(state: AppState) {
    let minutes = state.config.cleanup_interval_minutes;
    if minutes == 0 {
        tracing::info!("Expired credentials cleanup disabled");
        return;
    }

    tracing::info!(minutes, "Expired credentials cleanup started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(minutes.saturating_mul(60)));
        // First tick fires immediately; the first purge waits one full interval.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(err) = run_cleanup(&state.pool).await {
                tracing::error!(error = %err, "Expired credentials cleanup failed");
            }
        }
    });
}

pub async fn run_cleanup(pool: &Db) -> anyhow::Result<CleanupReport> {
    let now = Utc::now();

    let sessions = sqlx::query("DELETE FROM sessions WHERE expires < ?")
        .bind(now)
        .execute(pool)
        .await?
        .rows_affected();

    let verification_tokens = sqlx::query("DELETE FROM verification_tokens WHERE expires < ?")
        .bind(now)
        .execute(pool)
        .await?
        .rows_affected();

    let report = CleanupReport { sessions, verification_tokens };
    if report != CleanupReport::default() {
        tracing::info!(
            sessions = report.sessions,
            verification_tokens = report.verification_tokens,
            "Purged expired credentials"
        );
    }
    Ok(report)
}
