//! Periodic housekeeping that runs next to the HTTP server.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::log_error;
use crate::model::ModelManager;
use crate::model::entity::{LoginToken, Proposal};
use crate::web::AuthenticatedUser;

pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_tokens: u64,
    pub closed_proposals: u64,
}

/// One maintenance pass. A failing step is logged and does not stop the others.
pub async fn run_maintenance(mm: &ModelManager) -> MaintenanceReport {
    let actor = AuthenticatedUser::admin();
    let mut report = MaintenanceReport::default();

    match LoginToken::cleanup_expired(mm, &actor).await {
        Ok(n) => report.expired_tokens = n,
        Err(e) => log_error(&e),
    }
    match Proposal::close_expired(mm, &actor).await {
        Ok(n) => report.closed_proposals = n,
        Err(e) => log_error(&e),
    }

    if report != MaintenanceReport::default() {
        tracing::info!(
            expired_tokens = report.expired_tokens,
            closed_proposals = report.closed_proposals,
            "maintenance pass"
        );
    }
    report
}

pub async fn maintenance_worker(mm: ModelManager, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                run_maintenance(&mm).await;
            }
        }
    }

    tracing::debug!("maintenance worker stopped");
}
