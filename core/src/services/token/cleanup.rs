//! Background maintenance of revocation records, persisted tokens, idle
//! sessions and the permission cache
//!
//! Each concern runs on its own timer so a slow storage sweep never delays
//! the in-memory ones. All tasks stop when the scheduler is shut down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use wd_shared::config::{AuthConfig, PermissionCacheConfig};

use crate::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};

use super::service::TokenService;

/// Intervals of the periodic cleanup tasks
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Revocation record sweep
    pub revocation_interval: Duration,
    /// Expired token deletion and idle session reaping
    pub storage_interval: Duration,
    /// Permission cache cleanup
    pub permission_cache_interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self::new(&AuthConfig::default(), &PermissionCacheConfig::default())
    }
}

impl CleanupConfig {
    pub fn new(auth: &AuthConfig, cache: &PermissionCacheConfig) -> Self {
        Self {
            revocation_interval: Duration::from_secs(auth.revocation.sweep_interval),
            storage_interval: Duration::from_secs(auth.session.sweep_interval),
            permission_cache_interval: Duration::from_secs(cache.cleanup_interval),
        }
    }
}

/// Result of one storage cleanup cycle
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of expired token records deleted
    pub expired_tokens_deleted: usize,
    /// Number of sessions deactivated for inactivity
    pub idle_sessions_reaped: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get total number of items cleaned up
    pub fn total_cleaned(&self) -> usize {
        self.expired_tokens_deleted + self.idle_sessions_reaped
    }
}

impl<T, S, U, P> TokenService<T, S, U, P>
where
    T: TokenRepository,
    S: SessionRepository,
    U: PrincipalRepository,
    P: PermissionRepository,
{
    /// Delete expired token records and reap idle sessions
    ///
    /// A failure in one step is recorded and does not skip the other; the
    /// next cycle retries both.
    pub async fn run_storage_cleanup(&self) -> CleanupResult {
        let mut result = CleanupResult::default();

        match self.delete_expired_tokens().await {
            Ok(count) => result.expired_tokens_deleted = count,
            Err(e) => {
                error!(error = %e, "failed to delete expired tokens");
                result.errors.push(format!("Token cleanup error: {}", e));
            }
        }

        match self.reap_idle_sessions().await {
            Ok(count) => result.idle_sessions_reaped = count,
            Err(e) => {
                error!(error = %e, "failed to reap idle sessions");
                result.errors.push(format!("Session cleanup error: {}", e));
            }
        }

        info!(
            expired_tokens = result.expired_tokens_deleted,
            idle_sessions = result.idle_sessions_reaped,
            "storage cleanup completed"
        );
        result
    }

}

/// Owner of the periodic cleanup tasks
pub struct CleanupScheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl CleanupScheduler {
    /// Spawn the cleanup tasks on the current tokio runtime
    pub fn start<T, S, U, P>(service: Arc<TokenService<T, S, U, P>>, config: CleanupConfig) -> Self
    where
        T: TokenRepository + 'static,
        S: SessionRepository + 'static,
        U: PrincipalRepository + 'static,
        P: PermissionRepository + 'static,
    {
        let (shutdown, stop) = watch::channel(false);
        let mut handles = Vec::with_capacity(3);

        let svc = Arc::clone(&service);
        handles.push(spawn_periodic(
            "revocation_sweep",
            config.revocation_interval,
            stop.clone(),
            move || {
                let svc = Arc::clone(&svc);
                async move {
                    let removed = svc.sweep_revocations();
                    if removed > 0 {
                        debug!(removed, remaining = svc.blacklisted_count(), "revocation sweep");
                    }
                }
            },
        ));

        let svc = Arc::clone(&service);
        handles.push(spawn_periodic(
            "storage_cleanup",
            config.storage_interval,
            stop.clone(),
            move || {
                let svc = Arc::clone(&svc);
                async move {
                    let result = svc.run_storage_cleanup().await;
                    if !result.is_success() {
                        warn!(errors = ?result.errors, "storage cleanup completed with errors");
                    }
                }
            },
        ));

        let svc = service;
        handles.push(spawn_periodic(
            "permission_cache_cleanup",
            config.permission_cache_interval,
            stop,
            move || {
                let svc = Arc::clone(&svc);
                async move {
                    let removed = svc.cleanup_permission_cache();
                    let stats = svc.permission_cache_stats();
                    info!(
                        removed,
                        entries = stats.entries,
                        hits = stats.hits,
                        misses = stats.misses,
                        stale_hits = stats.stale_hits,
                        evictions = stats.evictions,
                        blacklisted = svc.blacklisted_count(),
                        "permission cache cleanup"
                    );
                }
            },
        ));

        info!(?config, "cleanup scheduler started");
        Self { shutdown, handles }
    }

    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal every task to stop and wait for all of them to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "cleanup task ended abnormally");
            }
        }
        info!("cleanup scheduler stopped");
    }
}

fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut stop: watch::Receiver<bool>,
    mut task: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let period = period.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; skip it
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => task().await,
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!(task = name, "cleanup task stopped");
    })
}
