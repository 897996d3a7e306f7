use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

impl HealthResponse {
    pub fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn healthy(start: Instant) -> Self {
        DependencyStatus::Healthy {
            status: "healthy".to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn unhealthy(error: impl ToString) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.to_string(),
        }
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// A failing critical dependency makes the whole service unhealthy;
    /// anything else only degrades it.
    fn critical(&self) -> bool {
        false
    }

    async fn check(&self) -> DependencyStatus;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn critical(&self) -> bool {
        true
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

/// Reachability of the confirmation webhook. Any HTTP answer counts as up.
pub struct WebhookChecker {
    client: reqwest::Client,
    url: String,
}

impl WebhookChecker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl DependencyChecker for WebhookChecker {
    fn name(&self) -> &'static str {
        "notify_webhook"
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.client.head(&self.url).send().await {
            Ok(_) => DependencyStatus::healthy(start),
            Err(e) => DependencyStatus::unhealthy(e),
        }
    }
}

pub async fn check_health(
    checkers: &[Arc<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let results = join_all(checkers.iter().map(|checker| async move {
        let status = timeout(CHECK_TIMEOUT, checker.check())
            .await
            .unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));
        (checker.name(), checker.critical(), status)
    }))
    .await;

    let overall_status = determine_overall_status(
        results
            .iter()
            .map(|(_, critical, status)| (*critical, status)),
    );

    HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies: results
            .into_iter()
            .map(|(name, _, status)| (name.to_string(), status))
            .collect(),
    }
}

fn determine_overall_status<'a>(
    statuses: impl Iterator<Item = (bool, &'a DependencyStatus)>,
) -> String {
    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;

    for (critical, status) in statuses {
        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if critical {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
    }

    if has_critical_failure {
        "unhealthy".to_string()
    } else if has_non_critical_failure {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}
