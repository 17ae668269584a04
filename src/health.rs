use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    fn with_status(status: HealthStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            details: None,
            duration_ms: None,
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(HealthStatus::Healthy, None)
    }

    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::healthy()
        }
    }

    pub fn degraded(message: String) -> Self {
        Self::with_status(HealthStatus::Degraded, Some(message))
    }

    pub fn unhealthy(message: String) -> Self {
        Self::with_status(HealthStatus::Unhealthy, Some(message))
    }

    pub fn unhealthy_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::unhealthy(message)
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// The name of this health check component
    fn name(&self) -> &str;

    /// Perform the health check
    async fn check(&self) -> HealthCheckResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheckResult>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthSummary {
    pub total_checks: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub total_duration_ms: u64,
}

/// Registry of component health checks
pub struct HealthService {
    checkers: Arc<RwLock<HashMap<String, Arc<dyn HealthChecker>>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            checkers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        self.checkers.write().await.insert(name, checker);
    }

    pub async fn registered_checkers(&self) -> Vec<String> {
        self.checkers.read().await.keys().cloned().collect()
    }

    /// Run the checks selected by `filter`.
    ///
    /// `Some("all")` runs every check, `Some(name)` runs one, `None` runs none
    /// and only reports that the process is up.
    pub async fn check_health(&self, filter: Option<&str>) -> HealthResponse {
        let checkers = self.checkers.read().await;
        let selected: Vec<_> = match filter {
            Some("all") => checkers.iter().collect(),
            Some(specific) => checkers
                .iter()
                .filter(|(name, _)| name.as_str() == specific)
                .collect(),
            None => Vec::new(),
        };

        let mut checks = HashMap::new();
        let mut total_duration_ms = 0u64;
        for (name, checker) in selected {
            let start = Instant::now();
            let result = checker.check().await;
            let duration = start.elapsed().as_millis() as u64;
            total_duration_ms += duration;
            checks.insert(name.clone(), result.with_duration(duration));
        }

        let count = |status: HealthStatus| checks.values().filter(|r| r.status == status).count();
        let healthy_count = count(HealthStatus::Healthy);
        let degraded_count = count(HealthStatus::Degraded);
        let unhealthy_count = count(HealthStatus::Unhealthy);

        // Worst status wins
        let status = if unhealthy_count > 0 {
            HealthStatus::Unhealthy
        } else if degraded_count > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthResponse {
            status,
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: HealthSummary {
                total_checks: checks.len(),
                healthy_count,
                degraded_count,
                unhealthy_count,
                total_duration_ms,
            },
            checks,
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
