//! Health endpoint body

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// In-process token state reported by `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,

    /// Live records in the revocation blacklist
    pub blacklisted_tokens: usize,

    /// Principals currently held in the permission cache
    pub cached_principals: usize,

    pub timestamp: DateTime<Utc>,

    /// Server version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serializes_lowercase() {
        let response = HealthResponse {
            status: HealthStatus::Degraded,
            blacklisted_tokens: 3,
            cached_principals: 7,
            timestamp: Utc::now(),
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["blacklisted_tokens"], 3);
    }
}
