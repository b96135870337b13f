use chrono::Duration;
use serde::{Deserialize, Serialize};

/// protocol-wide settings agreed at deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// allowance past an installment's due time before the loan becomes
    /// eligible for a default claim
    pub grace_period_secs: i64,
}

impl ProtocolConfig {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period_secs: grace_period.num_seconds(),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::seconds(self.grace_period_secs)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        // one day of grace past each due date
        Self {
            grace_period_secs: 86_400,
        }
    }
}
