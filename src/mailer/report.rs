use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::recipients::EmailAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Result of the single send attempt for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeliveryOutcome {
    #[serde(rename = "email")]
    pub address: EmailAddress,
    pub status: DeliveryStatus,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(address: EmailAddress) -> Self {
        Self {
            address,
            status: DeliveryStatus::Sent,
            error_detail: None,
        }
    }

    pub fn failed(address: EmailAddress, detail: impl Into<String>) -> Self {
        Self {
            address,
            status: DeliveryStatus::Failed,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Per-recipient outcomes in recipient order, with derived counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    outcomes: Vec<DeliveryOutcome>,
    success_count: usize,
    failure_count: usize,
}

impl DeliveryReport {
    pub fn from_outcomes(outcomes: Vec<DeliveryOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.is_sent()).count();
        let failure_count = outcomes.len() - success_count;
        Self {
            outcomes,
            success_count,
            failure_count,
        }
    }

    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<DeliveryOutcome> {
        self.outcomes
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_sent())
    }

    /// Every recipient failed. An empty report is not a total failure.
    pub fn is_total_failure(&self) -> bool {
        !self.outcomes.is_empty() && self.success_count == 0
    }

    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && self.failure_count > 0
    }

    /// Human-readable summary distinguishing full, partial and total failure.
    pub fn summary(&self) -> String {
        if self.failure_count == 0 {
            format!(
                "Successfully sent emails to {} recipient(s)",
                self.success_count
            )
        } else if self.success_count > 0 {
            format!(
                "Sent to {} recipient(s), failed to send to {} recipient(s)",
                self.success_count, self.failure_count
            )
        } else {
            format!(
                "Failed to send emails to all {} recipient(s)",
                self.failure_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(raw: &str) -> EmailAddress {
        EmailAddress::parse(raw).unwrap()
    }

    #[test]
    fn test_counts_and_partial_summary() {
        let report = DeliveryReport::from_outcomes(vec![
            DeliveryOutcome::sent(address("a@x.com")),
            DeliveryOutcome::failed(address("b@y.com"), "mailbox unavailable"),
            DeliveryOutcome::sent(address("c@z.com")),
        ]);

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(report.is_partial());
        assert!(!report.is_total_failure());
        assert_eq!(
            report.summary(),
            "Sent to 2 recipient(s), failed to send to 1 recipient(s)"
        );
        assert_eq!(report.failures().next().unwrap().address.as_str(), "b@y.com");
    }

    #[test]
    fn test_total_failure() {
        let report = DeliveryReport::from_outcomes(vec![
            DeliveryOutcome::failed(address("a@x.com"), "refused"),
            DeliveryOutcome::failed(address("b@y.com"), "refused"),
        ]);
        assert!(report.is_total_failure());
        assert_eq!(report.summary(), "Failed to send emails to all 2 recipient(s)");
    }

    #[test]
    fn test_full_success_summary() {
        let report = DeliveryReport::from_outcomes(vec![DeliveryOutcome::sent(address("a@x.com"))]);
        assert!(!report.is_partial());
        assert_eq!(report.summary(), "Successfully sent emails to 1 recipient(s)");
    }

    #[test]
    fn test_outcome_wire_shape() {
        let sent = serde_json::to_value(DeliveryOutcome::sent(address("a@x.com"))).unwrap();
        assert_eq!(sent, serde_json::json!({"email": "a@x.com", "status": "sent"}));

        let failed =
            serde_json::to_value(DeliveryOutcome::failed(address("b@y.com"), "refused")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"email": "b@y.com", "status": "failed", "error": "refused"})
        );
    }
}
