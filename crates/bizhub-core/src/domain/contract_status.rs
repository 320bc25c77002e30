// ============================================================================
// BizHub Core - Contract Status
// File: crates/bizhub-core/src/domain/contract_status.rs
// Description: Contract lifecycle states and the allowed transition table
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Active,
    Pending,
    RenewalInProgress,
    Expired,
    Terminated,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 6] = [
        ContractStatus::Draft,
        ContractStatus::Active,
        ContractStatus::Pending,
        ContractStatus::RenewalInProgress,
        ContractStatus::Expired,
        ContractStatus::Terminated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Pending => "PENDING",
            ContractStatus::RenewalInProgress => "RENEWAL_IN_PROGRESS",
            ContractStatus::Expired => "EXPIRED",
            ContractStatus::Terminated => "TERMINATED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "DRAFT" => Some(ContractStatus::Draft),
            "ACTIVE" => Some(ContractStatus::Active),
            "PENDING" => Some(ContractStatus::Pending),
            "RENEWAL_IN_PROGRESS" => Some(ContractStatus::RenewalInProgress),
            "EXPIRED" => Some(ContractStatus::Expired),
            "TERMINATED" => Some(ContractStatus::Terminated),
            _ => None,
        }
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(&self) -> &'static [ContractStatus] {
        use ContractStatus::*;
        match self {
            Draft => &[Active, Terminated],
            Active => &[RenewalInProgress, Expired, Terminated],
            Pending => &[Active, RenewalInProgress, Terminated],
            RenewalInProgress => &[Active, Expired, Terminated],
            Expired => &[RenewalInProgress, Terminated],
            Terminated => &[],
        }
    }

    pub fn can_transition_to(&self, to: ContractStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn validate_transition(&self, to: ContractStatus) -> Result<(), DomainError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(self.as_str(), to.as_str()))
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Statuses a contract may be created with.
    pub fn is_initial(&self) -> bool {
        matches!(self, ContractStatus::Draft | ContractStatus::Active | ContractStatus::Pending)
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl Default for ContractStatus {
    fn default() -> Self {
        ContractStatus::Draft
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContractStatus::*;

    #[test]
    fn test_transition_table() {
        let expected: [(ContractStatus, &[ContractStatus]); 6] = [
            (Draft, &[Active, Terminated]),
            (Active, &[RenewalInProgress, Expired, Terminated]),
            (Pending, &[Active, RenewalInProgress, Terminated]),
            (RenewalInProgress, &[Active, Expired, Terminated]),
            (Expired, &[RenewalInProgress, Terminated]),
            (Terminated, &[]),
        ];

        for (from, targets) in expected {
            for to in ContractStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    targets.contains(&to),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in ContractStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_only_terminated_is_terminal() {
        let terminal: Vec<_> = ContractStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Terminated]);
    }

    #[test]
    fn test_validate_transition_error_message() {
        let err = Draft.validate_transition(Expired).unwrap_err();
        assert_eq!(err.to_string(), "Cannot change status from DRAFT to EXPIRED");

        let err = Terminated.validate_transition(RenewalInProgress).unwrap_err();
        assert_eq!(err.to_string(), "Cannot change status from TERMINATED to RENEWAL IN PROGRESS");
    }

    #[test]
    fn test_parse_round_trip() {
        for status in ContractStatus::ALL {
            assert_eq!(ContractStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ContractStatus::from_str("renewal in progress"), Some(RenewalInProgress));
        assert_eq!(ContractStatus::from_str("RENEWED"), None);
    }

    #[test]
    fn test_serde_wire_form() {
        let json = serde_json::to_string(&RenewalInProgress).unwrap();
        assert_eq!(json, "\"RENEWAL_IN_PROGRESS\"");
    }
}
