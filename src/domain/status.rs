use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status of an achievement reference.
///
/// The lifecycle is strictly monotonic:
/// `draft -> submitted -> verified | rejected`, with `draft -> deleted` as the
/// only other edge. `verified`, `rejected` and `deleted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStatus {
    Draft,
    Submitted,
    Verified,
    Rejected,
    Deleted,
}

impl AchievementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementStatus::Draft => "draft",
            AchievementStatus::Submitted => "submitted",
            AchievementStatus::Verified => "verified",
            AchievementStatus::Rejected => "rejected",
            AchievementStatus::Deleted => "deleted",
        }
    }

    /// Whether the state machine permits an edge from `self` to `next`.
    pub fn can_transition_to(&self, next: AchievementStatus) -> bool {
        use AchievementStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted) | (Draft, Deleted) | (Submitted, Verified) | (Submitted, Rejected)
        )
    }

}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown achievement status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AchievementStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AchievementStatus::Draft),
            "submitted" => Ok(AchievementStatus::Submitted),
            "verified" => Ok(AchievementStatus::Verified),
            "rejected" => Ok(AchievementStatus::Rejected),
            "deleted" => Ok(AchievementStatus::Deleted),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges_only() {
        use AchievementStatus::*;

        assert!(Draft.can_transition_to(Submitted));
        assert!(Draft.can_transition_to(Deleted));
        assert!(Submitted.can_transition_to(Verified));
        assert!(Submitted.can_transition_to(Rejected));

        // No skipping intermediate states, no reopening terminals
        assert!(!Draft.can_transition_to(Verified));
        assert!(!Draft.can_transition_to(Rejected));
        assert!(!Submitted.can_transition_to(Draft));
        assert!(!Submitted.can_transition_to(Deleted));
        assert!(!Verified.can_transition_to(Submitted));
        assert!(!Rejected.can_transition_to(Draft));
        assert!(!Rejected.can_transition_to(Submitted));
        assert!(!Deleted.can_transition_to(Draft));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use AchievementStatus::*;
        for terminal in [Verified, Rejected, Deleted] {
            for next in [Draft, Submitted, Verified, Rejected, Deleted] {
                assert!(!terminal.can_transition_to(next), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn parses_and_prints_lowercase() {
        for s in ["draft", "submitted", "verified", "rejected", "deleted"] {
            let status: AchievementStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("archived".parse::<AchievementStatus>().is_err());
    }
}
