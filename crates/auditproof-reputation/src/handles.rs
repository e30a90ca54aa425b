// crates/auditproof-reputation/src/handles.rs
//
// HandleReputation: the default credibility scorer.
//
// Scores an auditor from the public handles it registered and the number of
// credentials already credited to it. Each signal contributes a fixed weight;
// the credential term saturates at `max_credential_points`.

use async_trait::async_trait;

use auditproof_core::error::AuditProofError;

use crate::{AuditorProfile, Reputation, ReputationSource, Signal};

/// Per-signal weights for [`HandleReputation`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandleWeights {
    pub github: u64,
    pub code4rena: u64,
    pub immunefi: u64,
    pub per_credential: u64,
    pub max_credential_points: u64,
}

impl Default for HandleWeights {
    fn default() -> Self {
        Self {
            github: 30,
            code4rena: 40,
            immunefi: 40,
            per_credential: 5,
            max_credential_points: 50,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandleReputation {
    weights: HandleWeights,
}

impl HandleReputation {
    pub fn new(weights: HandleWeights) -> Self {
        Self { weights }
    }

    /// Score a profile synchronously.
    pub fn score(&self, profile: &AuditorProfile) -> Reputation {
        let mut signals = Vec::new();

        let handles = [
            ("github", &profile.github_handle, self.weights.github),
            ("code4rena", &profile.code4rena_handle, self.weights.code4rena),
            ("immunefi", &profile.immunefi_handle, self.weights.immunefi),
        ];
        for (source, handle, weight) in handles {
            let handle = handle.trim();
            if !handle.is_empty() {
                signals.push(Signal {
                    source: source.to_string(),
                    detail: handle.to_string(),
                    points: weight,
                });
            }
        }

        if profile.credential_count > 0 {
            let points = profile
                .credential_count
                .saturating_mul(self.weights.per_credential)
                .min(self.weights.max_credential_points);
            signals.push(Signal {
                source: "credentials".to_string(),
                detail: profile.credential_count.to_string(),
                points,
            });
        }

        let credibility_score = signals.iter().map(|s| s.points).sum();
        Reputation {
            address: profile.address,
            credibility_score,
            signals,
        }
    }
}

#[async_trait]
impl ReputationSource for HandleReputation {
    async fn reputation(&self, profile: &AuditorProfile) -> Result<Reputation, AuditProofError> {
        Ok(self.score(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditproof_core::types::Address;

    fn profile(github: &str, c4: &str, immunefi: &str, credentials: u64) -> AuditorProfile {
        AuditorProfile {
            address: Address([1u8; 20]),
            github_handle: github.to_string(),
            code4rena_handle: c4.to_string(),
            immunefi_handle: immunefi.to_string(),
            credential_count: credentials,
        }
    }

    #[test]
    fn test_no_signals_scores_zero() {
        let rep = HandleReputation::default().score(&profile("", "  ", "", 0));
        assert_eq!(rep.credibility_score, 0);
        assert!(rep.signals.is_empty());
    }

    #[test]
    fn test_handles_add_their_weights() {
        let rep = HandleReputation::default().score(&profile("alice", "alice_c4", "", 0));
        assert_eq!(rep.credibility_score, 70);
        assert_eq!(rep.signals.len(), 2);
    }

    #[test]
    fn test_credential_points_saturate() {
        let scorer = HandleReputation::default();
        assert_eq!(scorer.score(&profile("", "", "", 3)).credibility_score, 15);
        assert_eq!(scorer.score(&profile("", "", "", 1_000)).credibility_score, 50);
    }

    #[tokio::test]
    async fn test_async_source_matches_sync_score() {
        let scorer = HandleReputation::default();
        let p = profile("a", "b", "c", 2);
        let rep = scorer.reputation(&p).await.unwrap();
        assert_eq!(rep, scorer.score(&p));
        assert_eq!(rep.credibility_score, 30 + 40 + 40 + 10);
    }
}
