// crates/auditproof-ledger/src/registry.rs
//
// AuditorRegistry: the auditor admission state machine.
//
// Per address: Unknown -> Approved -> Revoked, and Revoked -> Approved on
// re-approval. Every mutation except profile updates and credential-count
// increments is restricted to the single admin principal. Increments are
// restricted to the registered credential ledger address.
//
// Successful mutations append ChainEvents, which the hosting chain drains
// into the transaction receipt.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use auditproof_core::auditor::Auditor;
use auditproof_core::chain::ChainEvent;
use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;

/// Owns all auditor admission state.
#[derive(Debug, Clone)]
pub struct AuditorRegistry {
    admin: Address,
    credential_ledger: Option<Address>,
    auditors: HashMap<Address, Auditor>,
    /// Every address ever approved, in first-approval order.
    approval_order: Vec<Address>,
    events: Vec<ChainEvent>,
}

impl AuditorRegistry {
    /// Deploy a registry administered by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            credential_ledger: None,
            auditors: HashMap::new(),
            approval_order: Vec::new(),
            events: Vec::new(),
        }
    }

    fn only_admin(&self, caller: &Address) -> Result<(), AuditProofError> {
        if *caller != self.admin {
            return Err(AuditProofError::Unauthorized(
                "Only admin can perform this action".to_string(),
            ));
        }
        Ok(())
    }

    fn approved_mut(&mut self, auditor: &Address) -> Result<&mut Auditor, AuditProofError> {
        match self.auditors.get_mut(auditor) {
            Some(record) if record.is_approved => Ok(record),
            _ => Err(AuditProofError::NotApproved(*auditor)),
        }
    }

    /// `approveAuditor(address)`.
    ///
    /// Counters are zeroed on first approval only; a re-approved auditor keeps
    /// its credential count, score, and profile.
    pub fn approve_auditor(
        &mut self,
        caller: &Address,
        auditor: Address,
        now: DateTime<Utc>,
    ) -> Result<(), AuditProofError> {
        self.only_admin(caller)?;
        if auditor.is_zero() {
            return Err(AuditProofError::Validation(
                "Invalid auditor address".to_string(),
            ));
        }

        if !self.auditors.contains_key(&auditor) {
            self.approval_order.push(auditor);
        }
        let record = self
            .auditors
            .entry(auditor)
            .or_insert_with(|| Auditor::unknown(auditor));
        if record.is_approved {
            return Err(AuditProofError::AlreadyApproved(auditor));
        }

        record.is_approved = true;
        record.approved_at = Some(now);
        self.events.push(ChainEvent::AuditorApproved { auditor, at: now });
        Ok(())
    }

    /// `revokeAuditor(address)`.
    pub fn revoke_auditor(
        &mut self,
        caller: &Address,
        auditor: Address,
        now: DateTime<Utc>,
    ) -> Result<(), AuditProofError> {
        self.only_admin(caller)?;
        let record = self.approved_mut(&auditor)?;
        record.is_approved = false;
        self.events.push(ChainEvent::AuditorRevoked { auditor, at: now });
        Ok(())
    }

    /// `updateAuditorProfile(string,string,string)`. The caller updates its
    /// own profile and must be currently approved.
    pub fn update_auditor_profile(
        &mut self,
        caller: &Address,
        github: &str,
        code4rena: &str,
        immunefi: &str,
    ) -> Result<(), AuditProofError> {
        let auditor = *caller;
        let record = self.approved_mut(&auditor)?;
        record.github_handle = github.to_string();
        record.code4rena_handle = code4rena.to_string();
        record.immunefi_handle = immunefi.to_string();
        self.events.push(ChainEvent::AuditorProfileUpdated {
            auditor,
            github: github.to_string(),
            code4rena: code4rena.to_string(),
            immunefi: immunefi.to_string(),
        });
        Ok(())
    }

    /// `updateCredibilityScore(address,uint256)`.
    pub fn update_credibility_score(
        &mut self,
        caller: &Address,
        auditor: Address,
        score: u64,
    ) -> Result<(), AuditProofError> {
        self.only_admin(caller)?;
        let record = self.approved_mut(&auditor)?;
        record.credibility_score = score;
        self.events
            .push(ChainEvent::CredibilityScoreUpdated { auditor, score });
        Ok(())
    }

    /// `incrementCredentialCount(address)`. Only the registered credential
    /// ledger may call this; until one is registered every call fails.
    pub fn increment_credential_count(
        &mut self,
        caller: &Address,
        auditor: Address,
    ) -> Result<(), AuditProofError> {
        match self.credential_ledger {
            Some(ledger) if ledger == *caller => {}
            _ => {
                return Err(AuditProofError::Unauthorized(
                    "Only the credential ledger can increment credential counts".to_string(),
                ))
            }
        }
        let record = self.approved_mut(&auditor)?;
        record.credential_count += 1;
        self.events.push(ChainEvent::CredentialIssued { auditor });
        Ok(())
    }

    /// `transferAdmin(address)`.
    pub fn transfer_admin(
        &mut self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), AuditProofError> {
        self.only_admin(caller)?;
        if new_admin.is_zero() {
            return Err(AuditProofError::Validation(
                "Invalid admin address".to_string(),
            ));
        }
        let from = self.admin;
        self.admin = new_admin;
        self.events.push(ChainEvent::AdminTransferred {
            from,
            to: new_admin,
        });
        Ok(())
    }

    /// `setCredentialLedger(address)`: register the only address allowed to
    /// increment credential counts.
    pub fn set_credential_ledger(
        &mut self,
        caller: &Address,
        ledger: Address,
    ) -> Result<(), AuditProofError> {
        self.only_admin(caller)?;
        if ledger.is_zero() {
            return Err(AuditProofError::Validation(
                "Invalid ledger address".to_string(),
            ));
        }
        self.credential_ledger = Some(ledger);
        self.events.push(ChainEvent::CredentialLedgerSet { ledger });
        Ok(())
    }

    /// `getAuditorInfo(address)`. Unknown addresses yield an unapproved,
    /// zeroed record.
    pub fn get_auditor_info(&self, auditor: &Address) -> Auditor {
        self.auditors
            .get(auditor)
            .cloned()
            .unwrap_or_else(|| Auditor::unknown(*auditor))
    }

    /// `getAllAuditors()`: every address ever approved, revoked ones included.
    pub fn get_all_auditors(&self) -> Vec<Address> {
        self.approval_order.clone()
    }

    /// `getApprovedAuditorCount()`.
    pub fn get_approved_auditor_count(&self) -> usize {
        self.auditors.values().filter(|a| a.is_approved).count()
    }

    /// `isApprovedAuditor(address)`.
    pub fn is_approved_auditor(&self, auditor: &Address) -> bool {
        self.auditors
            .get(auditor)
            .map(|a| a.is_approved)
            .unwrap_or(false)
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn credential_ledger(&self) -> Option<Address> {
        self.credential_ledger
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ChainEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address([0xad; 20]);
    const LEDGER: Address = Address([0x1e; 20]);
    const AUDITOR1: Address = Address([0xa1; 20]);
    const AUDITOR2: Address = Address([0xa2; 20]);
    const NON_ADMIN: Address = Address([0x99; 20]);

    fn registry() -> AuditorRegistry {
        AuditorRegistry::new(ADMIN)
    }

    #[test]
    fn test_admin_is_deployer() {
        assert_eq!(registry().admin(), ADMIN);
    }

    #[test]
    fn test_approve_auditor() {
        let mut reg = registry();
        let now = Utc::now();
        reg.approve_auditor(&ADMIN, AUDITOR1, now).unwrap();
        assert!(reg.is_approved_auditor(&AUDITOR1));
        assert_eq!(
            reg.drain_events(),
            vec![ChainEvent::AuditorApproved {
                auditor: AUDITOR1,
                at: now
            }]
        );
    }

    #[test]
    fn test_approve_rejects_non_admin_zero_and_duplicate() {
        let mut reg = registry();
        let now = Utc::now();
        assert!(matches!(
            reg.approve_auditor(&NON_ADMIN, AUDITOR1, now),
            Err(AuditProofError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.approve_auditor(&ADMIN, Address::ZERO, now),
            Err(AuditProofError::Validation(_))
        ));
        reg.approve_auditor(&ADMIN, AUDITOR1, now).unwrap();
        assert!(matches!(
            reg.approve_auditor(&ADMIN, AUDITOR1, now),
            Err(AuditProofError::AlreadyApproved(a)) if a == AUDITOR1
        ));
        assert!(reg.is_approved_auditor(&AUDITOR1));
    }

    #[test]
    fn test_revoke_auditor() {
        let mut reg = registry();
        let now = Utc::now();
        reg.approve_auditor(&ADMIN, AUDITOR1, now).unwrap();

        assert!(matches!(
            reg.revoke_auditor(&NON_ADMIN, AUDITOR1, now),
            Err(AuditProofError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.revoke_auditor(&ADMIN, AUDITOR2, now),
            Err(AuditProofError::NotApproved(_))
        ));

        reg.revoke_auditor(&ADMIN, AUDITOR1, now).unwrap();
        assert!(!reg.is_approved_auditor(&AUDITOR1));
        assert!(matches!(
            reg.revoke_auditor(&ADMIN, AUDITOR1, now),
            Err(AuditProofError::NotApproved(_))
        ));
    }

    #[test]
    fn test_profile_update_is_self_service_for_approved_auditors() {
        let mut reg = registry();
        reg.approve_auditor(&ADMIN, AUDITOR1, Utc::now()).unwrap();

        reg.update_auditor_profile(&AUDITOR1, "auditor1", "auditor1_c4", "auditor1_if")
            .unwrap();
        let info = reg.get_auditor_info(&AUDITOR1);
        assert_eq!(info.github_handle, "auditor1");
        assert_eq!(info.code4rena_handle, "auditor1_c4");
        assert_eq!(info.immunefi_handle, "auditor1_if");

        assert!(matches!(
            reg.update_auditor_profile(&AUDITOR2, "test", "test", "test"),
            Err(AuditProofError::NotApproved(_))
        ));
    }

    #[test]
    fn test_credibility_score_requires_admin_and_approval() {
        let mut reg = registry();
        reg.approve_auditor(&ADMIN, AUDITOR1, Utc::now()).unwrap();

        reg.update_credibility_score(&ADMIN, AUDITOR1, 250).unwrap();
        assert_eq!(reg.get_auditor_info(&AUDITOR1).credibility_score, 250);

        assert!(matches!(
            reg.update_credibility_score(&NON_ADMIN, AUDITOR1, 250),
            Err(AuditProofError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.update_credibility_score(&ADMIN, AUDITOR2, 250),
            Err(AuditProofError::NotApproved(_))
        ));
    }

    #[test]
    fn test_only_registered_ledger_increments() {
        let mut reg = registry();
        reg.approve_auditor(&ADMIN, AUDITOR1, Utc::now()).unwrap();

        // No ledger registered yet: even the admin is refused.
        assert!(matches!(
            reg.increment_credential_count(&ADMIN, AUDITOR1),
            Err(AuditProofError::Unauthorized(_))
        ));

        reg.set_credential_ledger(&ADMIN, LEDGER).unwrap();
        assert!(matches!(
            reg.increment_credential_count(&NON_ADMIN, AUDITOR1),
            Err(AuditProofError::Unauthorized(_))
        ));
        reg.increment_credential_count(&LEDGER, AUDITOR1).unwrap();
        assert_eq!(reg.get_auditor_info(&AUDITOR1).credential_count, 1);

        assert!(matches!(
            reg.increment_credential_count(&LEDGER, AUDITOR2),
            Err(AuditProofError::NotApproved(_))
        ));
    }

    #[test]
    fn test_set_credential_ledger_rejects_non_admin_and_zero() {
        let mut reg = registry();
        assert!(matches!(
            reg.set_credential_ledger(&NON_ADMIN, LEDGER),
            Err(AuditProofError::Unauthorized(_))
        ));
        assert!(matches!(
            reg.set_credential_ledger(&ADMIN, Address::ZERO),
            Err(AuditProofError::Validation(_))
        ));
        assert_eq!(reg.credential_ledger(), None);
    }

    #[test]
    fn test_reapproval_keeps_counters_and_order() {
        let mut reg = registry();
        let now = Utc::now();
        reg.set_credential_ledger(&ADMIN, LEDGER).unwrap();
        reg.approve_auditor(&ADMIN, AUDITOR1, now).unwrap();
        reg.approve_auditor(&ADMIN, AUDITOR2, now).unwrap();
        reg.increment_credential_count(&LEDGER, AUDITOR1).unwrap();
        reg.update_credibility_score(&ADMIN, AUDITOR1, 40).unwrap();

        reg.revoke_auditor(&ADMIN, AUDITOR1, now).unwrap();
        assert_eq!(reg.get_approved_auditor_count(), 1);
        reg.approve_auditor(&ADMIN, AUDITOR1, now).unwrap();

        let info = reg.get_auditor_info(&AUDITOR1);
        assert_eq!(info.credential_count, 1);
        assert_eq!(info.credibility_score, 40);
        assert_eq!(reg.get_all_auditors(), vec![AUDITOR1, AUDITOR2]);
        assert_eq!(reg.get_approved_auditor_count(), 2);
    }

    #[test]
    fn test_transfer_admin() {
        let mut reg = registry();
        assert!(matches!(
            reg.transfer_admin(&ADMIN, Address::ZERO),
            Err(AuditProofError::Validation(_))
        ));
        assert!(matches!(
            reg.transfer_admin(&NON_ADMIN, NON_ADMIN),
            Err(AuditProofError::Unauthorized(_))
        ));
        reg.transfer_admin(&ADMIN, NON_ADMIN).unwrap();
        assert_eq!(reg.admin(), NON_ADMIN);
        assert!(matches!(
            reg.approve_auditor(&ADMIN, AUDITOR1, Utc::now()),
            Err(AuditProofError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unknown_auditor_info_is_zeroed() {
        let info = registry().get_auditor_info(&AUDITOR1);
        assert!(!info.is_approved);
        assert_eq!(info.credential_count, 0);
        assert_eq!(info.approved_at, None);
    }
}
