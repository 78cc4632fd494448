use anchor_lang::prelude::*;

use crate::constants::NO_WITHDRAW_LIMIT;

/// Per-depositor lockup record, keyed by the owner of the claim
#[account]
#[derive(Default)]
pub struct DepositorLockup {
    /// Associated vault
    pub vault: Pubkey,

    /// Depositor the record belongs to
    pub depositor: Pubkey,

    /// Timestamp of the latest deposit attributed to the depositor, 0 if none
    pub last_deposit_ts: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl DepositorLockup {
    pub const LEN: usize = 8 + // discriminator
        32 + // vault
        32 + // depositor
        8 + // last_deposit_ts
        1; // bump

    pub fn is_initialized(&self) -> bool {
        self.depositor != Pubkey::default()
    }

    /// Every deposit restarts the full lockup for the whole position.
    pub fn record_deposit(&mut self, now: i64) {
        self.last_deposit_ts = now;
    }

    pub fn has_deposited(&self) -> bool {
        self.last_deposit_ts != 0
    }

    pub fn unlocks_at(&self, lockup_duration: i64) -> Option<i64> {
        if !self.has_deposited() {
            return None;
        }
        Some(self.last_deposit_ts.saturating_add(lockup_duration))
    }

    pub fn is_withdraw_eligible(&self, now: i64, lockup_duration: i64) -> bool {
        match self.unlocks_at(lockup_duration) {
            Some(unlock_ts) => unlock_ts != i64::MAX && now >= unlock_ts,
            None => false,
        }
    }

    /// Zero while locked; otherwise no lockup-imposed cap, the engine's
    /// `max_withdraw` bounds the actual amount.
    pub fn available_withdraw_limit(&self, now: i64, lockup_duration: i64) -> u64 {
        if self.is_withdraw_eligible(now, lockup_duration) {
            NO_WITHDRAW_LIMIT
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKUP: i64 = 7 * 86400;
    const T0: i64 = 1_700_000_000;

    #[test]
    fn test_never_deposited_is_locked() {
        let record = DepositorLockup::default();
        assert!(!record.has_deposited());
        assert_eq!(record.unlocks_at(LOCKUP), None);
        assert!(!record.is_withdraw_eligible(i64::MAX - 1, LOCKUP));
        assert_eq!(record.available_withdraw_limit(T0, LOCKUP), 0);
    }

    #[test]
    fn test_lockup_boundary() {
        let mut record = DepositorLockup::default();
        record.record_deposit(T0);

        assert!(!record.is_withdraw_eligible(T0, LOCKUP));
        assert!(!record.is_withdraw_eligible(T0 + LOCKUP - 1, LOCKUP));
        assert!(record.is_withdraw_eligible(T0 + LOCKUP, LOCKUP));
        assert_eq!(record.available_withdraw_limit(T0 + LOCKUP - 1, LOCKUP), 0);
        assert_eq!(
            record.available_withdraw_limit(T0 + LOCKUP, LOCKUP),
            NO_WITHDRAW_LIMIT
        );
    }

    #[test]
    fn test_every_deposit_resets_lockup() {
        let mut record = DepositorLockup::default();
        record.record_deposit(T0);
        assert!(record.is_withdraw_eligible(T0 + LOCKUP, LOCKUP));

        // a late top-up relocks the entire position
        record.record_deposit(T0 + LOCKUP);
        assert_eq!(record.last_deposit_ts, T0 + LOCKUP);
        assert!(!record.is_withdraw_eligible(T0 + LOCKUP, LOCKUP));
        assert!(record.is_withdraw_eligible(T0 + 2 * LOCKUP, LOCKUP));
    }

    #[test]
    fn test_overflowing_unlock_never_reached() {
        let mut record = DepositorLockup::default();
        record.record_deposit(i64::MAX - 10);
        assert!(!record.is_withdraw_eligible(i64::MAX, LOCKUP));
    }
}
