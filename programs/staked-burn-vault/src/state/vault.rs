use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

#[account]
#[derive(Default)]
pub struct VaultConfig {
    /// Unique vault identifier
    pub vault_id: [u8; 32],

    /// Authority allowed to toggle burn conversion
    pub management: Pubkey,

    /// Receipt token minted by the yield source (stake pool mint)
    pub receipt_mint: Pubkey,

    /// Burn-receipt token minted by the burn pool
    pub burn_receipt_mint: Pubkey,

    /// Yield source program and pool
    pub stake_program: Pubkey,
    pub stake_pool: Pubkey,

    /// Burn pool program and pool state
    pub burn_program: Pubkey,
    pub burn_pool: Pubkey,

    /// Share-accounting engine program and its state account
    pub accounting_program: Pubkey,
    pub accounting_state: Pubkey,

    /// Vault-authority-owned ATAs for the receipt and burn-receipt tokens
    pub receipt_custody: Pubkey,
    pub burn_custody: Pubkey,

    /// Seconds a depositor waits after their latest deposit, fixed at init
    pub lockup_duration: i64,

    /// When false, exits forward unstaked lamports instead of burn receipts
    pub burn_conversion_enabled: bool,

    /// Set for the duration of a deposit/withdraw/redeem
    pub reentrancy_locked: bool,

    /// Bump seeds for PDA derivation
    pub bump: u8,
    pub authority_bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl VaultConfig {
    pub const LEN: usize = 8 + // discriminator
        32 + // vault_id
        32 + // management
        32 + // receipt_mint
        32 + // burn_receipt_mint
        32 + // stake_program
        32 + // stake_pool
        32 + // burn_program
        32 + // burn_pool
        32 + // accounting_program
        32 + // accounting_state
        32 + // receipt_custody
        32 + // burn_custody
        8 + // lockup_duration
        1 + // burn_conversion_enabled
        1 + // reentrancy_locked
        1 + // bump
        1 + // authority_bump
        32; // _reserved

    pub fn validate_lockup_duration(lockup_duration: i64) -> Result<()> {
        require!(
            lockup_duration > 0 && lockup_duration <= MAX_LOCKUP_DURATION,
            VaultError::InvalidLockupDuration
        );
        Ok(())
    }

    pub fn acquire_lock(&mut self) -> Result<()> {
        require!(!self.reentrancy_locked, VaultError::ReentrantCall);
        self.reentrancy_locked = true;
        Ok(())
    }

    pub fn release_lock(&mut self) {
        self.reentrancy_locked = false;
    }

    pub fn require_management(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.management, VaultError::Unauthorized);
        Ok(())
    }
}
