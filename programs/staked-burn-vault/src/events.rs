use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault_id: [u8; 32],
    pub management: Pubkey,
    pub lockup_duration: i64,
    pub stake_pool: Pubkey,
    pub burn_pool: Pubkey,
    pub accounting_state: Pubkey,
    pub timestamp: i64,
}

/// Raised once per non-privileged exit, after the proceeds were forwarded
#[event]
pub struct WithdrawalConverted {
    pub owner: Pubkey,
    pub assets_released: u64,
    pub shares_burned: u64,
}

#[event]
pub struct BurnConversionUpdated {
    pub vault_id: [u8; 32],
    pub enabled: bool,
    pub timestamp: i64,
}
