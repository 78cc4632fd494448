use anchor_lang::prelude::*;

/// PDA seeds
pub const VAULT_SEED: &[u8] = b"vault";
/// Vault authority PDA with seeds [VAULT_SEED, vault_id, VAULT_AUTHORITY_SEED]
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";
pub const LOCKUP_SEED: &[u8] = b"lockup";

/// Loss tolerance bounds
pub const MAX_BPS: u16 = 10000;

/// Lockup bounds (seconds)
pub const SECONDS_PER_DAY: i64 = 86400;
pub const MAX_LOCKUP_DURATION: i64 = 10 * 365 * SECONDS_PER_DAY;

/// Sentinel returned once the lockup no longer restricts an owner
pub const NO_WITHDRAW_LIMIT: u64 = u64::MAX;

/// Exchange rates are principal-per-receipt scaled by 10^EXCHANGE_RATE_PRECISION
pub const EXCHANGE_RATE_PRECISION: u8 = 18;
pub const EXCHANGE_RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// SPL stake pool program (mainnet)
pub const SPL_STAKE_POOL_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("SPoo1Ku8WFXoNDMHPsrGSTSG1Y47rzgn41SLUNakuHy");

/// StakePoolInstruction variant tags
pub const STAKE_POOL_DEPOSIT_SOL_TAG: u8 = 14;
pub const STAKE_POOL_WITHDRAW_SOL_TAG: u8 = 16;

/// Remaining-account counts consumed by each adapter
pub const STAKE_POOL_DEPOSIT_ACCOUNTS: usize = 6;
pub const STAKE_POOL_WITHDRAW_ACCOUNTS: usize = 8;
pub const BURN_POOL_ACCOUNTS: usize = 2;
