use anchor_lang::prelude::*;

pub mod accounting_engine;
pub mod burn_converter;
pub mod constants;
pub mod cpi_support;
pub mod custody;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod orchestrator;
pub mod stake_adapter;
pub mod state;

#[cfg(test)]
mod mock;

use instructions::*;

declare_id!("BurnVau1t1111111111111111111111111111111111");

#[program]
pub mod staked_burn_vault {
    use super::*;

    /// Create the vault configuration and its custody token accounts
    pub fn initialize_vault(
        ctx: Context<InitializeVault>,
        vault_id: [u8; 32],
        management: Pubkey,
        lockup_duration: i64,
        stake_pool: Pubkey,
        burn_pool: Pubkey,
        accounting_state: Pubkey,
    ) -> Result<()> {
        instructions::initialize_vault(
            ctx,
            vault_id,
            management,
            lockup_duration,
            stake_pool,
            burn_pool,
            accounting_state,
        )
    }

    /// Stake `assets` lamports and credit engine shares to `receiver`
    pub fn deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
        assets: u64,
        receiver: Pubkey,
    ) -> Result<u64> {
        instructions::deposit(ctx, assets, receiver)
    }

    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
        assets: u64,
        receiver: Pubkey,
        owner: Pubkey,
    ) -> Result<u64> {
        instructions::withdraw(ctx, assets, receiver, owner, 0)
    }

    pub fn withdraw_with_loss<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
        assets: u64,
        receiver: Pubkey,
        owner: Pubkey,
        max_loss_bps: u16,
    ) -> Result<u64> {
        instructions::withdraw(ctx, assets, receiver, owner, max_loss_bps)
    }

    pub fn redeem<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
        shares: u64,
        receiver: Pubkey,
        owner: Pubkey,
    ) -> Result<u64> {
        instructions::redeem(ctx, shares, receiver, owner, constants::MAX_BPS)
    }

    pub fn redeem_with_loss<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
        shares: u64,
        receiver: Pubkey,
        owner: Pubkey,
        max_loss_bps: u16,
    ) -> Result<u64> {
        instructions::redeem(ctx, shares, receiver, owner, max_loss_bps)
    }

    /// Zero while `owner` is locked up, `u64::MAX` otherwise
    pub fn available_withdraw_limit<'info>(
        ctx: Context<'_, '_, 'info, 'info, LockupView<'info>>,
        owner: Pubkey,
    ) -> Result<u64> {
        instructions::available_withdraw_limit(ctx, owner)
    }

    pub fn last_deposit_timestamp(ctx: Context<LockupView>, owner: Pubkey) -> Result<i64> {
        instructions::last_deposit_timestamp(ctx, owner)
    }

    pub fn lockup_duration(ctx: Context<VaultView>) -> Result<i64> {
        instructions::lockup_duration(ctx)
    }

    pub fn current_exchange_rate(ctx: Context<StakePoolView>) -> Result<u128> {
        instructions::current_exchange_rate(ctx)
    }

    pub fn exchange_rate_precision(ctx: Context<VaultView>) -> Result<u8> {
        instructions::exchange_rate_precision(ctx)
    }

    pub fn total_value<'info>(
        ctx: Context<'_, '_, 'info, 'info, ValuationView<'info>>,
    ) -> Result<u64> {
        instructions::total_value(ctx)
    }

    /// Management switch between burn receipts and plain lamports on exit
    pub fn set_burn_conversion_enabled(
        ctx: Context<SetBurnConversion>,
        enabled: bool,
    ) -> Result<()> {
        instructions::set_burn_conversion_enabled(ctx, enabled)
    }
}
