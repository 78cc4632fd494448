//! Read-only instructions; results travel back as return data.

use anchor_lang::prelude::*;

use crate::{
    accounting_engine::cpi::EngineView,
    constants::*,
    math::value_of_receipt,
    orchestrator::withdraw_limit,
    stake_adapter::load_stake_pool,
    state::{DepositorLockup, VaultConfig},
};

#[derive(Accounts)]
pub struct VaultView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, VaultConfig>,
}

#[derive(Accounts)]
#[instruction(owner: Pubkey)]
pub struct LockupView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, VaultConfig>,

    #[account(
        seeds = [LOCKUP_SEED, vault.key().as_ref(), owner.as_ref()],
        bump = lockup.bump
    )]
    pub lockup: Option<Account<'info, DepositorLockup>>,

    /// CHECK: Validated against vault
    #[account(address = vault.accounting_program)]
    pub accounting_program: AccountInfo<'info>,
    // Remaining accounts: accounting engine accounts
}

#[derive(Accounts)]
pub struct StakePoolView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, VaultConfig>,

    /// CHECK: key checked against vault, layout on load
    #[account(address = vault.stake_pool)]
    pub stake_pool: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct ValuationView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, VaultConfig>,

    /// CHECK: key checked against vault, layout on load
    #[account(address = vault.stake_pool)]
    pub stake_pool: AccountInfo<'info>,

    /// CHECK: Validated against vault
    #[account(address = vault.accounting_program)]
    pub accounting_program: AccountInfo<'info>,
    // Remaining accounts: accounting engine accounts
}

fn recorded_lockup(lockup: &Option<Account<DepositorLockup>>) -> DepositorLockup {
    lockup
        .as_ref()
        .map(|record| DepositorLockup::clone(record))
        .unwrap_or_default()
}

pub fn available_withdraw_limit<'info>(
    ctx: Context<'_, '_, 'info, 'info, LockupView<'info>>,
    owner: Pubkey,
) -> Result<u64> {
    let engine = EngineView::new(
        ctx.accounts.accounting_program.to_account_info(),
        ctx.remaining_accounts,
        &ctx.accounts.vault.accounting_state,
    )?;
    let beneficiary = engine.beneficiary()?;
    let lockup = recorded_lockup(&ctx.accounts.lockup);

    Ok(withdraw_limit(
        &ctx.accounts.vault,
        &beneficiary,
        &lockup,
        &owner,
        Clock::get()?.unix_timestamp,
    ))
}

pub fn last_deposit_timestamp(ctx: Context<LockupView>, _owner: Pubkey) -> Result<i64> {
    Ok(recorded_lockup(&ctx.accounts.lockup).last_deposit_ts)
}

pub fn lockup_duration(ctx: Context<VaultView>) -> Result<i64> {
    Ok(ctx.accounts.vault.lockup_duration)
}

pub fn exchange_rate_precision(_ctx: Context<VaultView>) -> Result<u8> {
    Ok(EXCHANGE_RATE_PRECISION)
}

pub fn current_exchange_rate(ctx: Context<StakePoolView>) -> Result<u128> {
    let vault = &ctx.accounts.vault;
    load_stake_pool(&ctx.accounts.stake_pool, &vault.stake_pool, &vault.receipt_mint)?
        .exchange_rate()
}

/// Principal value of the receipt assets held by the engine
pub fn total_value<'info>(ctx: Context<'_, '_, 'info, 'info, ValuationView<'info>>) -> Result<u64> {
    let vault = &ctx.accounts.vault;
    let rate = load_stake_pool(&ctx.accounts.stake_pool, &vault.stake_pool, &vault.receipt_mint)?
        .exchange_rate()?;
    let engine = EngineView::new(
        ctx.accounts.accounting_program.to_account_info(),
        ctx.remaining_accounts,
        &vault.accounting_state,
    )?;
    value_of_receipt(engine.total_assets()?, rate)
}
