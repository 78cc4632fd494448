use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::*,
    events::VaultInitialized,
    stake_adapter::load_stake_pool,
    state::VaultConfig,
};

#[derive(Accounts)]
#[instruction(vault_id: [u8; 32])]
pub struct InitializeVault<'info> {
    #[account(
        init,
        payer = authority,
        space = VaultConfig::LEN,
        seeds = [VAULT_SEED, vault_id.as_ref()],
        bump
    )]
    pub vault: Box<Account<'info, VaultConfig>>,

    /// PDA that holds transient lamports and owns both custody accounts
    /// CHECK: derived and used as authority only
    #[account(
        seeds = [VAULT_SEED, vault_id.as_ref(), VAULT_AUTHORITY_SEED],
        bump
    )]
    pub vault_authority: AccountInfo<'info>,

    /// Stake pool mint, the receipt asset
    pub receipt_mint: Box<Account<'info, Mint>>,

    /// Token minted 1:1 by the burn pool
    pub burn_receipt_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = receipt_mint,
        associated_token::authority = vault_authority,
    )]
    pub receipt_custody: Box<Account<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = burn_receipt_mint,
        associated_token::authority = vault_authority,
    )]
    pub burn_custody: Box<Account<'info, TokenAccount>>,

    /// The stake pool account; checked against the mint in the handler
    /// CHECK: owner checked here, layout in the handler
    #[account(owner = stake_program.key())]
    pub stake_pool: AccountInfo<'info>,

    /// CHECK: Program ID validation
    #[account(
        constraint = stake_program.key() == SPL_STAKE_POOL_PROGRAM_ID
    )]
    pub stake_program: AccountInfo<'info>,

    /// CHECK: Must be executable
    #[account(executable)]
    pub burn_program: AccountInfo<'info>,

    /// CHECK: Must be executable
    #[account(executable)]
    pub accounting_program: AccountInfo<'info>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub rent: Sysvar<'info, Rent>,
}

pub fn initialize_vault(
    ctx: Context<InitializeVault>,
    vault_id: [u8; 32],
    management: Pubkey,
    lockup_duration: i64,
    stake_pool: Pubkey,
    burn_pool: Pubkey,
    accounting_state: Pubkey,
) -> Result<()> {
    VaultConfig::validate_lockup_duration(lockup_duration)?;

    // The stake pool must mint the receipt asset the custody account holds
    load_stake_pool(
        &ctx.accounts.stake_pool,
        &stake_pool,
        &ctx.accounts.receipt_mint.key(),
    )?;

    let vault = &mut ctx.accounts.vault;
    vault.vault_id = vault_id;
    vault.management = management;
    vault.receipt_mint = ctx.accounts.receipt_mint.key();
    vault.burn_receipt_mint = ctx.accounts.burn_receipt_mint.key();
    vault.stake_program = ctx.accounts.stake_program.key();
    vault.stake_pool = stake_pool;
    vault.burn_program = ctx.accounts.burn_program.key();
    vault.burn_pool = burn_pool;
    vault.accounting_program = ctx.accounts.accounting_program.key();
    vault.accounting_state = accounting_state;
    vault.receipt_custody = ctx.accounts.receipt_custody.key();
    vault.burn_custody = ctx.accounts.burn_custody.key();
    vault.lockup_duration = lockup_duration;
    vault.burn_conversion_enabled = true;
    vault.reentrancy_locked = false;
    vault.bump = ctx.bumps.vault;
    vault.authority_bump = ctx.bumps.vault_authority;

    emit!(VaultInitialized {
        vault_id,
        management,
        lockup_duration,
        stake_pool,
        burn_pool,
        accounting_state,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
