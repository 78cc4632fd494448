use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    accounting_engine::cpi::{EngineProgram, EngineView},
    burn_converter::NoConversion,
    constants::*,
    cpi_support::take_accounts,
    custody::cpi::TokenCustody,
    orchestrator::Orchestrator,
    stake_adapter::cpi::SplStakePoolAdapter,
    state::{DepositorLockup, VaultConfig},
};

#[derive(Accounts)]
#[instruction(assets: u64, receiver: Pubkey)]
pub struct Deposit<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Box<Account<'info, VaultConfig>>,

    /// CHECK: PDA derivation
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.vault_id.as_ref(), VAULT_AUTHORITY_SEED],
        bump = vault.authority_bump
    )]
    pub vault_authority: AccountInfo<'info>,

    /// Lockup record of the receiver, who owns the minted shares
    #[account(
        init_if_needed,
        payer = depositor,
        space = DepositorLockup::LEN,
        seeds = [LOCKUP_SEED, vault.key().as_ref(), receiver.as_ref()],
        bump
    )]
    pub lockup: Box<Account<'info, DepositorLockup>>,

    #[account(
        mut,
        address = vault.receipt_custody
    )]
    pub receipt_custody: Box<Account<'info, TokenAccount>>,

    /// CHECK: Validated against vault
    #[account(address = vault.stake_program)]
    pub stake_program: AccountInfo<'info>,

    /// CHECK: Validated against vault
    #[account(address = vault.accounting_program)]
    pub accounting_program: AccountInfo<'info>,

    #[account(mut)]
    pub depositor: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    // Remaining accounts: [stake pool deposit accounts x6][accounting engine accounts...]
}

pub fn deposit<'info>(
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    assets: u64,
    receiver: Pubkey,
) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;
    let (pool_accounts, engine_accounts) =
        take_accounts(ctx.remaining_accounts, STAKE_POOL_DEPOSIT_ACCOUNTS)?;

    // Payment is whatever actually arrived at the vault authority
    let lamports_before = accounts.vault_authority.lamports();
    system_program::transfer(
        CpiContext::new(
            accounts.system_program.to_account_info(),
            Transfer {
                from: accounts.depositor.to_account_info(),
                to: accounts.vault_authority.to_account_info(),
            },
        ),
        assets,
    )?;
    let payment = accounts
        .vault_authority
        .lamports()
        .saturating_sub(lamports_before);

    let vault_id = accounts.vault.vault_id;
    let authority_bump = [accounts.vault.authority_bump];
    let seeds: &[&[u8]] = &[VAULT_SEED, vault_id.as_ref(), VAULT_AUTHORITY_SEED, &authority_bump];
    let signer_seeds = &[seeds];

    let vault_account = accounts.vault.to_account_info();
    let vault_authority = accounts.vault_authority.to_account_info();
    let receipt_custody = accounts.receipt_custody.to_account_info();
    let token_program = accounts.token_program.to_account_info();
    let system_program = accounts.system_program.to_account_info();

    let stake = SplStakePoolAdapter {
        stake_pool_program: accounts.stake_program.to_account_info(),
        vault_authority: vault_authority.clone(),
        receipt_custody: receipt_custody.clone(),
        token_program: token_program.clone(),
        system_program: system_program.clone(),
        pool_accounts,
        expected_pool: accounts.vault.stake_pool,
        expected_mint: accounts.vault.receipt_mint,
        signer_seeds,
    };
    let engine = EngineProgram {
        view: EngineView::new(
            accounts.accounting_program.to_account_info(),
            engine_accounts,
            &accounts.vault.accounting_state,
        )?,
        vault_authority: vault_authority.clone(),
        receipt_custody: receipt_custody.clone(),
        receiver_receipt_account: None,
        caller: accounts.depositor.to_account_info(),
        signer_seeds,
    };
    let custody = TokenCustody {
        vault_account,
        vault_authority,
        receipt_custody,
        burn_custody: None,
        token_program,
        system_program,
        receiver_burn_account: None,
        receiver_wallet: None,
        signer_seeds,
    };

    let lockup = &mut accounts.lockup;
    if !lockup.is_initialized() {
        lockup.vault = accounts.vault.key();
        lockup.depositor = receiver;
        lockup.bump = ctx.bumps.lockup;
    }
    let mut record = DepositorLockup::clone(&***lockup);

    let shares = Orchestrator::new(&mut accounts.vault, stake, NoConversion, engine, custody)
        .deposit(&mut record, payment, assets, receiver, now)?;
    ***lockup = record;

    msg!(
        "Deposited {} lamports for {}: {} shares, unlocks at {:?}",
        payment,
        receiver,
        shares,
        lockup.unlocks_at(accounts.vault.lockup_duration)
    );

    Ok(shares)
}
