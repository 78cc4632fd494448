use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};
use spl_associated_token_account::get_associated_token_address;

use crate::{
    accounting_engine::cpi::{EngineProgram, EngineView},
    burn_converter::cpi::BurnPoolConverter,
    constants::*,
    cpi_support::take_accounts,
    custody::cpi::TokenCustody,
    orchestrator::{ExitKind, ExitOutcome, ExitRequest, ExitRoute, Orchestrator},
    stake_adapter::cpi::SplStakePoolAdapter,
    state::{DepositorLockup, VaultConfig},
};

/// Accounts shared by withdraw and redeem
#[derive(Accounts)]
#[instruction(amount: u64, receiver: Pubkey, owner: Pubkey)]
pub struct ExitVault<'info> {
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

    /// Lockup record of the owner; omitted when the owner never deposited
    #[account(
        seeds = [LOCKUP_SEED, vault.key().as_ref(), owner.as_ref()],
        bump = lockup.bump
    )]
    pub lockup: Option<Box<Account<'info, DepositorLockup>>>,

    #[account(
        mut,
        address = vault.receipt_custody
    )]
    pub receipt_custody: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        address = vault.burn_custody
    )]
    pub burn_custody: Box<Account<'info, TokenAccount>>,

    /// Receiver's receipt ATA, paid directly on beneficiary exits
    #[account(
        mut,
        address = get_associated_token_address(&receiver, &vault.receipt_mint)
    )]
    pub receiver_receipt_account: Option<Box<Account<'info, TokenAccount>>>,

    /// Receiver's burn-receipt ATA, needed while burn conversion is enabled
    #[account(
        mut,
        address = get_associated_token_address(&receiver, &vault.burn_receipt_mint)
    )]
    pub receiver_burn_account: Option<Box<Account<'info, TokenAccount>>>,

    /// Receiver wallet, needed while burn conversion is disabled
    /// CHECK: must be the receiver
    #[account(
        mut,
        address = receiver
    )]
    pub receiver_wallet: Option<UncheckedAccount<'info>>,

    /// CHECK: Validated against vault
    #[account(address = vault.stake_program)]
    pub stake_program: AccountInfo<'info>,

    /// CHECK: Validated against vault
    #[account(address = vault.burn_program)]
    pub burn_program: AccountInfo<'info>,

    /// CHECK: Validated against vault
    #[account(address = vault.accounting_program)]
    pub accounting_program: AccountInfo<'info>,

    /// Owner or an account the owner approved on the engine
    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    // Remaining accounts:
    // [stake pool withdraw accounts x8][burn pool accounts x2][accounting engine accounts...]
}

pub(crate) fn exit_vault<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
    kind: ExitKind,
    amount: u64,
    receiver: Pubkey,
    owner: Pubkey,
    max_loss_bps: u16,
) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let accounts = ctx.accounts;
    let (pool_accounts, rest) =
        take_accounts(ctx.remaining_accounts, STAKE_POOL_WITHDRAW_ACCOUNTS)?;
    let (burn_accounts, engine_accounts) = take_accounts(rest, BURN_POOL_ACCOUNTS)?;

    let lockup = accounts
        .lockup
        .as_ref()
        .map(|record| DepositorLockup::clone(record))
        .unwrap_or_default();

    let vault_id = accounts.vault.vault_id;
    let authority_bump = [accounts.vault.authority_bump];
    let seeds: &[&[u8]] = &[VAULT_SEED, vault_id.as_ref(), VAULT_AUTHORITY_SEED, &authority_bump];
    let signer_seeds = &[seeds];

    let vault_account = accounts.vault.to_account_info();
    let vault_authority = accounts.vault_authority.to_account_info();
    let receipt_custody = accounts.receipt_custody.to_account_info();
    let burn_custody = accounts.burn_custody.to_account_info();
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
    let burn = BurnPoolConverter {
        burn_program: accounts.burn_program.to_account_info(),
        vault_authority: vault_authority.clone(),
        burn_custody: burn_custody.clone(),
        token_program: token_program.clone(),
        system_program: system_program.clone(),
        pool_accounts: burn_accounts,
        expected_pool: accounts.vault.burn_pool,
        expected_mint: accounts.vault.burn_receipt_mint,
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
        receiver_receipt_account: accounts
            .receiver_receipt_account
            .as_ref()
            .map(|account| account.to_account_info()),
        caller: accounts.caller.to_account_info(),
        signer_seeds,
    };
    let custody = TokenCustody {
        vault_account,
        vault_authority,
        receipt_custody,
        burn_custody: Some(burn_custody),
        token_program,
        system_program,
        receiver_burn_account: accounts
            .receiver_burn_account
            .as_ref()
            .map(|account| account.to_account_info()),
        receiver_wallet: accounts
            .receiver_wallet
            .as_ref()
            .map(|wallet| wallet.to_account_info()),
        signer_seeds,
    };

    let request = ExitRequest {
        amount,
        receiver,
        owner,
        caller: accounts.caller.key(),
        max_loss_bps,
    };

    let mut orchestrator = Orchestrator::new(&mut accounts.vault, stake, burn, engine, custody);
    let outcome = match kind {
        ExitKind::Withdraw => orchestrator.withdraw(&lockup, request, now)?,
        ExitKind::Redeem => orchestrator.redeem(&lockup, request, now)?,
    };

    log_exit(&owner, &outcome);
    Ok(outcome.returned(kind))
}

fn log_exit(owner: &Pubkey, outcome: &ExitOutcome) {
    match outcome.route {
        ExitRoute::Beneficiary => msg!(
            "Beneficiary {} exited without lockup: {} shares, {} assets",
            owner,
            outcome.shares_burned,
            outcome.assets_released
        ),
        ExitRoute::Depositor => msg!(
            "Exit for {}: {} shares burned, {} receipt released, {} principal unstaked, {} forwarded",
            owner,
            outcome.shares_burned,
            outcome.assets_released,
            outcome.principal_unstaked,
            outcome.forwarded
        ),
    }
}

pub fn withdraw<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
    assets: u64,
    receiver: Pubkey,
    owner: Pubkey,
    max_loss_bps: u16,
) -> Result<u64> {
    exit_vault(ctx, ExitKind::Withdraw, assets, receiver, owner, max_loss_bps)
}

pub fn redeem<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExitVault<'info>>,
    shares: u64,
    receiver: Pubkey,
    owner: Pubkey,
    max_loss_bps: u16,
) -> Result<u64> {
    exit_vault(ctx, ExitKind::Redeem, shares, receiver, owner, max_loss_bps)
}
