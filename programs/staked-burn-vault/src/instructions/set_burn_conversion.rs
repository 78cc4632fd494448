use anchor_lang::prelude::*;

use crate::{constants::*, events::BurnConversionUpdated, state::VaultConfig};

#[derive(Accounts)]
pub struct SetBurnConversion<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.vault_id.as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, VaultConfig>,

    pub management: Signer<'info>,
}

pub fn set_burn_conversion_enabled(ctx: Context<SetBurnConversion>, enabled: bool) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    vault.require_management(&ctx.accounts.management.key())?;

    vault.burn_conversion_enabled = enabled;
    msg!("Burn conversion enabled: {}", enabled);

    emit!(BurnConversionUpdated {
        vault_id: vault.vault_id,
        enabled,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
