use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// Takes principal lamports and mints burn receipts to the vault, 1:1.
///
/// The returned amount is the vault's burn-receipt balance delta. A deviation
/// from 1:1 is visible to the caller but not rejected here; the orchestrator
/// only insists on a non-zero result.
pub trait BurnConverter {
    fn mint_burn_receipt(&mut self, principal_amount: u64) -> Result<u64>;

    fn deposit_for_burn(&mut self, principal_amount: u64) -> Result<u64> {
        if principal_amount == 0 {
            return Ok(0);
        }
        self.mint_burn_receipt(principal_amount)
    }
}

/// Converter for instructions that never reach the conversion step
pub struct NoConversion;

impl BurnConverter for NoConversion {
    fn mint_burn_receipt(&mut self, _principal_amount: u64) -> Result<u64> {
        err!(VaultError::BurnConversionFailed)
    }
}

/// CPI adapter for the burn pool's `deposit_for_burn` instruction
pub mod cpi {
    use super::*;
    use anchor_lang::solana_program::{instruction::Instruction, program::invoke_signed};

    use crate::{
        constants::BURN_POOL_ACCOUNTS,
        cpi_support::{anchor_ix_data, token_amount},
    };

    /// Remaining accounts: [burn_pool_state, burn_receipt_mint]
    pub struct BurnPoolConverter<'a, 'info> {
        pub burn_program: AccountInfo<'info>,
        pub vault_authority: AccountInfo<'info>,
        pub burn_custody: AccountInfo<'info>,
        pub token_program: AccountInfo<'info>,
        pub system_program: AccountInfo<'info>,
        pub pool_accounts: &'a [AccountInfo<'info>],
        pub expected_pool: Pubkey,
        pub expected_mint: Pubkey,
        pub signer_seeds: &'a [&'a [&'a [u8]]],
    }

    impl<'a, 'info> BurnConverter for BurnPoolConverter<'a, 'info> {
        fn mint_burn_receipt(&mut self, principal_amount: u64) -> Result<u64> {
            require!(
                self.pool_accounts.len() >= BURN_POOL_ACCOUNTS,
                VaultError::MissingAccounts
            );
            let burn_pool = &self.pool_accounts[0];
            let burn_mint = &self.pool_accounts[1];
            require_keys_eq!(burn_pool.key(), self.expected_pool, VaultError::InvalidBurnPool);
            require_keys_eq!(burn_mint.key(), self.expected_mint, VaultError::InvalidBurnPool);

            let instruction = Instruction {
                program_id: self.burn_program.key(),
                accounts: vec![
                    AccountMeta::new(burn_pool.key(), false),
                    AccountMeta::new(self.vault_authority.key(), true),
                    AccountMeta::new(burn_mint.key(), false),
                    AccountMeta::new(self.burn_custody.key(), false),
                    AccountMeta::new_readonly(self.token_program.key(), false),
                    AccountMeta::new_readonly(self.system_program.key(), false),
                ],
                data: anchor_ix_data("deposit_for_burn", &[&principal_amount.to_le_bytes()]),
            };

            let minted_before = token_amount(&self.burn_custody)?;

            invoke_signed(
                &instruction,
                &[
                    burn_pool.clone(),
                    self.vault_authority.clone(),
                    burn_mint.clone(),
                    self.burn_custody.clone(),
                    self.token_program.clone(),
                    self.system_program.clone(),
                    self.burn_program.clone(),
                ],
                self.signer_seeds,
            )?;

            let minted_after = token_amount(&self.burn_custody)?;
            Ok(minted_after.saturating_sub(minted_before))
        }
    }
}
