use anchor_lang::prelude::*;

use crate::state::VaultConfig;

/// The vault's own holdings: receipt and burn-receipt token accounts plus the
/// lamport-holding vault authority.
///
/// The receipt balance is read from account state on every call so deltas can
/// be taken immediately around the external call that caused them.
pub trait VaultCustody {
    /// Address an engine pays when the vault is the interim receiver
    fn custodian(&self) -> Pubkey;

    fn receipt_balance(&self) -> Result<u64>;

    fn forward_burn_receipt(&mut self, receiver: &Pubkey, amount: u64) -> Result<()>;

    fn forward_principal(&mut self, receiver: &Pubkey, amount: u64) -> Result<()>;

    /// Writes the vault record to its backing account so a nested
    /// invocation observes the current lock state
    fn sync_vault_state(&mut self, vault: &VaultConfig) -> Result<()>;
}

pub mod cpi {
    use super::*;
    use anchor_lang::system_program;
    use anchor_spl::token::{self, Transfer};

    use crate::{cpi_support::token_amount, errors::VaultError};

    pub struct TokenCustody<'a, 'info> {
        pub vault_account: AccountInfo<'info>,
        pub vault_authority: AccountInfo<'info>,
        pub receipt_custody: AccountInfo<'info>,
        /// Exits only
        pub burn_custody: Option<AccountInfo<'info>>,
        pub token_program: AccountInfo<'info>,
        pub system_program: AccountInfo<'info>,
        /// Receiver's burn-receipt ATA; exits only
        pub receiver_burn_account: Option<AccountInfo<'info>>,
        /// Receiver wallet for lamport forwarding; exits only
        pub receiver_wallet: Option<AccountInfo<'info>>,
        pub signer_seeds: &'a [&'a [&'a [u8]]],
    }

    impl<'a, 'info> VaultCustody for TokenCustody<'a, 'info> {
        fn custodian(&self) -> Pubkey {
            self.vault_authority.key()
        }

        fn receipt_balance(&self) -> Result<u64> {
            token_amount(&self.receipt_custody)
        }

        fn forward_burn_receipt(&mut self, _receiver: &Pubkey, amount: u64) -> Result<()> {
            // the account constraint ties this ATA to the receiver
            let destination = self
                .receiver_burn_account
                .clone()
                .ok_or(VaultError::MissingForwardAccount)?;
            let source = self
                .burn_custody
                .clone()
                .ok_or(VaultError::MissingAccounts)?;

            token::transfer(
                CpiContext::new_with_signer(
                    self.token_program.clone(),
                    Transfer {
                        from: source,
                        to: destination,
                        authority: self.vault_authority.clone(),
                    },
                    self.signer_seeds,
                ),
                amount,
            )
        }

        fn forward_principal(&mut self, receiver: &Pubkey, amount: u64) -> Result<()> {
            let destination = self
                .receiver_wallet
                .clone()
                .ok_or(VaultError::MissingForwardAccount)?;
            require_keys_eq!(destination.key(), *receiver, VaultError::MissingForwardAccount);

            system_program::transfer(
                CpiContext::new_with_signer(
                    self.system_program.clone(),
                    system_program::Transfer {
                        from: self.vault_authority.clone(),
                        to: destination,
                    },
                    self.signer_seeds,
                ),
                amount,
            )
        }

        fn sync_vault_state(&mut self, vault: &VaultConfig) -> Result<()> {
            let mut data = self.vault_account.try_borrow_mut_data()?;
            let mut writer: &mut [u8] = &mut data[..];
            vault.try_serialize(&mut writer)
        }
    }
}
