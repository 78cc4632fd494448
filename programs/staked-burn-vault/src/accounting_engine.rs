use anchor_lang::prelude::*;

/// Share-accounting engine the vault delegates to.
///
/// The engine custodies the receipt asset, mints and burns shares, enforces
/// owner/allowance checks on exits and names the yield beneficiary. All
/// amounts are in receipt-asset units (assets) or engine shares.
///
/// Exits for any owner other than the beneficiary must be signed by the vault
/// authority. An engine that accepts them from the owner alone lets shares
/// leave without passing the lockup.
pub trait AccountingEngine {
    fn beneficiary(&self) -> Result<Pubkey>;

    /// Takes `assets` from vault custody and mints shares to `receiver`
    fn deposit(&mut self, assets: u64, receiver: &Pubkey) -> Result<u64>;

    /// Burns the shares backing `assets` from `owner`, pays `receiver`;
    /// returns shares burned
    fn withdraw(
        &mut self,
        assets: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
        caller: &Pubkey,
        max_loss_bps: u16,
    ) -> Result<u64>;

    /// Burns `shares` from `owner`, pays `receiver`; returns assets paid
    fn redeem(
        &mut self,
        shares: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
        caller: &Pubkey,
        max_loss_bps: u16,
    ) -> Result<u64>;

    fn max_withdraw(&self, owner: &Pubkey) -> Result<u64>;

    fn max_redeem(&self, owner: &Pubkey) -> Result<u64>;

    fn preview_withdraw(&self, assets: u64) -> Result<u64>;

    fn preview_redeem(&self, shares: u64) -> Result<u64>;

    fn total_assets(&self) -> Result<u64>;
}

/// CPI adapter for an accounting engine program exposing Anchor instructions
/// of the same names. Views are read back from return data.
pub mod cpi {
    use super::*;
    use anchor_lang::solana_program::{
        instruction::Instruction,
        program::{invoke, invoke_signed},
    };

    use crate::{
        cpi_support::{anchor_ix_data, passthrough_metas, return_pubkey, return_u64},
        errors::VaultError,
    };

    /// Read-only access to the engine: program plus its pass-through accounts
    /// (engine state first, then share mint, engine custody, share and receipt
    /// accounts)
    pub struct EngineView<'a, 'info> {
        program: AccountInfo<'info>,
        engine_accounts: &'a [AccountInfo<'info>],
    }

    impl<'a, 'info> EngineView<'a, 'info> {
        /// The leading engine account must be the state recorded on the vault
        pub fn new(
            program: AccountInfo<'info>,
            engine_accounts: &'a [AccountInfo<'info>],
            accounting_state: &Pubkey,
        ) -> Result<Self> {
            let state = engine_accounts.first().ok_or(VaultError::MissingAccounts)?;
            require_keys_eq!(state.key(), *accounting_state, VaultError::InvalidAccountingState);
            Ok(Self {
                program,
                engine_accounts,
            })
        }

        fn instruction(&self, leading: Vec<AccountMeta>, data: Vec<u8>) -> Instruction {
            let mut accounts = leading;
            accounts.extend(passthrough_metas(self.engine_accounts));
            Instruction {
                program_id: self.program.key(),
                accounts,
                data,
            }
        }

        fn infos(&self, leading: &[&AccountInfo<'info>]) -> Vec<AccountInfo<'info>> {
            let mut infos: Vec<AccountInfo<'info>> =
                leading.iter().map(|info| (*info).clone()).collect();
            infos.extend(self.engine_accounts.iter().cloned());
            infos.push(self.program.clone());
            infos
        }

        fn view_u64(&self, name: &str, args: &[&[u8]]) -> Result<u64> {
            let ix = self.instruction(Vec::new(), anchor_ix_data(name, args));
            invoke(&ix, &self.infos(&[]))?;
            return_u64(&self.program.key())
        }

        pub fn beneficiary(&self) -> Result<Pubkey> {
            let ix = self.instruction(Vec::new(), anchor_ix_data("beneficiary", &[]));
            invoke(&ix, &self.infos(&[]))?;
            return_pubkey(&self.program.key())
        }

        pub fn max_withdraw(&self, owner: &Pubkey) -> Result<u64> {
            self.view_u64("max_withdraw", &[owner.as_ref()])
        }

        pub fn max_redeem(&self, owner: &Pubkey) -> Result<u64> {
            self.view_u64("max_redeem", &[owner.as_ref()])
        }

        pub fn preview_withdraw(&self, assets: u64) -> Result<u64> {
            self.view_u64("preview_withdraw", &[&assets.to_le_bytes()])
        }

        pub fn preview_redeem(&self, shares: u64) -> Result<u64> {
            self.view_u64("preview_redeem", &[&shares.to_le_bytes()])
        }

        pub fn total_assets(&self) -> Result<u64> {
            self.view_u64("total_assets", &[])
        }
    }

    pub struct EngineProgram<'a, 'info> {
        pub view: EngineView<'a, 'info>,
        pub vault_authority: AccountInfo<'info>,
        pub receipt_custody: AccountInfo<'info>,
        /// Receiver's receipt-token account, paid on beneficiary exits
        pub receiver_receipt_account: Option<AccountInfo<'info>>,
        /// Exit signer whose authority the engine checks against the owner
        pub caller: AccountInfo<'info>,
        pub signer_seeds: &'a [&'a [&'a [u8]]],
    }

    impl<'a, 'info> EngineProgram<'a, 'info> {
        /// Vault custody when the vault is the interim receiver, otherwise the
        /// receiver's own receipt-token account
        fn payout_account(&self, receiver: &Pubkey) -> Result<AccountInfo<'info>> {
            if *receiver == self.vault_authority.key() {
                return Ok(self.receipt_custody.clone());
            }
            self.receiver_receipt_account
                .clone()
                .ok_or_else(|| VaultError::MissingForwardAccount.into())
        }

        /// Exits carry both the caller's and the vault authority's signature
        pub(crate) fn exit_instruction(
            &self,
            name: &str,
            amount: u64,
            receiver: &Pubkey,
            owner: &Pubkey,
            max_loss_bps: u16,
        ) -> Result<(Instruction, Vec<AccountInfo<'info>>)> {
            let payout = self.payout_account(receiver)?;
            let ix = self.view.instruction(
                vec![
                    AccountMeta::new_readonly(self.caller.key(), true),
                    AccountMeta::new_readonly(self.vault_authority.key(), true),
                    AccountMeta::new(payout.key(), false),
                ],
                anchor_ix_data(
                    name,
                    &[
                        &amount.to_le_bytes(),
                        receiver.as_ref(),
                        owner.as_ref(),
                        &max_loss_bps.to_le_bytes(),
                    ],
                ),
            );
            let infos = self
                .view
                .infos(&[&self.caller, &self.vault_authority, &payout]);
            Ok((ix, infos))
        }

        fn exit(
            &self,
            name: &str,
            amount: u64,
            receiver: &Pubkey,
            owner: &Pubkey,
            max_loss_bps: u16,
        ) -> Result<u64> {
            let (ix, infos) = self.exit_instruction(name, amount, receiver, owner, max_loss_bps)?;
            invoke_signed(&ix, &infos, self.signer_seeds)?;
            return_u64(&self.view.program.key())
        }
    }

    impl<'a, 'info> AccountingEngine for EngineProgram<'a, 'info> {
        fn beneficiary(&self) -> Result<Pubkey> {
            self.view.beneficiary()
        }

        fn deposit(&mut self, assets: u64, receiver: &Pubkey) -> Result<u64> {
            let ix = self.view.instruction(
                vec![
                    AccountMeta::new(self.vault_authority.key(), true),
                    AccountMeta::new(self.receipt_custody.key(), false),
                ],
                anchor_ix_data("deposit", &[&assets.to_le_bytes(), receiver.as_ref()]),
            );
            invoke_signed(
                &ix,
                &self.view.infos(&[&self.vault_authority, &self.receipt_custody]),
                self.signer_seeds,
            )?;
            return_u64(&self.view.program.key())
        }

        fn withdraw(
            &mut self,
            assets: u64,
            receiver: &Pubkey,
            owner: &Pubkey,
            _caller: &Pubkey,
            max_loss_bps: u16,
        ) -> Result<u64> {
            self.exit("withdraw", assets, receiver, owner, max_loss_bps)
        }

        fn redeem(
            &mut self,
            shares: u64,
            receiver: &Pubkey,
            owner: &Pubkey,
            _caller: &Pubkey,
            max_loss_bps: u16,
        ) -> Result<u64> {
            self.exit("redeem", shares, receiver, owner, max_loss_bps)
        }

        fn max_withdraw(&self, owner: &Pubkey) -> Result<u64> {
            self.view.max_withdraw(owner)
        }

        fn max_redeem(&self, owner: &Pubkey) -> Result<u64> {
            self.view.max_redeem(owner)
        }

        fn preview_withdraw(&self, assets: u64) -> Result<u64> {
            self.view.preview_withdraw(assets)
        }

        fn preview_redeem(&self, shares: u64) -> Result<u64> {
            self.view.preview_redeem(shares)
        }

        fn total_assets(&self) -> Result<u64> {
            self.view.total_assets()
        }
    }
}
