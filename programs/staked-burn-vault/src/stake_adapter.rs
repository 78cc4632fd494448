use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

use crate::{constants::*, errors::VaultError, math::exchange_rate_from_totals};

/// Converts principal lamports into the yield source's receipt token and back.
///
/// Implementors report amounts measured as balance deltas of the vault's own
/// accounts, never the yield source's quoted figures. `stake` and `unstake`
/// wrap the raw transfers with the zero-amount failure rules.
pub trait StakeAdapter {
    /// Moves `principal_amount` into the yield source; returns receipt credited.
    fn deposit_principal(&mut self, principal_amount: u64) -> Result<u64>;

    /// Redeems `receipt_amount`; returns principal received.
    fn withdraw_principal(&mut self, receipt_amount: u64) -> Result<u64>;

    fn current_exchange_rate(&self) -> Result<u128>;

    fn exchange_rate_precision(&self) -> u8 {
        EXCHANGE_RATE_PRECISION
    }

    fn stake(&mut self, principal_amount: u64) -> Result<u64> {
        require!(principal_amount > 0, VaultError::StakeFailed);
        let received = self.deposit_principal(principal_amount)?;
        require!(received > 0, VaultError::StakeFailed);
        Ok(received)
    }

    fn unstake(&mut self, receipt_amount: u64) -> Result<u64> {
        if receipt_amount == 0 {
            return Ok(0);
        }
        let received = self.withdraw_principal(receipt_amount)?;
        // zero out of a non-zero burn means the external call silently failed
        require!(received > 0, VaultError::UnstakeFailed);
        Ok(received)
    }
}

/// Leading fields of an SPL stake pool account (borsh layout, no padding)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct StakePoolHeader {
    pub account_type: u8,
    pub manager: [u8; 32],
    pub staker: [u8; 32],
    pub stake_deposit_authority: [u8; 32],
    pub stake_withdraw_bump_seed: u8,
    pub validator_list: [u8; 32],
    pub reserve_stake: [u8; 32],
    pub pool_mint: [u8; 32],
    pub manager_fee_account: [u8; 32],
    pub token_program_id: [u8; 32],
    pub total_lamports: [u8; 8],
    pub pool_token_supply: [u8; 8],
    pub last_update_epoch: [u8; 8],
}

impl StakePoolHeader {
    pub const ACCOUNT_TYPE_STAKE_POOL: u8 = 1;

    pub fn pool_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool_mint)
    }

    pub fn reserve_stake(&self) -> Pubkey {
        Pubkey::new_from_array(self.reserve_stake)
    }

    pub fn total_lamports(&self) -> u64 {
        u64::from_le_bytes(self.total_lamports)
    }

    pub fn pool_token_supply(&self) -> u64 {
        u64::from_le_bytes(self.pool_token_supply)
    }

    pub fn exchange_rate(&self) -> Result<u128> {
        exchange_rate_from_totals(self.total_lamports(), self.pool_token_supply())
    }
}

pub fn parse_stake_pool(data: &[u8]) -> Result<StakePoolHeader> {
    let len = std::mem::size_of::<StakePoolHeader>();
    require!(data.len() >= len, VaultError::InvalidStakePool);

    let header = bytemuck::try_from_bytes::<StakePoolHeader>(&data[..len])
        .map_err(|_| VaultError::InvalidStakePool)?;
    require!(
        header.account_type == StakePoolHeader::ACCOUNT_TYPE_STAKE_POOL,
        VaultError::InvalidStakePool
    );
    Ok(*header)
}

pub fn deserialize_stake_pool(account: &AccountInfo) -> Result<StakePoolHeader> {
    let data = account.try_borrow_data()?;
    parse_stake_pool(&data)
}

/// Loads the pool after checking it is the one the vault was configured with
pub fn load_stake_pool(
    stake_pool: &AccountInfo,
    expected_pool: &Pubkey,
    expected_mint: &Pubkey,
) -> Result<StakePoolHeader> {
    require_keys_eq!(stake_pool.key(), *expected_pool, VaultError::InvalidStakePool);
    let header = deserialize_stake_pool(stake_pool)?;
    require_keys_eq!(header.pool_mint(), *expected_mint, VaultError::InvalidStakePool);
    Ok(header)
}

/// CPI adapter for an SPL stake pool (`DepositSol` / `WithdrawSol`)
pub mod cpi {
    use super::*;
    use anchor_lang::solana_program::{instruction::Instruction, program::invoke_signed};

    use crate::cpi_support::token_amount;

    /// Remaining accounts, deposit layout:
    /// [stake_pool, withdraw_authority, reserve_stake, manager_fee_account, referrer_pool_tokens, pool_mint]
    ///
    /// Remaining accounts, withdraw layout:
    /// [stake_pool, withdraw_authority, reserve_stake, manager_fee_account, pool_mint, clock, stake_history, stake_program]
    pub struct SplStakePoolAdapter<'a, 'info> {
        pub stake_pool_program: AccountInfo<'info>,
        pub vault_authority: AccountInfo<'info>,
        pub receipt_custody: AccountInfo<'info>,
        pub token_program: AccountInfo<'info>,
        pub system_program: AccountInfo<'info>,
        pub pool_accounts: &'a [AccountInfo<'info>],
        pub expected_pool: Pubkey,
        pub expected_mint: Pubkey,
        pub signer_seeds: &'a [&'a [&'a [u8]]],
    }

    impl<'a, 'info> SplStakePoolAdapter<'a, 'info> {
        fn pool_account(&self, index: usize) -> Result<&AccountInfo<'info>> {
            self.pool_accounts
                .get(index)
                .ok_or_else(|| VaultError::MissingAccounts.into())
        }

        fn load_pool(&self) -> Result<StakePoolHeader> {
            load_stake_pool(self.pool_account(0)?, &self.expected_pool, &self.expected_mint)
        }
    }

    impl<'a, 'info> StakeAdapter for SplStakePoolAdapter<'a, 'info> {
        fn deposit_principal(&mut self, principal_amount: u64) -> Result<u64> {
            require!(
                self.pool_accounts.len() >= STAKE_POOL_DEPOSIT_ACCOUNTS,
                VaultError::MissingAccounts
            );
            let header = self.load_pool()?;
            let stake_pool = &self.pool_accounts[0];
            let withdraw_authority = &self.pool_accounts[1];
            let reserve_stake = &self.pool_accounts[2];
            let manager_fee_account = &self.pool_accounts[3];
            let referrer_pool_tokens = &self.pool_accounts[4];
            let pool_mint = &self.pool_accounts[5];
            require_keys_eq!(reserve_stake.key(), header.reserve_stake(), VaultError::InvalidStakePool);

            let mut data = Vec::with_capacity(9);
            data.push(STAKE_POOL_DEPOSIT_SOL_TAG);
            data.extend_from_slice(&principal_amount.to_le_bytes());

            let instruction = Instruction {
                program_id: self.stake_pool_program.key(),
                accounts: vec![
                    AccountMeta::new(stake_pool.key(), false),
                    AccountMeta::new_readonly(withdraw_authority.key(), false),
                    AccountMeta::new(reserve_stake.key(), false),
                    AccountMeta::new(self.vault_authority.key(), true),
                    AccountMeta::new(self.receipt_custody.key(), false),
                    AccountMeta::new(manager_fee_account.key(), false),
                    AccountMeta::new(referrer_pool_tokens.key(), false),
                    AccountMeta::new(pool_mint.key(), false),
                    AccountMeta::new_readonly(self.system_program.key(), false),
                    AccountMeta::new_readonly(self.token_program.key(), false),
                ],
                data,
            };

            let receipt_before = token_amount(&self.receipt_custody)?;

            invoke_signed(
                &instruction,
                &[
                    stake_pool.clone(),
                    withdraw_authority.clone(),
                    reserve_stake.clone(),
                    self.vault_authority.clone(),
                    self.receipt_custody.clone(),
                    manager_fee_account.clone(),
                    referrer_pool_tokens.clone(),
                    pool_mint.clone(),
                    self.system_program.clone(),
                    self.token_program.clone(),
                    self.stake_pool_program.clone(),
                ],
                self.signer_seeds,
            )?;

            let receipt_after = token_amount(&self.receipt_custody)?;
            Ok(receipt_after.saturating_sub(receipt_before))
        }

        fn withdraw_principal(&mut self, receipt_amount: u64) -> Result<u64> {
            require!(
                self.pool_accounts.len() >= STAKE_POOL_WITHDRAW_ACCOUNTS,
                VaultError::MissingAccounts
            );
            let header = self.load_pool()?;
            let stake_pool = &self.pool_accounts[0];
            let withdraw_authority = &self.pool_accounts[1];
            let reserve_stake = &self.pool_accounts[2];
            let manager_fee_account = &self.pool_accounts[3];
            let pool_mint = &self.pool_accounts[4];
            let clock = &self.pool_accounts[5];
            let stake_history = &self.pool_accounts[6];
            let native_stake_program = &self.pool_accounts[7];
            require_keys_eq!(reserve_stake.key(), header.reserve_stake(), VaultError::InvalidStakePool);

            let mut data = Vec::with_capacity(9);
            data.push(STAKE_POOL_WITHDRAW_SOL_TAG);
            data.extend_from_slice(&receipt_amount.to_le_bytes());

            let instruction = Instruction {
                program_id: self.stake_pool_program.key(),
                accounts: vec![
                    AccountMeta::new(stake_pool.key(), false),
                    AccountMeta::new_readonly(withdraw_authority.key(), false),
                    AccountMeta::new_readonly(self.vault_authority.key(), true),
                    AccountMeta::new(self.receipt_custody.key(), false),
                    AccountMeta::new(reserve_stake.key(), false),
                    AccountMeta::new(self.vault_authority.key(), false),
                    AccountMeta::new(manager_fee_account.key(), false),
                    AccountMeta::new(pool_mint.key(), false),
                    AccountMeta::new_readonly(clock.key(), false),
                    AccountMeta::new_readonly(stake_history.key(), false),
                    AccountMeta::new_readonly(native_stake_program.key(), false),
                    AccountMeta::new_readonly(self.token_program.key(), false),
                ],
                data,
            };

            let lamports_before = self.vault_authority.lamports();

            invoke_signed(
                &instruction,
                &[
                    stake_pool.clone(),
                    withdraw_authority.clone(),
                    self.vault_authority.clone(),
                    self.receipt_custody.clone(),
                    reserve_stake.clone(),
                    manager_fee_account.clone(),
                    pool_mint.clone(),
                    clock.clone(),
                    stake_history.clone(),
                    native_stake_program.clone(),
                    self.token_program.clone(),
                    self.stake_pool_program.clone(),
                ],
                self.signer_seeds,
            )?;

            let lamports_after = self.vault_authority.lamports();
            Ok(lamports_after.saturating_sub(lamports_before))
        }

        fn current_exchange_rate(&self) -> Result<u128> {
            self.load_pool()?.exchange_rate()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(total_lamports: u64, supply: u64, mint: &Pubkey) -> Vec<u8> {
        let mut header = StakePoolHeader::zeroed();
        header.account_type = StakePoolHeader::ACCOUNT_TYPE_STAKE_POOL;
        header.pool_mint = mint.to_bytes();
        header.total_lamports = total_lamports.to_le_bytes();
        header.pool_token_supply = supply.to_le_bytes();
        let mut data = bytemuck::bytes_of(&header).to_vec();
        // validator fee fields and the rest of the pool follow the header
        data.extend_from_slice(&[0u8; 64]);
        data
    }

    #[test]
    fn test_header_matches_borsh_offsets() {
        assert_eq!(std::mem::size_of::<StakePoolHeader>(), 282);

        // account_type, 3 keys, bump seed, 5 keys precede total_lamports
        let mut data = vec![0u8; 282];
        data[0] = StakePoolHeader::ACCOUNT_TYPE_STAKE_POOL;
        data[258..266].copy_from_slice(&7u64.to_le_bytes());
        data[266..274].copy_from_slice(&5u64.to_le_bytes());
        let header = parse_stake_pool(&data).unwrap();
        assert_eq!(header.total_lamports(), 7);
        assert_eq!(header.pool_token_supply(), 5);
    }

    #[test]
    fn test_parse_stake_pool_rate() {
        let mint = Pubkey::new_unique();
        let header = parse_stake_pool(&pool_bytes(1_100, 1_000, &mint)).unwrap();
        assert_eq!(header.pool_mint(), mint);
        assert_eq!(header.total_lamports(), 1_100);
        assert_eq!(header.pool_token_supply(), 1_000);
        assert_eq!(
            header.exchange_rate().unwrap(),
            EXCHANGE_RATE_SCALE + EXCHANGE_RATE_SCALE / 10
        );
    }

    #[test]
    fn test_parse_rejects_uninitialized_or_short() {
        let mint = Pubkey::new_unique();
        let mut data = pool_bytes(1, 1, &mint);
        data[0] = 0;
        assert_eq!(
            parse_stake_pool(&data).unwrap_err(),
            VaultError::InvalidStakePool.into()
        );
        assert!(parse_stake_pool(&[1u8; 100]).is_err());
    }

    #[test]
    fn test_load_checks_pool_key_and_mint() {
        let mint = Pubkey::new_unique();
        let key = Pubkey::new_unique();
        let owner = SPL_STAKE_POOL_PROGRAM_ID;
        let mut lamports = 0u64;
        let mut data = pool_bytes(2_200, 2_000, &mint);
        let pool = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &owner, false, 0);

        let header = load_stake_pool(&pool, &key, &mint).unwrap();
        assert_eq!(
            header.exchange_rate().unwrap(),
            EXCHANGE_RATE_SCALE + EXCHANGE_RATE_SCALE / 10
        );
        assert_eq!(
            load_stake_pool(&pool, &Pubkey::new_unique(), &mint).unwrap_err(),
            VaultError::InvalidStakePool.into()
        );
        assert_eq!(
            load_stake_pool(&pool, &key, &Pubkey::new_unique()).unwrap_err(),
            VaultError::InvalidStakePool.into()
        );
    }

    struct FixedRate {
        credit: u64,
        payout: u64,
    }

    impl StakeAdapter for FixedRate {
        fn deposit_principal(&mut self, _principal_amount: u64) -> Result<u64> {
            Ok(self.credit)
        }

        fn withdraw_principal(&mut self, _receipt_amount: u64) -> Result<u64> {
            Ok(self.payout)
        }

        fn current_exchange_rate(&self) -> Result<u128> {
            Ok(EXCHANGE_RATE_SCALE)
        }
    }

    #[test]
    fn test_stake_zero_rules() {
        let mut adapter = FixedRate { credit: 0, payout: 0 };
        assert_eq!(adapter.stake(0).unwrap_err(), VaultError::StakeFailed.into());
        assert_eq!(adapter.stake(10).unwrap_err(), VaultError::StakeFailed.into());
        assert_eq!(adapter.unstake(10).unwrap_err(), VaultError::UnstakeFailed.into());
        assert_eq!(adapter.unstake(0).unwrap(), 0);

        let mut adapter = FixedRate { credit: 9, payout: 11 };
        assert_eq!(adapter.stake(10).unwrap(), 9);
        assert_eq!(adapter.unstake(10).unwrap(), 11);
        assert_eq!(adapter.exchange_rate_precision(), EXCHANGE_RATE_PRECISION);
    }
}
