use anchor_lang::prelude::*;
use anchor_lang::solana_program::{hash::hash, program::get_return_data};
use spl_token::solana_program::program_pack::Pack;

use crate::errors::VaultError;

/// Anchor instruction discriminator: sha256("global:<name>")[..8]
pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    discriminator
}

/// Instruction data for an Anchor-style call: discriminator followed by LE args
pub fn anchor_ix_data(name: &str, args: &[&[u8]]) -> Vec<u8> {
    let len = 8 + args.iter().map(|a| a.len()).sum::<usize>();
    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(&sighash(name));
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

/// Current SPL token balance, read straight from account data
pub fn token_amount(account: &AccountInfo) -> Result<u64> {
    let data = account.try_borrow_data()?;
    let token_account = spl_token::state::Account::unpack(&data)
        .map_err(|_| ProgramError::InvalidAccountData)?;
    Ok(token_account.amount)
}

/// Pass-through metas that keep the caller-supplied signer/writable flags
pub fn passthrough_metas(accounts: &[AccountInfo]) -> Vec<AccountMeta> {
    accounts
        .iter()
        .map(|info| AccountMeta {
            pubkey: info.key(),
            is_signer: info.is_signer,
            is_writable: info.is_writable,
        })
        .collect()
}

/// Splits `count` leading accounts off the remaining accounts
pub fn take_accounts<'a, 'info>(
    accounts: &'a [AccountInfo<'info>],
    count: usize,
) -> Result<(&'a [AccountInfo<'info>], &'a [AccountInfo<'info>])> {
    require!(accounts.len() >= count, VaultError::MissingAccounts);
    Ok(accounts.split_at(count))
}

fn return_data_from(program_id: &Pubkey) -> Result<Vec<u8>> {
    match get_return_data() {
        Some((returned_by, data)) if returned_by == *program_id => Ok(data),
        _ => Err(VaultError::InvalidReturnData.into()),
    }
}

pub fn return_u64(program_id: &Pubkey) -> Result<u64> {
    let data = return_data_from(program_id)?;
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(VaultError::InvalidReturnData)?;
    Ok(u64::from_le_bytes(bytes))
}

pub fn return_pubkey(program_id: &Pubkey) -> Result<Pubkey> {
    let data = return_data_from(program_id)?;
    let bytes: [u8; 32] = data
        .get(..32)
        .and_then(|b| b.try_into().ok())
        .ok_or(VaultError::InvalidReturnData)?;
    Ok(Pubkey::new_from_array(bytes))
}
