//! In-memory collaborators sharing one ledger, for driving the orchestrator
//! on the host.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anchor_lang::prelude::*;

use crate::{
    accounting_engine::AccountingEngine,
    burn_converter::BurnConverter,
    constants::*,
    custody::VaultCustody,
    math::{receipt_for_value, value_of_receipt},
    orchestrator::Orchestrator,
    stake_adapter::StakeAdapter,
    state::{DepositorLockup, VaultConfig},
};

pub const LOCKUP: i64 = 7 * SECONDS_PER_DAY;
pub const T0: i64 = 1_700_000_000;
pub const ONE: u64 = 1_000_000_000;

#[derive(Default)]
pub struct Ledger {
    pub rate: u128,

    // vault holdings
    pub vault_lamports: u64,
    pub vault_receipt: u64,
    pub vault_burn: u64,

    // engine state
    pub engine_receipt: u64,
    pub shares: HashMap<Pubkey, u64>,
    pub total_shares: u64,
    pub allowances: HashMap<(Pubkey, Pubkey), u64>,
    pub beneficiary: Pubkey,
    pub custodian: Pubkey,

    // everyone else
    pub receipt_balances: HashMap<Pubkey, u64>,
    pub burn_balances: HashMap<Pubkey, u64>,
    pub lamport_balances: HashMap<Pubkey, u64>,

    // failure knobs
    pub unstake_pays_nothing: bool,
    pub burn_mints_nothing: bool,
    pub engine_deposit_fails: bool,
    pub engine_reenters: bool,
    /// Engine previews withdrawals rounding shares down
    pub preview_rounds_down: bool,

    /// Lock state of every vault write-through, in order
    pub lock_writes: Vec<bool>,
    pub persisted: VaultConfig,
}

fn debit(balance: &mut u64, amount: u64) -> Result<()> {
    *balance = balance
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    Ok(())
}

impl Ledger {
    pub fn shares_of(&self, owner: &Pubkey) -> u64 {
        self.shares.get(owner).copied().unwrap_or_default()
    }

    pub fn receipt_of(&self, owner: &Pubkey) -> u64 {
        self.receipt_balances.get(owner).copied().unwrap_or_default()
    }

    pub fn burn_of(&self, owner: &Pubkey) -> u64 {
        self.burn_balances.get(owner).copied().unwrap_or_default()
    }

    pub fn lamports_of(&self, owner: &Pubkey) -> u64 {
        self.lamport_balances.get(owner).copied().unwrap_or_default()
    }

    fn convert_to_shares(&self, assets: u64, round_up: bool) -> u64 {
        if self.total_shares == 0 || self.engine_receipt == 0 {
            return assets;
        }
        let numerator = assets as u128 * self.total_shares as u128;
        let denominator = self.engine_receipt as u128;
        let shares = if round_up {
            (numerator + denominator - 1) / denominator
        } else {
            numerator / denominator
        };
        shares as u64
    }

    fn convert_to_assets(&self, shares: u64) -> u64 {
        if self.total_shares == 0 {
            return shares;
        }
        (shares as u128 * self.engine_receipt as u128 / self.total_shares as u128) as u64
    }

    fn spend_allowance(&mut self, owner: &Pubkey, caller: &Pubkey, shares: u64) -> Result<()> {
        if owner == caller {
            return Ok(());
        }
        let allowance = self.allowances.entry((*owner, *caller)).or_default();
        if *allowance < shares {
            return Err(ProgramError::MissingRequiredSignature.into());
        }
        *allowance -= shares;
        Ok(())
    }

    fn burn_and_pay(
        &mut self,
        owner: &Pubkey,
        receiver: &Pubkey,
        shares: u64,
        assets: u64,
    ) -> Result<()> {
        let held = self.shares.entry(*owner).or_default();
        debit(held, shares)?;
        debit(&mut self.total_shares, shares)?;
        debit(&mut self.engine_receipt, assets)?;
        // receiver token accounts are keyed by their owner
        if *receiver == self.custodian {
            self.vault_receipt += assets;
        } else {
            *self.receipt_balances.entry(*receiver).or_default() += assets;
        }
        Ok(())
    }
}

pub type SharedLedger = Rc<RefCell<Ledger>>;

/// Stake pool paying out at `Ledger::rate`
pub struct MockStakePool(pub SharedLedger);

impl StakeAdapter for MockStakePool {
    fn deposit_principal(&mut self, principal_amount: u64) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        debit(&mut l.vault_lamports, principal_amount)?;
        let receipt = receipt_for_value(principal_amount, l.rate)?;
        l.vault_receipt += receipt;
        Ok(receipt)
    }

    fn withdraw_principal(&mut self, receipt_amount: u64) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        debit(&mut l.vault_receipt, receipt_amount)?;
        if l.unstake_pays_nothing {
            return Ok(0);
        }
        let principal = value_of_receipt(receipt_amount, l.rate)?;
        l.vault_lamports += principal;
        Ok(principal)
    }

    fn current_exchange_rate(&self) -> Result<u128> {
        Ok(self.0.borrow().rate)
    }
}

/// 1:1 burn pool
pub struct MockBurnPool(pub SharedLedger);

impl BurnConverter for MockBurnPool {
    fn mint_burn_receipt(&mut self, principal_amount: u64) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        debit(&mut l.vault_lamports, principal_amount)?;
        if l.burn_mints_nothing {
            return Ok(0);
        }
        l.vault_burn += principal_amount;
        Ok(principal_amount)
    }
}

/// ERC-4626 style share engine
pub struct MockEngine(pub SharedLedger);

impl AccountingEngine for MockEngine {
    fn beneficiary(&self) -> Result<Pubkey> {
        Ok(self.0.borrow().beneficiary)
    }

    fn deposit(&mut self, assets: u64, receiver: &Pubkey) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        if l.engine_reenters {
            // a nested vault instruction loads the persisted record first
            let mut nested = l.persisted.clone();
            nested.acquire_lock()?;
        }
        if l.engine_deposit_fails {
            return Err(ProgramError::Custom(0xdead).into());
        }
        let shares = l.convert_to_shares(assets, false);
        debit(&mut l.vault_receipt, assets)?;
        l.engine_receipt += assets;
        l.total_shares += shares;
        *l.shares.entry(*receiver).or_default() += shares;
        Ok(shares)
    }

    fn withdraw(
        &mut self,
        assets: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
        caller: &Pubkey,
        _max_loss_bps: u16,
    ) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        let shares = l.convert_to_shares(assets, true);
        l.spend_allowance(owner, caller, shares)?;
        l.burn_and_pay(owner, receiver, shares, assets)?;
        Ok(shares)
    }

    fn redeem(
        &mut self,
        shares: u64,
        receiver: &Pubkey,
        owner: &Pubkey,
        caller: &Pubkey,
        _max_loss_bps: u16,
    ) -> Result<u64> {
        let mut l = self.0.borrow_mut();
        let assets = l.convert_to_assets(shares);
        l.spend_allowance(owner, caller, shares)?;
        l.burn_and_pay(owner, receiver, shares, assets)?;
        Ok(assets)
    }

    fn max_withdraw(&self, owner: &Pubkey) -> Result<u64> {
        let l = self.0.borrow();
        Ok(l.convert_to_assets(l.shares_of(owner)))
    }

    fn max_redeem(&self, owner: &Pubkey) -> Result<u64> {
        Ok(self.0.borrow().shares_of(owner))
    }

    fn preview_withdraw(&self, assets: u64) -> Result<u64> {
        let l = self.0.borrow();
        Ok(l.convert_to_shares(assets, !l.preview_rounds_down))
    }

    fn preview_redeem(&self, shares: u64) -> Result<u64> {
        Ok(self.0.borrow().convert_to_assets(shares))
    }

    fn total_assets(&self) -> Result<u64> {
        Ok(self.0.borrow().engine_receipt)
    }
}

pub struct MockCustody(pub SharedLedger);

impl VaultCustody for MockCustody {
    fn custodian(&self) -> Pubkey {
        self.0.borrow().custodian
    }

    fn receipt_balance(&self) -> Result<u64> {
        Ok(self.0.borrow().vault_receipt)
    }

    fn forward_burn_receipt(&mut self, receiver: &Pubkey, amount: u64) -> Result<()> {
        let mut l = self.0.borrow_mut();
        debit(&mut l.vault_burn, amount)?;
        *l.burn_balances.entry(*receiver).or_default() += amount;
        Ok(())
    }

    fn forward_principal(&mut self, receiver: &Pubkey, amount: u64) -> Result<()> {
        let mut l = self.0.borrow_mut();
        debit(&mut l.vault_lamports, amount)?;
        *l.lamport_balances.entry(*receiver).or_default() += amount;
        Ok(())
    }

    fn sync_vault_state(&mut self, vault: &VaultConfig) -> Result<()> {
        let mut l = self.0.borrow_mut();
        l.lock_writes.push(vault.reentrancy_locked);
        l.persisted = vault.clone();
        Ok(())
    }
}

pub type MockOrchestrator<'v> =
    Orchestrator<'v, MockStakePool, MockBurnPool, MockEngine, MockCustody>;

pub struct Harness {
    pub ledger: SharedLedger,
    pub vault: VaultConfig,
}

impl Harness {
    pub fn new() -> Self {
        let ledger = Ledger {
            rate: EXCHANGE_RATE_SCALE,
            beneficiary: Pubkey::new_unique(),
            custodian: Pubkey::new_unique(),
            ..Default::default()
        };
        let vault = VaultConfig {
            management: Pubkey::new_unique(),
            lockup_duration: LOCKUP,
            burn_conversion_enabled: true,
            ..Default::default()
        };
        Self {
            ledger: Rc::new(RefCell::new(ledger)),
            vault,
        }
    }

    pub fn orchestrator(&mut self) -> MockOrchestrator<'_> {
        Orchestrator::new(
            &mut self.vault,
            MockStakePool(self.ledger.clone()),
            MockBurnPool(self.ledger.clone()),
            MockEngine(self.ledger.clone()),
            MockCustody(self.ledger.clone()),
        )
    }

    pub fn beneficiary(&self) -> Pubkey {
        self.ledger.borrow().beneficiary
    }

    /// Moves 10^18-scaled principal per receipt to `rate`
    pub fn set_rate(&self, rate: u128) {
        self.ledger.borrow_mut().rate = rate;
    }

    /// Depositor pays `amount` lamports into vault custody, then deposits
    pub fn deposit(
        &mut self,
        lockup: &mut DepositorLockup,
        receiver: Pubkey,
        amount: u64,
        now: i64,
    ) -> Result<u64> {
        self.ledger.borrow_mut().vault_lamports += amount;
        self.orchestrator()
            .deposit(lockup, amount, amount, receiver, now)
    }

    /// Engine fees or yield credited to the beneficiary as fresh shares
    pub fn grant_beneficiary_shares(&self, receipt: u64) {
        let mut l = self.ledger.borrow_mut();
        let beneficiary = l.beneficiary;
        let shares = l.convert_to_shares(receipt, false);
        l.engine_receipt += receipt;
        l.total_shares += shares;
        *l.shares.entry(beneficiary).or_default() += shares;
    }

    /// Yield accrued by the engine, raising the value of every share
    pub fn grant_yield(&self, receipt: u64) {
        self.ledger.borrow_mut().engine_receipt += receipt;
    }

    /// Engine-side loss of receipt assets
    pub fn incur_loss(&self, receipt: u64) {
        let mut l = self.ledger.borrow_mut();
        l.engine_receipt = l.engine_receipt.saturating_sub(receipt);
    }

    pub fn approve(&self, owner: Pubkey, spender: Pubkey, shares: u64) {
        self.ledger
            .borrow_mut()
            .allowances
            .insert((owner, spender), shares);
    }
}

/// Principal value of `receipt` at the ledger's current rate
pub fn principal_for(ledger: &SharedLedger, receipt: u64) -> u64 {
    value_of_receipt(receipt, ledger.borrow().rate).unwrap()
}
