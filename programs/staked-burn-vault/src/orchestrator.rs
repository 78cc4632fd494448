//! Deposit / withdraw / redeem state machine.
//!
//! The orchestrator is generic over its four collaborators so the same
//! sequencing runs against CPI-backed adapters on-chain and in-memory ones in
//! tests. Every mutating entry point runs under the vault's re-entrancy lock.

use anchor_lang::prelude::*;

use crate::{
    accounting_engine::AccountingEngine,
    burn_converter::BurnConverter,
    constants::NO_WITHDRAW_LIMIT,
    custody::VaultCustody,
    errors::VaultError,
    events::WithdrawalConverted,
    math::{validate_max_loss, value_of_receipt},
    stake_adapter::StakeAdapter,
    state::{DepositorLockup, VaultConfig},
};

/// Which of the two disjoint exit paths an owner takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitRoute {
    /// Yield beneficiary: no lockup, paid in the receipt asset by the engine
    Beneficiary,
    /// Everyone else: lockup gated, unstaked and converted to burn receipts
    #[default]
    Depositor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Withdraw,
    Redeem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    /// Assets for a withdraw, shares for a redeem
    pub amount: u64,
    pub receiver: Pubkey,
    pub owner: Pubkey,
    pub caller: Pubkey,
    pub max_loss_bps: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitOutcome {
    pub route: ExitRoute,
    pub shares_burned: u64,
    /// Receipt asset released by the engine
    pub assets_released: u64,
    pub principal_unstaked: u64,
    /// Burn receipts (or lamports when conversion is off) sent to the receiver
    pub forwarded: u64,
    /// Whether `WithdrawalConverted` was raised
    pub converted: bool,
}

impl ExitOutcome {
    /// Instruction return value: shares for withdraw, assets for redeem
    pub fn returned(&self, kind: ExitKind) -> u64 {
        match kind {
            ExitKind::Withdraw => self.shares_burned,
            ExitKind::Redeem => self.assets_released,
        }
    }
}

pub fn route_for(beneficiary: &Pubkey, owner: &Pubkey) -> ExitRoute {
    if owner == beneficiary {
        ExitRoute::Beneficiary
    } else {
        ExitRoute::Depositor
    }
}

/// Lockup-derived withdraw limit; the beneficiary is never limited
pub fn withdraw_limit(
    vault: &VaultConfig,
    beneficiary: &Pubkey,
    lockup: &DepositorLockup,
    owner: &Pubkey,
    now: i64,
) -> u64 {
    match route_for(beneficiary, owner) {
        ExitRoute::Beneficiary => NO_WITHDRAW_LIMIT,
        ExitRoute::Depositor => lockup.available_withdraw_limit(now, vault.lockup_duration),
    }
}

pub struct Orchestrator<'v, S, B, A, C> {
    pub vault: &'v mut VaultConfig,
    pub stake: S,
    pub burn: B,
    pub engine: A,
    pub custody: C,
}

impl<'v, S, B, A, C> Orchestrator<'v, S, B, A, C>
where
    S: StakeAdapter,
    B: BurnConverter,
    A: AccountingEngine,
    C: VaultCustody,
{
    pub fn new(vault: &'v mut VaultConfig, stake: S, burn: B, engine: A, custody: C) -> Self {
        Self {
            vault,
            stake,
            burn,
            engine,
            custody,
        }
    }

    /// Runs `op` holding the re-entrancy lock. The lock is written through
    /// before `op` makes any external call and released on every exit path.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.vault.acquire_lock()?;
        let result = self
            .custody
            .sync_vault_state(self.vault)
            .and_then(|_| op(self));
        self.vault.release_lock();
        result
    }

    pub fn deposit(
        &mut self,
        lockup: &mut DepositorLockup,
        payment: u64,
        assets: u64,
        receiver: Pubkey,
        now: i64,
    ) -> Result<u64> {
        self.guarded(|o| o.process_deposit(lockup, payment, assets, &receiver, now))
    }

    pub fn withdraw(
        &mut self,
        lockup: &DepositorLockup,
        request: ExitRequest,
        now: i64,
    ) -> Result<ExitOutcome> {
        self.guarded(|o| o.process_exit(ExitKind::Withdraw, lockup, &request, now))
    }

    pub fn redeem(
        &mut self,
        lockup: &DepositorLockup,
        request: ExitRequest,
        now: i64,
    ) -> Result<ExitOutcome> {
        self.guarded(|o| o.process_exit(ExitKind::Redeem, lockup, &request, now))
    }

    pub fn available_withdraw_limit(
        &self,
        lockup: &DepositorLockup,
        owner: &Pubkey,
        now: i64,
    ) -> Result<u64> {
        let beneficiary = self.engine.beneficiary()?;
        Ok(withdraw_limit(self.vault, &beneficiary, lockup, owner, now))
    }

    pub fn current_exchange_rate(&self) -> Result<u128> {
        self.stake.current_exchange_rate()
    }

    pub fn exchange_rate_precision(&self) -> u8 {
        self.stake.exchange_rate_precision()
    }

    /// Principal value of everything the engine holds
    pub fn total_value(&self) -> Result<u64> {
        value_of_receipt(self.engine.total_assets()?, self.stake.current_exchange_rate()?)
    }

    fn process_deposit(
        &mut self,
        lockup: &mut DepositorLockup,
        payment: u64,
        assets: u64,
        receiver: &Pubkey,
        now: i64,
    ) -> Result<u64> {
        require!(payment > 0 && payment == assets, VaultError::DepositFailed);

        let receipt_received = self.stake.stake(assets)?;

        // committed only once the engine has minted
        let mut staged = lockup.clone();
        staged.record_deposit(now);

        let shares = self.engine.deposit(receipt_received, receiver)?;

        *lockup = staged;
        Ok(shares)
    }

    fn process_exit(
        &mut self,
        kind: ExitKind,
        lockup: &DepositorLockup,
        request: &ExitRequest,
        now: i64,
    ) -> Result<ExitOutcome> {
        validate_max_loss(request.max_loss_bps)?;

        let beneficiary = self.engine.beneficiary()?;
        match route_for(&beneficiary, &request.owner) {
            ExitRoute::Beneficiary => self.exit_beneficiary(kind, request),
            ExitRoute::Depositor => self.exit_depositor(kind, lockup, request, now),
        }
    }

    /// Straight pass-through to the engine, paying the receiver directly
    fn exit_beneficiary(&mut self, kind: ExitKind, request: &ExitRequest) -> Result<ExitOutcome> {
        let outcome = match kind {
            ExitKind::Withdraw => {
                let shares =
                    self.engine
                        .withdraw(request.amount, &request.receiver, &request.owner, &request.caller, request.max_loss_bps)?;
                ExitOutcome {
                    route: ExitRoute::Beneficiary,
                    shares_burned: shares,
                    assets_released: request.amount,
                    ..Default::default()
                }
            }
            ExitKind::Redeem => {
                let assets =
                    self.engine
                        .redeem(request.amount, &request.receiver, &request.owner, &request.caller, request.max_loss_bps)?;
                ExitOutcome {
                    route: ExitRoute::Beneficiary,
                    shares_burned: request.amount,
                    assets_released: assets,
                    ..Default::default()
                }
            }
        };
        Ok(outcome)
    }

    fn exit_depositor(
        &mut self,
        kind: ExitKind,
        lockup: &DepositorLockup,
        request: &ExitRequest,
        now: i64,
    ) -> Result<ExitOutcome> {
        require!(request.amount > 0, VaultError::ZeroAmount);

        match kind {
            ExitKind::Withdraw => {
                let max = self.engine.max_withdraw(&request.owner)?;
                require!(request.amount <= max, VaultError::ExceedsMax);
                let shares = self.engine.preview_withdraw(request.amount)?;
                require!(shares > 0, VaultError::ZeroShares);
            }
            ExitKind::Redeem => {
                let max = self.engine.max_redeem(&request.owner)?;
                require!(request.amount <= max, VaultError::ExceedsMax);
                let assets = self.engine.preview_redeem(request.amount)?;
                require!(assets > 0, VaultError::ZeroAssets);
            }
        }

        self.require_unlocked(lockup, now)?;

        // the engine pays the vault, never the receiver, on this path
        let custodian = self.custody.custodian();
        let receipt_before = self.custody.receipt_balance()?;
        let engine_result = match kind {
            ExitKind::Withdraw => {
                self.engine
                    .withdraw(request.amount, &custodian, &request.owner, &request.caller, request.max_loss_bps)?
            }
            ExitKind::Redeem => {
                self.engine
                    .redeem(request.amount, &custodian, &request.owner, &request.caller, request.max_loss_bps)?
            }
        };
        let receipt_after = self.custody.receipt_balance()?;

        let shares_burned = match kind {
            ExitKind::Withdraw => engine_result,
            ExitKind::Redeem => request.amount,
        };
        let mut outcome = ExitOutcome {
            route: ExitRoute::Depositor,
            shares_burned,
            assets_released: receipt_after.saturating_sub(receipt_before),
            ..Default::default()
        };

        self.convert_and_forward(lockup, request, now, &mut outcome)?;
        Ok(outcome)
    }

    /// unstake -> burn pool -> forward
    fn convert_and_forward(
        &mut self,
        lockup: &DepositorLockup,
        request: &ExitRequest,
        now: i64,
        outcome: &mut ExitOutcome,
    ) -> Result<()> {
        // authoritative gate, independent of the pre-checks
        self.require_unlocked(lockup, now)?;

        if outcome.assets_released == 0 {
            return Ok(());
        }

        let principal = self.stake.unstake(outcome.assets_released)?;
        outcome.principal_unstaked = principal;

        if self.vault.burn_conversion_enabled {
            let minted = self.burn.deposit_for_burn(principal)?;
            require!(minted > 0, VaultError::BurnConversionFailed);
            self.custody.forward_burn_receipt(&request.receiver, minted)?;
            outcome.forwarded = minted;
        } else {
            self.custody.forward_principal(&request.receiver, principal)?;
            outcome.forwarded = principal;
        }

        emit!(WithdrawalConverted {
            owner: request.owner,
            assets_released: outcome.assets_released,
            shares_burned: outcome.shares_burned,
        });
        outcome.converted = true;
        Ok(())
    }

    fn require_unlocked(&self, lockup: &DepositorLockup, now: i64) -> Result<()> {
        require!(
            lockup.is_withdraw_eligible(now, self.vault.lockup_duration),
            VaultError::LockupPeriodNotExpired
        );
        Ok(())
    }
}
