use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Deposit payment must be non-zero and equal to the declared assets")]
    DepositFailed,

    #[msg("Withdrawal amount must be non-zero")]
    ZeroAmount,

    #[msg("Request exceeds the owner's maximum withdrawable amount")]
    ExceedsMax,

    #[msg("Request rounds down to zero shares")]
    ZeroShares,

    #[msg("Request rounds down to zero assets")]
    ZeroAssets,

    #[msg("Invalid max loss BPS, must be <= 10000")]
    InvalidMaxLoss,

    #[msg("Lockup duration must be positive and within the maximum")]
    InvalidLockupDuration,

    #[msg("Lockup period has not expired for this owner")]
    LockupPeriodNotExpired,

    #[msg("Unauthorized authority for this operation")]
    Unauthorized,

    #[msg("Yield source credited no receipt for the staked principal")]
    StakeFailed,

    #[msg("Yield source returned no principal for the unstaked receipt")]
    UnstakeFailed,

    #[msg("Burn pool minted no burn receipt")]
    BurnConversionFailed,

    #[msg("Accounting engine returned malformed data")]
    InvalidReturnData,

    #[msg("Stake pool account does not match the vault configuration")]
    InvalidStakePool,

    #[msg("Burn pool account does not match the vault configuration")]
    InvalidBurnPool,

    #[msg("Accounting state account does not match the vault configuration")]
    InvalidAccountingState,

    #[msg("Not enough remaining accounts for the external programs")]
    MissingAccounts,

    #[msg("No destination account supplied for forwarding")]
    MissingForwardAccount,

    #[msg("Re-entrant call into the vault")]
    ReentrantCall,

    #[msg("Math overflow")]
    MathOverflow,
}
