use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// floor(a * b / denominator) through u128
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    a.checked_mul(b)
        .ok_or(VaultError::MathOverflow)?
        .checked_div(denominator)
        .ok_or_else(|| VaultError::MathOverflow.into())
}

/// Principal value of `receipt_amount` at `exchange_rate`, rounded down
pub fn value_of_receipt(receipt_amount: u64, exchange_rate: u128) -> Result<u64> {
    let value = mul_div(receipt_amount as u128, exchange_rate, EXCHANGE_RATE_SCALE)?;
    u64::try_from(value).map_err(|_| VaultError::MathOverflow.into())
}

/// Receipt amount worth `principal_value` at `exchange_rate`, rounded down
pub fn receipt_for_value(principal_value: u64, exchange_rate: u128) -> Result<u64> {
    require!(exchange_rate > 0, VaultError::MathOverflow);
    let receipt = mul_div(principal_value as u128, EXCHANGE_RATE_SCALE, exchange_rate)?;
    u64::try_from(receipt).map_err(|_| VaultError::MathOverflow.into())
}

/// Rate of a pool holding `total_lamports` against `token_supply` receipt units
pub fn exchange_rate_from_totals(total_lamports: u64, token_supply: u64) -> Result<u128> {
    if token_supply == 0 {
        return Ok(EXCHANGE_RATE_SCALE);
    }
    mul_div(total_lamports as u128, EXCHANGE_RATE_SCALE, token_supply as u128)
}

pub fn validate_max_loss(max_loss_bps: u16) -> Result<()> {
    require!(max_loss_bps <= MAX_BPS, VaultError::InvalidMaxLoss);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valuation_at_par() {
        assert_eq!(value_of_receipt(1_000_000_000, EXCHANGE_RATE_SCALE).unwrap(), 1_000_000_000);
        assert_eq!(receipt_for_value(1_000_000_000, EXCHANGE_RATE_SCALE).unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_valuation_after_appreciation() {
        // 1.05 principal per receipt
        let rate = EXCHANGE_RATE_SCALE + EXCHANGE_RATE_SCALE / 20;
        assert_eq!(value_of_receipt(1_000_000_000, rate).unwrap(), 1_050_000_000);
        // rounds down in the vault's favour
        assert_eq!(receipt_for_value(1_050_000_000, rate).unwrap(), 1_000_000_000);
        assert_eq!(receipt_for_value(1, rate).unwrap(), 0);
    }

    #[test]
    fn test_rate_from_pool_totals() {
        assert_eq!(exchange_rate_from_totals(0, 0).unwrap(), EXCHANGE_RATE_SCALE);
        assert_eq!(
            exchange_rate_from_totals(2_200, 2_000).unwrap(),
            EXCHANGE_RATE_SCALE + EXCHANGE_RATE_SCALE / 10
        );
        assert!(exchange_rate_from_totals(u64::MAX, 1).is_ok());
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(value_of_receipt(u64::MAX, EXCHANGE_RATE_SCALE * 2).is_err());
        assert!(receipt_for_value(1, 0).is_err());
    }

    #[test]
    fn test_max_loss_bounds() {
        assert!(validate_max_loss(0).is_ok());
        assert!(validate_max_loss(MAX_BPS).is_ok());
        assert_eq!(
            validate_max_loss(MAX_BPS + 1).unwrap_err(),
            VaultError::InvalidMaxLoss.into()
        );
    }
}
