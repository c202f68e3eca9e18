use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price must not be negative, got {price}")]
    Negative { price: Decimal },
    #[error("Price {price} has more decimal places than exponent {expo} allows")]
    ExcessPrecision { price: Decimal, expo: i32 },
    #[error("Price {price} with exponent {expo} is out of range")]
    OutOfRange { price: Decimal, expo: i32 },
}

fn pow10(exp: u32) -> Option<Decimal> {
    Decimal::try_from_i128_with_scale(10i128.checked_pow(exp)?, 0).ok()
}

/// Converts a display price into the integer stored on chain, where
/// `price = raw * 10^expo`.
pub fn to_raw(price: Decimal, expo: i32) -> Result<u64, PriceError> {
    if price < Decimal::ZERO {
        return Err(PriceError::Negative { price });
    }
    let out_of_range = PriceError::OutOfRange { price, expo };
    let Some(factor) = pow10(expo.unsigned_abs()) else {
        return Err(out_of_range);
    };
    let scaled = if expo <= 0 {
        price.checked_mul(factor)
    } else {
        price.checked_div(factor)
    };
    let Some(scaled) = scaled else {
        return Err(out_of_range);
    };
    if !scaled.fract().is_zero() {
        return Err(PriceError::ExcessPrecision { price, expo });
    }
    scaled.to_u64().ok_or(out_of_range)
}

/// Inverse of [`to_raw`].
pub fn from_raw(raw: u64, expo: i32) -> Result<Decimal, PriceError> {
    let out_of_range = || PriceError::OutOfRange {
        price: Decimal::from(raw),
        expo,
    };
    if expo <= 0 {
        Decimal::try_from_i128_with_scale(i128::from(raw), expo.unsigned_abs())
            .map_err(|_| out_of_range())
    } else {
        pow10(expo.unsigned_abs())
            .and_then(|factor| Decimal::from(raw).checked_mul(factor))
            .ok_or_else(out_of_range)
    }
}
