use alloy::primitives::U256;
use fastnum::{
    UD128, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Token amount converter between base units and decimals.
///
/// Order prices travel in base units (wei for 18-decimal tokens), while humans
/// and currency lists reason in decimals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

/// Decimal amount could not be represented in token base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid decimal amount: {0}")]
    Invalid(String),

    #[error("amount {0} has more than {1} fractional digits")]
    Precision(String, u8),
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    /// Converter for the 18-decimal native currency and its wrapped form.
    pub fn native() -> Self {
        Self::new(18)
    }

    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }

    /// Decimal amount of `base_units`, `None` if it does not fit `N` words.
    pub fn to_decimal<const N: usize>(&self, base_units: U256) -> Option<UnsignedDecimal<N>> {
        let digits = bint::UInt::<N>::from_le_slice(base_units.as_le_slice())?;
        Some(UnsignedDecimal::<N>::from_parts(
            digits,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        ))
    }

    /// Base units of `amount`, fractional digits beyond the token decimals
    /// are dropped.
    pub fn to_base_units<const N: usize>(&self, amount: UnsignedDecimal<N>) -> U256 {
        let scaled = amount.rescale(self.decimals as i16);
        U256::from_le_slice(scaled.digits().to_radix_le(256).as_slice())
    }

    /// Parses a human-readable amount such as `"0.002"` into base units.
    pub fn parse(&self, value: &str) -> Result<U256, AmountError> {
        let amount = UD128::from_str(value.trim(), Context::default())
            .map_err(|_| AmountError::Invalid(value.to_string()))?;
        let base_units = self.to_base_units(amount);
        match self.to_decimal::<2>(base_units) {
            Some(exact) if exact == amount => Ok(base_units),
            _ => Err(AmountError::Precision(value.to_string(), self.decimals())),
        }
    }

    /// Formats base units as a decimal string without trailing zeros.
    pub fn format(&self, base_units: U256) -> String {
        self.to_decimal::<4>(base_units)
            .map(|d| d.reduce().to_string())
            .unwrap_or_else(|| base_units.to_string())
    }
}
