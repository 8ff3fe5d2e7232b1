use num::traits::{Signed, ToPrimitive, Zero};
use num::BigInt;

/// Value of a numeric literal: `val * 10^exp`. Digits accumulate into a
/// big integer so a literal longer than the target width is detected at
/// conversion time instead of silently wrapping.
#[derive(Debug, PartialEq, Eq, Clone, Default, Hash)]
pub struct Number {
    pub val: BigInt,
    pub exp: BigInt,
}

impl Number {
    pub fn new<T>(val: T, exp: T) -> Self
    where
        T: Into<BigInt>,
    {
        Self {
            val: val.into(),
            exp: exp.into(),
        }
    }

    /// Parses the lexeme of a `Number` or `Float` token: decimal digits
    /// with at most one period. The scanner has already rejected
    /// anything else.
    pub fn parse(raw: &str) -> Self {
        let mut value = Number::default();
        let mut fractional = false;
        for c in raw.chars() {
            match c {
                '.' => fractional = true,
                '0'..='9' => {
                    value.val = value.val * 10 + (c as u8 - b'0');
                    if fractional {
                        value.exp -= 1;
                    }
                }
                _ => unreachable!("malformed number lexeme {raw:?}"),
            }
        }
        value
    }

    pub fn is_int(&self) -> bool {
        let mut exp = self.exp.clone();
        let mut val = self.val.clone();
        while !val.is_zero() && (&val % 10u8).is_zero() {
            val /= 10;
            exp += 1;
        }

        !exp.is_negative()
    }

    fn to_int(&self) -> Result<BigInt, TryFromNumberError> {
        let mut exp = self.exp.clone();
        let mut val = self.val.clone();
        while !val.is_zero() && (&val % 10u8).is_zero() {
            val /= 10;
            exp += 1;
        }

        if val.is_zero() {
            return Ok(BigInt::zero());
        }

        if exp.is_negative() {
            return Err(TryFromNumberError::NotInt);
        }

        let Ok(exp) = u32::try_from(exp) else {
            return Err(TryFromNumberError::OutOfRange);
        };
        if exp > 20 {
            return Err(TryFromNumberError::OutOfRange);
        }

        Ok(val * BigInt::from(10).pow(exp))
    }

    pub fn to_f64(&self) -> f64 {
        let val = self.val.to_f64().unwrap_or(f64::MAX);
        let exp = self.exp.to_i32().unwrap_or(i32::MAX);
        val * 10f64.powi(exp)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TryFromNumberError {
    NotInt,
    OutOfRange,
}

impl TryFrom<&Number> for i64 {
    type Error = TryFromNumberError;
    fn try_from(value: &Number) -> Result<Self, Self::Error> {
        let val = value.to_int()?;
        i64::try_from(val).map_err(|_| TryFromNumberError::OutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        let n = Number::parse("123");
        assert_eq!(n, Number::new(123, 0));
        assert!(n.is_int());
        assert_eq!(i64::try_from(&n), Ok(123));
    }

    #[test]
    fn test_parse_float() {
        let n = Number::parse("12.34");
        assert_eq!(n, Number::new(1234, -2));
        assert!(!n.is_int());
        assert_eq!(i64::try_from(&n), Err(TryFromNumberError::NotInt));
        assert!((n.to_f64() - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_fraction_zeros_are_integral() {
        let n = Number::parse("12.00");
        assert!(n.is_int());
        assert_eq!(i64::try_from(&n), Ok(12));
    }

    #[test]
    fn test_out_of_range() {
        let n = Number::parse("123456789012345678901234567890");
        assert_eq!(i64::try_from(&n), Err(TryFromNumberError::OutOfRange));
    }

    #[test]
    fn test_zero() {
        let n = Number::parse("0.0");
        assert_eq!(i64::try_from(&n), Ok(0));
    }
}
