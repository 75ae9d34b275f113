use num::{NumCast, ToPrimitive};

use crate::Result;

/// Absolute tolerance used for every nodata comparison.
pub const FLOAT_EQUAL_TOLERANCE: f64 = 1e-32;

/// Compares two numbers after promoting both operands to `f64`.
/// Values that cannot be represented as `f64` never compare equal.
#[inline]
pub fn float_equal<A: ToPrimitive, B: ToPrimitive>(a: A, b: B) -> bool {
    match (a.to_f64(), b.to_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < FLOAT_EQUAL_TOLERANCE,
        _ => false,
    }
}

/// True when the value has no fractional part.
pub fn is_integral(v: f64) -> bool {
    v.is_finite() && float_equal(v, v.round())
}

/// Check if a f64 value fits in a given numerical type.
pub fn fits_in_type<T: NumCast>(v: f64) -> bool {
    let x: Option<T> = NumCast::from(v);
    x.is_some()
}

/// Parses a trimmed numeric literal, used for header values and metadata coercion.
pub fn parse_number(text: &str) -> Result<f64> {
    Ok(text.trim().parse::<f64>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equal_uses_absolute_tolerance() {
        assert!(float_equal(-9999.0_f32, -9999_i32));
        assert!(float_equal(2.75_f64, 2.75_f32));
        assert!(!float_equal(1.0, 1.0 + 1e-12));
        assert!(!float_equal(f64::NAN, f64::NAN));
    }

    #[test]
    fn integral_detection() {
        assert!(is_integral(30.0));
        assert!(is_integral(-9999.0));
        assert!(!is_integral(0.5));
        assert!(!is_integral(f64::INFINITY));
    }

    #[test]
    fn type_fitting() {
        assert!(fits_in_type::<i32>(-9999.0));
        assert!(!fits_in_type::<u8>(-9999.0));
        assert!(!fits_in_type::<i32>(1e12));
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number(" 98.49 ").unwrap(), 98.49);
        assert!(parse_number("EPSG:4326").is_err());
    }
}
