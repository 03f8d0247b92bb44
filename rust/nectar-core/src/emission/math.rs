// Fixed-point helpers for emission curves
// Principle: integer-only, floor rounding, no silent wrap
use num_bigint::BigUint;

/// Fixed-point scale for curve fractions (1.0 == WAD)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// floor(a * b / denom)
///
/// Falls back to a 256-bit intermediate when `a * b` does not fit in u128.
/// Returns None on division by zero or when the quotient exceeds u128.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Option<u128> {
    if denom == 0 {
        return None;
    }

    if let Some(product) = a.checked_mul(b) {
        return Some(product / denom);
    }

    let quotient = BigUint::from(a) * BigUint::from(b) / BigUint::from(denom);
    u128::try_from(quotient).ok()
}

/// x^n for a WAD-scaled x in [0, WAD], floored at every step
///
/// Each step is non-decreasing in x, so the result is monotone in x.
pub fn pow_wad(x: u128, n: u32) -> u128 {
    let x = x.min(WAD);
    let mut acc = WAD;
    for _ in 0..n {
        // acc, x <= WAD so the product stays below 10^36
        acc = acc * x / WAD;
        if acc == 0 {
            break;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div_floor(10, 3, 4), Some(7));
        assert_eq!(mul_div_floor(1, 1, 0), None);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 10^24 * 10^27 overflows u128 but the quotient fits
        let cap = 1_000_000 * WAD;
        let weight = 1_000_000_000 * WAD;
        assert_eq!(mul_div_floor(cap, weight, weight), Some(cap));
        assert_eq!(mul_div_floor(cap, weight / 2, weight), Some(cap / 2));
    }

    #[test]
    fn test_mul_div_quotient_overflow() {
        assert_eq!(mul_div_floor(u128::MAX, u128::MAX, 1), None);
    }

    #[test]
    fn test_pow_wad_bounds() {
        assert_eq!(pow_wad(0, 0), WAD);
        assert_eq!(pow_wad(WAD, 30), WAD);
        assert_eq!(pow_wad(WAD / 2, 1), WAD / 2);
        assert_eq!(pow_wad(WAD / 2, 2), WAD / 4);
        assert_eq!(pow_wad(0, 3), 0);
    }

    proptest! {
        #[test]
        fn pow_wad_is_monotone(a in 0u128..=WAD, b in 0u128..=WAD, n in 0u32..40) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pow_wad(lo, n) <= pow_wad(hi, n));
        }

        #[test]
        fn mul_div_never_exceeds_numerator_ratio(a in 0u128..1u128 << 100, b in 0u128..1u128 << 100) {
            let denom = b.max(1);
            let q = mul_div_floor(a, b.min(denom), denom).unwrap();
            prop_assert!(q <= a);
        }
    }
}
