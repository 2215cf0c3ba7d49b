use super::*;

fn int(x: i64) -> BigNum {
    BigNum::from_signed(x)
}

fn uint(x: u64) -> BigNum {
    BigNum::from_unsigned(x)
}

#[test]
fn add_then_sub_round_trips_without_overflow() {
    let cases = [
        (int(0), int(0)),
        (int(1), int(2)),
        (int(-5), int(12)),
        (int(-5), int(-12)),
        (int(i64::MAX), int(-1)),
        (uint(u64::MAX - 1), uint(1)),
    ];
    for (a, b) in cases {
        let (sum, overflow) = a.add(&b);
        assert!(!overflow, "unexpected overflow for {} + {}", a, b);
        let (back, overflow) = sum.sub(&b);
        assert!(!overflow);
        assert!(back.cmp_eq(&a), "({} + {}) - {} == {}", a, b, b, back);
    }
}

#[test]
fn self_subtraction_normalizes_to_positive_zero() {
    for x in [int(0), int(7), int(-7), int(i64::MIN), uint(u64::MAX)] {
        let (zero, overflow) = x.sub(&x);
        assert!(!overflow);
        assert!(zero.cmp_eq(&uint(0)));
        assert!(!zero.is_negative(), "zero must carry a positive sign");
    }
}

#[test]
fn signed_constructor_values_fit_in_64_signed_bits() {
    for x in [0, 1, -1, 42, i64::MAX, i64::MIN] {
        assert!(int(x).fits_in_bits(64, true), "{} should fit in i64", x);
    }
}

#[test]
fn fits_in_bits_boundaries() {
    assert!(uint(255).fits_in_bits(8, false));
    assert!(!uint(256).fits_in_bits(8, false));
    assert!(int(127).fits_in_bits(8, true));
    assert!(!int(128).fits_in_bits(8, true));
    assert!(int(-128).fits_in_bits(8, true));
    assert!(!int(-129).fits_in_bits(8, true));
    // a negative value never fits an unsigned width
    assert!(!int(-1).fits_in_bits(64, false));
    assert!(int(0).fits_in_bits(0, false));
}

#[test]
fn add_reports_magnitude_overflow() {
    let (_, overflow) = uint(u64::MAX).add(&uint(1));
    assert!(overflow);
    let (_, overflow) = int(-1).add(&int(1));
    assert!(!overflow);
}

#[test]
fn mul_sign_is_xor_of_signs() {
    let (product, overflow) = int(-3).mul(&int(4));
    assert!(!overflow);
    assert!(product.cmp_eq(&int(-12)));
    let (product, overflow) = int(-3).mul(&int(-4));
    assert!(!overflow);
    assert!(product.cmp_eq(&int(12)));
    let (_, overflow) = uint(u64::MAX).mul(&uint(2));
    assert!(overflow);
}

#[test]
fn division_semantics() {
    assert!(int(-12).div(&int(4)).unwrap().cmp_eq(&int(-3)));
    assert!(int(12).div(&int(4)).unwrap().cmp_eq(&int(3)));
    assert_eq!(int(1).div(&int(0)), Err(BigNumError::DivisionByZero));
}

#[test]
fn remainder_requires_non_negative_operands() {
    assert!(uint(13).rem(&uint(5)).unwrap().cmp_eq(&uint(3)));
    assert_eq!(int(-13).rem(&int(5)), Err(BigNumError::NegativeRemainder));
    assert_eq!(int(13).rem(&int(-5)), Err(BigNumError::NegativeRemainder));
    assert_eq!(uint(13).rem(&uint(0)), Err(BigNumError::DivisionByZero));
}

#[test]
fn comparison_laws() {
    let pairs = [
        (int(0), int(0)),
        (int(1), int(2)),
        (int(-3), int(2)),
        (int(-3), int(-2)),
        (int(5), int(5)),
    ];
    for (a, b) in pairs {
        assert_eq!(a.cmp_eq(&b), b.cmp_eq(&a), "eq must be symmetric");
        assert_eq!(a.cmp_lt(&b), b.cmp_gt(&a));
        assert_eq!(a.cmp_lte(&b), a.cmp_lt(&b) || a.cmp_eq(&b));
        assert_eq!(a.cmp_neq(&b), !a.cmp_eq(&b));
    }
}

#[test]
fn zero_compares_equal_regardless_of_history() {
    // a zero that went through negation still compares equal to zero
    let negated_zero = uint(0).negate();
    assert!(negated_zero.cmp_eq(&uint(0)));
    assert!(!negated_zero.is_negative());
}

#[test]
fn twos_complement_round_trip() {
    assert_eq!(int(-1).to_twos_complement(), u64::MAX);
    assert_eq!(int(-128).to_twos_complement() as i64, -128);
    assert_eq!(uint(7).to_twos_complement(), 7);
}

#[test]
fn bit_not_respects_width_and_signedness() {
    let x = uint(0b1010);
    let inverted = x.bit_not(8, false);
    assert!(inverted.cmp_eq(&uint(0b1111_0101)));

    // signed reinterpretation of an all-ones pattern
    let zero_inverted = uint(0).bit_not(64, true);
    assert!(zero_inverted.cmp_eq(&int(-1)));
}

#[test]
fn truncate_is_twos_complement_masking() {
    assert!(uint(0x1ff).truncate(8).cmp_eq(&uint(0xff)));
    // negative: mask the two's-complement pattern, reinterpret unsigned
    assert!(int(-1).truncate(8).cmp_eq(&uint(0xff)));
    assert!(int(-2).truncate(4).cmp_eq(&uint(0b1110)));
}

#[test]
fn int_float_casts() {
    assert_eq!(int(-3).cast_to_float(), BigNum::Float(-3.0));
    assert_eq!(uint(7).cast_to_float(), BigNum::Float(7.0));
    assert!(BigNum::from_float(-3.9).cast_to_int().cmp_eq(&int(-3)));
    assert!(BigNum::from_float(3.9).cast_to_int().cmp_eq(&uint(3)));
}

#[test]
fn float_arithmetic_is_ieee() {
    let a = BigNum::from_float(1.5);
    let b = BigNum::from_float(0.25);
    assert_eq!(a.add(&b), (BigNum::Float(1.75), false));
    assert_eq!(a.mul(&b), (BigNum::Float(0.375), false));
    assert_eq!(a.div(&b), Ok(BigNum::Float(6.0)));
    assert_eq!(a.rem(&b), Ok(BigNum::Float(0.0)));
    assert!(a.cmp_gt(&b));
}

#[test]
fn shifts_and_bitwise() {
    assert!(uint(0b0110).bit_and(&uint(0b0101)).cmp_eq(&uint(0b0100)));
    assert!(uint(0b0110).bit_or(&uint(0b0101)).cmp_eq(&uint(0b0111)));
    assert!(uint(0b0110).bit_xor(&uint(0b0101)).cmp_eq(&uint(0b0011)));
    assert!(uint(1).shl(&uint(4)).cmp_eq(&uint(16)));
    assert!(uint(16).shr(&uint(4)).cmp_eq(&uint(1)));
    assert!(uint(1).shl(&uint(64)).cmp_eq(&uint(0)));
}

#[test]
fn count_leading_and_trailing_zeros() {
    assert_eq!(uint(0).ctz(16), 16);
    assert_eq!(uint(0).clz(16), 16);
    assert_eq!(uint(1).ctz(16), 0);
    assert_eq!(uint(0b1000).ctz(16), 3);
    assert_eq!(uint(1).clz(16), 15);
    assert_eq!(uint(0b1000).clz(8), 4);

    // clz + popcount can never exceed the width
    for value in [0u64, 1, 2, 0b1010, 0xff, 0xdead] {
        let bn = uint(value);
        let popcount = value.count_ones();
        assert!(bn.clz(16) + popcount <= 16, "value {:#b}", value);
    }
}

#[test]
fn scalar_helpers_report_overflow() {
    let (v, overflow) = uint(10).increment_by_scalar(5);
    assert!(!overflow);
    assert!(v.cmp_eq(&uint(15)));
    let (_, overflow) = uint(u64::MAX).increment_by_scalar(1);
    assert!(overflow);
    let (v, overflow) = uint(6).multiply_by_scalar(7);
    assert!(!overflow);
    assert!(v.cmp_eq(&uint(42)));
    let (_, overflow) = uint(u64::MAX).multiply_by_scalar(2);
    assert!(overflow);
}
