//! Constant evaluators for the word-level cell vocabulary.
//!
//! Each function takes fully constant operands plus the relevant cell
//! parameters and produces the output bits. Widths are unrestricted:
//! arithmetic goes through arbitrary-precision integers and results are
//! truncated to `Y_WIDTH` in two's complement.
//!
//! Undefined bits follow the uniform rule: any `X`/`Z` bit in an operand
//! of an arithmetic, shift, or comparison operator yields an all-`X`
//! result (the exact comparators `$eqx`/`$nex` excepted — they compare
//! states bit for bit). Bitwise, reduction, and boolean operators use the
//! per-bit four-valued algebra instead.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use std::cmp::Ordering;
use vela_common::{Logic, LogicVec};
use vela_ir::CellType;

/// Resizes `v` to `width`, padding with the sign bit when `signed` and
/// with `0` otherwise. Truncates from the top when shrinking.
pub fn extend(v: &LogicVec, width: u32, signed: bool) -> LogicVec {
    let cur = v.width();
    if width <= cur {
        return v.slice(0, width);
    }
    let pad = if signed && cur > 0 {
        v.get(cur - 1)
    } else {
        Logic::Zero
    };
    let mut out = v.clone();
    for _ in cur..width {
        out.push(pad);
    }
    out
}

/// Interprets a fully defined vector as an integer.
fn to_bigint(v: &LogicVec, signed: bool) -> Option<BigInt> {
    if v.has_undef() {
        return None;
    }
    let mut bytes = vec![0u8; v.width().div_ceil(8) as usize];
    for i in 0..v.width() {
        if v.get(i) == Logic::One {
            bytes[(i / 8) as usize] |= 1 << (i % 8);
        }
    }
    let value = BigInt::from(BigUint::from_bytes_le(&bytes));
    if signed && v.width() > 0 && v.get(v.width() - 1) == Logic::One {
        Some(value - (BigInt::one() << v.width()))
    } else {
        Some(value)
    }
}

/// Truncates an integer to `width` bits, two's complement.
fn from_bigint(value: &BigInt, width: u32) -> LogicVec {
    let modulus = BigInt::one() << width;
    let mut m = value % &modulus;
    if m.sign() == Sign::Minus {
        m += &modulus;
    }
    let (_, bytes) = m.to_bytes_le();
    let mut v = LogicVec::zeros(width);
    for i in 0..width {
        let byte = bytes.get((i / 8) as usize).copied().unwrap_or(0);
        if (byte >> (i % 8)) & 1 == 1 {
            v.set(i, Logic::One);
        }
    }
    v
}

/// Collapses a vector to its boolean value: `One` if any bit is 1, `X`
/// if no bit is 1 but some are undefined, `Zero` otherwise.
fn logic_bool(v: &LogicVec) -> Logic {
    if v.any_one() {
        Logic::One
    } else if v.has_undef() {
        Logic::X
    } else {
        Logic::Zero
    }
}

/// A single-bit result zero-extended to `y_width`.
fn bool_result(bit: Logic, y_width: u32) -> LogicVec {
    extend(&LogicVec::from_logic(bit), y_width, false)
}

/// `$not` — per-bit complement of A extended to the output width.
pub fn const_not(a: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    extend(a, y_width, a_signed).iter().map(|b| !b).collect()
}

/// `$pos` — A resized to the output width per its signedness.
pub fn const_pos(a: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    extend(a, y_width, a_signed)
}

/// `$bu0` — zero-extension marker; sign-extends only signed operands.
pub fn const_bu0(a: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    extend(a, y_width, a_signed)
}

/// `$neg` — arithmetic negation.
pub fn const_neg(a: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    match to_bigint(a, a_signed) {
        Some(av) => from_bigint(&-av, y_width),
        None => LogicVec::undef(y_width),
    }
}

/// `$logic_not` — boolean complement.
pub fn const_logic_not(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(!logic_bool(a), y_width)
}

/// `$reduce_and`.
pub fn const_reduce_and(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(a.iter().fold(Logic::One, |acc, b| acc & b), y_width)
}

/// `$reduce_or`.
pub fn const_reduce_or(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(a.iter().fold(Logic::Zero, |acc, b| acc | b), y_width)
}

/// `$reduce_xor`.
pub fn const_reduce_xor(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(a.iter().fold(Logic::Zero, |acc, b| acc ^ b), y_width)
}

/// `$reduce_xnor`.
pub fn const_reduce_xnor(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(!a.iter().fold(Logic::Zero, |acc, b| acc ^ b), y_width)
}

/// `$reduce_bool` — same truth value as `$reduce_or`.
pub fn const_reduce_bool(a: &LogicVec, _a_signed: bool, y_width: u32) -> LogicVec {
    bool_result(logic_bool(a), y_width)
}

fn bitwise(
    a: &LogicVec,
    b: &LogicVec,
    a_signed: bool,
    b_signed: bool,
    y_width: u32,
    op: impl Fn(Logic, Logic) -> Logic,
) -> LogicVec {
    let a = extend(a, y_width, a_signed);
    let b = extend(b, y_width, b_signed);
    a.iter().zip(b.iter()).map(|(x, y)| op(x, y)).collect()
}

/// `$and`.
pub fn const_and(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bitwise(a, b, a_signed, b_signed, y_width, |x, y| x & y)
}

/// `$or`.
pub fn const_or(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bitwise(a, b, a_signed, b_signed, y_width, |x, y| x | y)
}

/// `$xor`.
pub fn const_xor(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bitwise(a, b, a_signed, b_signed, y_width, |x, y| x ^ y)
}

/// `$xnor`.
pub fn const_xnor(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bitwise(a, b, a_signed, b_signed, y_width, |x, y| !(x ^ y))
}

/// `$logic_and`.
pub fn const_logic_and(
    a: &LogicVec,
    b: &LogicVec,
    _a_signed: bool,
    _b_signed: bool,
    y_width: u32,
) -> LogicVec {
    bool_result(logic_bool(a) & logic_bool(b), y_width)
}

/// `$logic_or`.
pub fn const_logic_or(
    a: &LogicVec,
    b: &LogicVec,
    _a_signed: bool,
    _b_signed: bool,
    y_width: u32,
) -> LogicVec {
    bool_result(logic_bool(a) | logic_bool(b), y_width)
}

/// Reads the shift amount, saturating at `cap`.
fn shift_amount(b: &LogicVec, cap: u32) -> u32 {
    let mut amount: u64 = 0;
    for i in 0..b.width() {
        if b.get(i) == Logic::One {
            if i >= 32 {
                return cap;
            }
            amount |= 1u64 << i;
        }
    }
    amount.min(cap as u64) as u32
}

fn shift_left(a: &LogicVec, b: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    if a.has_undef() || b.has_undef() {
        return LogicVec::undef(y_width);
    }
    let a = extend(a, y_width, a_signed);
    let n = shift_amount(b, y_width);
    let mut out = LogicVec::zeros(y_width);
    for i in n..y_width {
        out.set(i, a.get(i - n));
    }
    out
}

fn shift_right(a: &LogicVec, b: &LogicVec, a_signed: bool, y_width: u32, arith: bool) -> LogicVec {
    if a.has_undef() || b.has_undef() {
        return LogicVec::undef(y_width);
    }
    let a = extend(a, y_width, a_signed);
    let n = shift_amount(b, y_width);
    let fill = if arith && a_signed && y_width > 0 {
        a.get(y_width - 1)
    } else {
        Logic::Zero
    };
    let mut out = LogicVec::filled(fill, y_width);
    for i in 0..y_width.saturating_sub(n) {
        out.set(i, a.get(i + n));
    }
    out
}

/// `$shl` — logical shift left.
pub fn const_shl(a: &LogicVec, b: &LogicVec, a_signed: bool, _b_signed: bool, y_width: u32) -> LogicVec {
    shift_left(a, b, a_signed, y_width)
}

/// `$sshl` — arithmetic shift left (identical to `$shl`).
pub fn const_sshl(a: &LogicVec, b: &LogicVec, a_signed: bool, _b_signed: bool, y_width: u32) -> LogicVec {
    shift_left(a, b, a_signed, y_width)
}

/// `$shr` — logical shift right.
pub fn const_shr(a: &LogicVec, b: &LogicVec, a_signed: bool, _b_signed: bool, y_width: u32) -> LogicVec {
    shift_right(a, b, a_signed, y_width, false)
}

/// `$sshr` — arithmetic shift right, filling with the sign bit.
pub fn const_sshr(a: &LogicVec, b: &LogicVec, a_signed: bool, _b_signed: bool, y_width: u32) -> LogicVec {
    shift_right(a, b, a_signed, y_width, true)
}

/// Compares two operands after aligning them to a common width. The
/// comparison is signed only when both operands are signed.
fn compare(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool) -> Option<Ordering> {
    let signed = a_signed && b_signed;
    let width = a.width().max(b.width());
    let av = to_bigint(&extend(a, width, signed), signed)?;
    let bv = to_bigint(&extend(b, width, signed), signed)?;
    Some(av.cmp(&bv))
}

fn compare_result(
    a: &LogicVec,
    b: &LogicVec,
    a_signed: bool,
    b_signed: bool,
    y_width: u32,
    accept: impl Fn(Ordering) -> bool,
) -> LogicVec {
    match compare(a, b, a_signed, b_signed) {
        Some(ord) => bool_result(Logic::from_bool(accept(ord)), y_width),
        None => LogicVec::undef(y_width),
    }
}

/// `$lt`.
pub fn const_lt(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_lt)
}

/// `$le`.
pub fn const_le(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_le)
}

/// `$gt`.
pub fn const_gt(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_gt)
}

/// `$ge`.
pub fn const_ge(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_ge)
}

/// `$eq` — undefined operand bits make the result undefined.
pub fn const_eq(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_eq)
}

/// `$ne` — undefined operand bits make the result undefined.
pub fn const_ne(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    compare_result(a, b, a_signed, b_signed, y_width, Ordering::is_ne)
}

/// Exact per-state equality for `$eqx`/`$nex`: `x` and `z` are distinct
/// values that compare equal only to themselves.
fn exact_eq(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool) -> bool {
    let signed = a_signed && b_signed;
    let width = a.width().max(b.width());
    let a = extend(a, width, signed);
    let b = extend(b, width, signed);
    let result = a.iter().zip(b.iter()).all(|(x, y)| x == y);
    result
}

/// `$eqx`.
pub fn const_eqx(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bool_result(
        Logic::from_bool(exact_eq(a, b, a_signed, b_signed)),
        y_width,
    )
}

/// `$nex`.
pub fn const_nex(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    bool_result(
        Logic::from_bool(!exact_eq(a, b, a_signed, b_signed)),
        y_width,
    )
}

fn arith(
    a: &LogicVec,
    b: &LogicVec,
    a_signed: bool,
    b_signed: bool,
    y_width: u32,
    op: impl Fn(BigInt, BigInt) -> Option<BigInt>,
) -> LogicVec {
    match (to_bigint(a, a_signed), to_bigint(b, b_signed)) {
        (Some(av), Some(bv)) => match op(av, bv) {
            Some(result) => from_bigint(&result, y_width),
            None => LogicVec::undef(y_width),
        },
        _ => LogicVec::undef(y_width),
    }
}

/// `$add`.
pub fn const_add(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |x, y| Some(x + y))
}

/// `$sub`.
pub fn const_sub(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |x, y| Some(x - y))
}

/// `$mul`.
pub fn const_mul(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |x, y| Some(x * y))
}

/// `$div` — truncating division; division by zero yields all-`X`.
pub fn const_div(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |x, y| {
        if y.is_zero() { None } else { Some(x / y) }
    })
}

/// `$mod` — remainder with the dividend's sign; modulo zero yields all-`X`.
pub fn const_mod(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |x, y| {
        if y.is_zero() { None } else { Some(x % y) }
    })
}

/// `$pow` — modular exponentiation into the output width; a negative
/// exponent yields all-`X`.
pub fn const_pow(a: &LogicVec, b: &LogicVec, a_signed: bool, b_signed: bool, y_width: u32) -> LogicVec {
    arith(a, b, a_signed, b_signed, y_width, |base, exp| {
        if exp.sign() == Sign::Minus {
            return None;
        }
        let modulus = BigInt::one() << y_width;
        let mut result = BigInt::one() % &modulus;
        let mut base = ((base % &modulus) + &modulus) % &modulus;
        let mut exp = exp.to_biguint().expect("non-negative exponent");
        while !exp.is_zero() {
            if (&exp % 2u32) == BigUint::one() {
                result = (&result * &base) % &modulus;
            }
            base = (&base * &base) % &modulus;
            exp >>= 1u32;
        }
        Some(result)
    })
}

/// Dispatches a unary word-level cell to its evaluator.
///
/// # Panics
///
/// Panics on a cell type without a unary evaluator.
pub fn eval_unary(ty: CellType, a: &LogicVec, a_signed: bool, y_width: u32) -> LogicVec {
    use CellType::*;
    let f = match ty {
        Not => const_not,
        Pos => const_pos,
        Bu0 => const_bu0,
        Neg => const_neg,
        LogicNot => const_logic_not,
        ReduceAnd => const_reduce_and,
        ReduceOr => const_reduce_or,
        ReduceXor => const_reduce_xor,
        ReduceXnor => const_reduce_xnor,
        ReduceBool => const_reduce_bool,
        other => panic!("no unary evaluator for cell type {other:?}"),
    };
    f(a, a_signed, y_width)
}

/// Dispatches a binary word-level cell to its evaluator.
///
/// # Panics
///
/// Panics on a cell type without a binary evaluator.
pub fn eval_binary(
    ty: CellType,
    a: &LogicVec,
    b: &LogicVec,
    a_signed: bool,
    b_signed: bool,
    y_width: u32,
) -> LogicVec {
    use CellType::*;
    let f = match ty {
        And => const_and,
        Or => const_or,
        Xor => const_xor,
        Xnor => const_xnor,
        LogicAnd => const_logic_and,
        LogicOr => const_logic_or,
        Shl => const_shl,
        Shr => const_shr,
        Sshl => const_sshl,
        Sshr => const_sshr,
        Lt => const_lt,
        Le => const_le,
        Eq => const_eq,
        Ne => const_ne,
        Eqx => const_eqx,
        Nex => const_nex,
        Gt => const_gt,
        Ge => const_ge,
        Add => const_add,
        Sub => const_sub,
        Mul => const_mul,
        Div => const_div,
        Mod => const_mod,
        Pow => const_pow,
        other => panic!("no binary evaluator for cell type {other:?}"),
    };
    f(a, b, a_signed, b_signed, y_width)
}
