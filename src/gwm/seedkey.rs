//! Seed-to-key derivation for the gateway's security access challenge.
//!
//! Reverse engineered from gateway traffic. The arithmetic is bit exact,
//! including every intermediate truncation to 32 bits; the gateway computes
//! the same fixed-point approximations, so replacing the reciprocal
//! multiply with a plain `%` would produce wrong keys on some inputs.

/// 32-bit rendition of `((a as u64 * b as u64) >> 45) as u32`: split both
/// operands into 16-bit halves and combine the partial products. Carries
/// lost to 32-bit truncation are part of the contract.
fn umul_lsr45(a: u32, b: u32) -> u32 {
    let i = a & 0xffff;
    let a = a >> 16;
    let j = b & 0xffff;
    let b = b >> 16;
    ((i.wrapping_mul(j) >> 16)
        .wrapping_add(i.wrapping_mul(b).wrapping_add(j.wrapping_mul(a)))
        >> 16)
        .wrapping_add(a.wrapping_mul(b))
        >> 13
}

/// `x mod 0x3EAB` via the reciprocal-multiply trick. 0x82B87F05 is the
/// fixed-point reciprocal of the modulus scaled by 2^45.
fn mod_3eab(x: u32) -> u32 {
    x.wrapping_sub(umul_lsr45(x, 0x82b8_7f05).wrapping_mul(0x3eab))
}

/// `(seed & 0xFFFF) ^ 0x12E5 mod 0x3EAB` by square-and-multiply, with
/// every reduction going through `mod_3eab`.
fn pow_mod_3eab(seed: u32) -> u32 {
    let mut reg = seed & 0xffff;
    let mut acc: u32 = 1;
    let mut exp: u32 = 0x12e5;
    while exp != 0 {
        if exp & 1 != 0 {
            acc = mod_3eab(acc.wrapping_mul(reg));
        }
        reg = mod_3eab(reg.wrapping_mul(reg));
        exp >>= 1;
    }
    acc
}

/// Derives the key for the first security access level (seed request 0x41,
/// key submission 0x42).
pub fn level1(seed: u32) -> u32 {
    let acc = pow_mod_3eab(seed);
    let i5 = ((acc >> 8).wrapping_add(acc)) ^ 0x0f;
    let i6 = (acc ^ (i5 << 8)) & 0xff00;
    let i7 = ((acc ^ i5) & 0xff) | i6;
    (i7 | (i7 << 16)) ^ 0xad07_79e2
}

/// Feedback shift: the feedback bit is a nested cascade of XORs and shifts
/// over the running value, not a set of independent taps. Bits shifted out
/// of the top are discarded.
fn feedback_shift(seed: u32, count: u32) -> u32 {
    let mut v = seed;
    for _ in 0..count {
        let bit = (((((((v >> 6) ^ v) >> 12) ^ v) >> 10) ^ v) >> 2) & 1;
        v = (v << 1) | bit;
    }
    v
}

/// Derives the key for the second security access level (seed request 0x01,
/// key submission 0x02). The iteration count depends only on the top byte
/// of the seed.
pub fn level2(seed: u32) -> u32 {
    let count = 0x25 + (((seed >> 0x18) & 0x1c) ^ 0x08);
    feedback_shift(seed, count) ^ 0xdc8f_e1ae
}
