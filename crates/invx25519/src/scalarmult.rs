//! Portable constant-time Montgomery ladder on Curve25519.
//!
//! The ladder processes bit positions 254 down to 0 with the same operation
//! sequence for every bit; the conditional swap is deferred until the bit
//! value changes, so only the XOR-masked `cswap` ever touches the secret.

use crate::fe::Fe;

/// a24 = (A - 2) / 4 = 121666 for A = 486662
const A24: u64 = 121666;

/// Computes the X-coordinate of key*P, where P is given by its 32-byte
/// little-endian X-coordinate. The scalar is clamped locally: bits 0-2 and
/// bit 255 are cleared. Bit 254 is NOT set, diverging from RFC 7748, so
/// that inverted keys with a zero in that position work unchanged.
pub(crate) fn scalarmult_portable(key: &[u8; 32], point: &[u8; 32]) -> [u8; 32] {
    let mut e = *key;
    e[0] &= 248;
    e[31] &= 127;

    let x1 = Fe::from_bytes(point);
    let mut x2 = Fe::ONE;
    let mut z2 = Fe::ZERO;
    let mut x3 = x1;
    let mut z3 = Fe::ONE;

    let mut swap: u64 = 0;

    // bit 255 is always 0 after clamping
    for pos in (0..=254).rev() {
        let b = ((e[pos / 8] >> (pos & 7)) & 1) as u64;
        swap ^= b;
        Fe::cswap(&mut x2, &mut x3, swap);
        Fe::cswap(&mut z2, &mut z3, swap);
        swap = b;

        let mut tmp0 = Fe::sub(&x3, &z3);
        let mut tmp1 = Fe::sub(&x2, &z2);
        x2 = Fe::add(&x2, &z2);
        z2 = Fe::add(&x3, &z3);
        z3 = Fe::mul(&tmp0, &x2);
        z2 = Fe::mul(&z2, &tmp1);
        tmp0 = Fe::sq(&tmp1);
        tmp1 = Fe::sq(&x2);
        x3 = Fe::add(&z3, &z2);
        z2 = Fe::sub(&z3, &z2);
        x2 = Fe::mul(&tmp1, &tmp0);
        tmp1 = Fe::sub(&tmp1, &tmp0);
        z2 = Fe::sq(&z2);
        z3 = Fe::mul_small(&tmp1, A24);
        x3 = Fe::sq(&x3);
        tmp0 = Fe::add(&tmp0, &z3);
        z3 = Fe::mul(&x1, &z2);
        z2 = Fe::mul(&tmp1, &tmp0);
    }
    Fe::cswap(&mut x2, &mut x3, swap);
    Fe::cswap(&mut z2, &mut z3, swap);

    let z2 = Fe::invert(&z2);
    let x2 = Fe::mul(&x2, &z2);
    x2.to_bytes()
}
