//! Field arithmetic over GF(p) with p = 2^255 - 19, radix-2^51 over 5 limbs.
//!
//! `add` and `sub` do not reduce their output; `mul` and `sq` accept such
//! unreduced operands (limbs up to a few bits above 2^51) and produce
//! reduced results. The ladder never stacks more than one add/sub between
//! multiplications, so limbs stay well below the 2^54 the multipliers can
//! absorb. `sub` adds 2p limb-wise before subtracting to avoid underflow.

use crate::digit::{load64_le, store64_le};

const MASK51: u64 = 0x7FFFFFFFFFFFF;

/// 2 * p, for subtraction without underflow
const P2: [u64; 5] = [
    0x7FFFFFFFFFFED * 2,
    0x7FFFFFFFFFFFF * 2,
    0x7FFFFFFFFFFFF * 2,
    0x7FFFFFFFFFFFF * 2,
    0x7FFFFFFFFFFFF * 2,
];

/// Field element in radix-2^51 representation (5 limbs).
#[derive(Clone, Copy)]
pub(crate) struct Fe(pub(crate) [u64; 5]);

impl Fe {
    pub(crate) const ZERO: Fe = Fe([0; 5]);
    pub(crate) const ONE: Fe = Fe([1, 0, 0, 0, 0]);

    /// Decode a 32-byte little-endian integer into a field element. The top
    /// bit of the last byte is ignored, so values in [2^255 - 19, 2^255)
    /// silently wrap.
    pub(crate) fn from_bytes(bytes: &[u8; 32]) -> Fe {
        Fe([
            load64_le(&bytes[0..]) & MASK51,
            (load64_le(&bytes[6..]) >> 3) & MASK51,
            (load64_le(&bytes[12..]) >> 6) & MASK51,
            (load64_le(&bytes[19..]) >> 1) & MASK51,
            (load64_le(&bytes[24..]) >> 12) & MASK51,
        ])
    }

    /// Encode as 32 little-endian bytes, fully reduced mod p. The output is
    /// the unique canonical representative; its top bit is always 0.
    pub(crate) fn to_bytes(self) -> [u8; 32] {
        let mut h = self.0;

        // two carry passes bring every limb below 2^51
        for _ in 0..2 {
            for i in 0..4 {
                h[i + 1] += h[i] >> 51;
                h[i] &= MASK51;
            }
            h[0] += 19 * (h[4] >> 51);
            h[4] &= MASK51;
        }

        // now h < 2^255; h >= p iff h + 19 >= 2^255, so q is 0 or 1
        let mut q = (h[0] + 19) >> 51;
        for i in 1..5 {
            q = (h[i] + q) >> 51;
        }

        // subtract q*p by adding q*19 and masking off bit 255
        h[0] += 19 * q;
        for i in 0..4 {
            h[i + 1] += h[i] >> 51;
            h[i] &= MASK51;
        }
        h[4] &= MASK51;

        // pack 5 x 51-bit limbs into 4 x u64
        let mut out = [0u8; 32];
        store64_le(&mut out[0..], h[0] | (h[1] << 51));
        store64_le(&mut out[8..], (h[1] >> 13) | (h[2] << 38));
        store64_le(&mut out[16..], (h[2] >> 26) | (h[3] << 25));
        store64_le(&mut out[24..], (h[3] >> 39) | (h[4] << 12));
        out
    }

    /// Field addition, without reduction.
    pub(crate) fn add(a: &Fe, b: &Fe) -> Fe {
        Fe([
            a.0[0] + b.0[0],
            a.0[1] + b.0[1],
            a.0[2] + b.0[2],
            a.0[3] + b.0[3],
            a.0[4] + b.0[4],
        ])
    }

    /// Field subtraction, without reduction. `b` must be reduced (limbs
    /// below 2^52 - 38); `a` may carry one add/sub worth of excess.
    pub(crate) fn sub(a: &Fe, b: &Fe) -> Fe {
        Fe([
            a.0[0] + P2[0] - b.0[0],
            a.0[1] + P2[1] - b.0[1],
            a.0[2] + P2[2] - b.0[2],
            a.0[3] + P2[3] - b.0[3],
            a.0[4] + P2[4] - b.0[4],
        ])
    }

    /// Field multiplication: a * b mod p.
    pub(crate) fn mul(a: &Fe, b: &Fe) -> Fe {
        let (a0, a1, a2, a3, a4) =
            (a.0[0] as u128, a.0[1] as u128, a.0[2] as u128, a.0[3] as u128, a.0[4] as u128);
        let (b0, b1, b2, b3, b4) =
            (b.0[0] as u128, b.0[1] as u128, b.0[2] as u128, b.0[3] as u128, b.0[4] as u128);

        // terms that overflow 5 limbs wrap around with factor 19,
        // since 2^255 = 19 mod p
        let b1_19 = 19 * b1;
        let b2_19 = 19 * b2;
        let b3_19 = 19 * b3;
        let b4_19 = 19 * b4;

        let mut t0 = a0 * b0 + a1 * b4_19 + a2 * b3_19 + a3 * b2_19 + a4 * b1_19;
        let mut t1 = a0 * b1 + a1 * b0 + a2 * b4_19 + a3 * b3_19 + a4 * b2_19;
        let mut t2 = a0 * b2 + a1 * b1 + a2 * b0 + a3 * b4_19 + a4 * b3_19;
        let mut t3 = a0 * b3 + a1 * b2 + a2 * b1 + a3 * b0 + a4 * b4_19;
        let mut t4 = a0 * b4 + a1 * b3 + a2 * b2 + a3 * b1 + a4 * b0;

        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;
        let carry = t1 >> 51; t1 &= MASK51 as u128; t2 += carry;
        let carry = t2 >> 51; t2 &= MASK51 as u128; t3 += carry;
        let carry = t3 >> 51; t3 &= MASK51 as u128; t4 += carry;
        let carry = t4 >> 51; t4 &= MASK51 as u128; t0 += carry * 19;
        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;

        Fe([t0 as u64, t1 as u64, t2 as u64, t3 as u64, t4 as u64])
    }

    /// Field squaring: a^2 mod p.
    pub(crate) fn sq(a: &Fe) -> Fe {
        let (a0, a1, a2, a3, a4) =
            (a.0[0] as u128, a.0[1] as u128, a.0[2] as u128, a.0[3] as u128, a.0[4] as u128);

        let d0 = 2 * a0;
        let d1 = 2 * a1;

        let a1_38 = 38 * a1;
        let a2_38 = 38 * a2;
        let a3_38 = 38 * a3;
        let a4_19 = 19 * a4;

        let mut t0 = a0 * a0 + a1_38 * a4 + a2_38 * a3;
        let mut t1 = d0 * a1 + a2_38 * a4 + 19 * a3 * a3;
        let mut t2 = d0 * a2 + a1 * a1 + a3_38 * a4;
        let mut t3 = d0 * a3 + d1 * a2 + a4_19 * a4;
        let mut t4 = d0 * a4 + d1 * a3 + a2 * a2;

        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;
        let carry = t1 >> 51; t1 &= MASK51 as u128; t2 += carry;
        let carry = t2 >> 51; t2 &= MASK51 as u128; t3 += carry;
        let carry = t3 >> 51; t3 &= MASK51 as u128; t4 += carry;
        let carry = t4 >> 51; t4 &= MASK51 as u128; t0 += carry * 19;
        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;

        Fe([t0 as u64, t1 as u64, t2 as u64, t3 as u64, t4 as u64])
    }

    /// Field multiplication by a small constant.
    pub(crate) fn mul_small(a: &Fe, c: u64) -> Fe {
        let c = c as u128;
        let mut t0 = a.0[0] as u128 * c;
        let mut t1 = a.0[1] as u128 * c;
        let mut t2 = a.0[2] as u128 * c;
        let mut t3 = a.0[3] as u128 * c;
        let mut t4 = a.0[4] as u128 * c;

        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;
        let carry = t1 >> 51; t1 &= MASK51 as u128; t2 += carry;
        let carry = t2 >> 51; t2 &= MASK51 as u128; t3 += carry;
        let carry = t3 >> 51; t3 &= MASK51 as u128; t4 += carry;
        let carry = t4 >> 51; t4 &= MASK51 as u128; t0 += carry * 19;
        let carry = t0 >> 51; t0 &= MASK51 as u128; t1 += carry;

        Fe([t0 as u64, t1 as u64, t2 as u64, t3 as u64, t4 as u64])
    }

    /// Constant-time conditional swap: exchanges a and b iff swap == 1.
    /// The same masked loads and stores run for either mask value.
    pub(crate) fn cswap(a: &mut Fe, b: &mut Fe, swap: u64) {
        let mask = 0u64.wrapping_sub(swap);
        for i in 0..5 {
            let t = mask & (a.0[i] ^ b.0[i]);
            a.0[i] ^= t;
            b.0[i] ^= t;
        }
    }

    /// Field inversion: a^(p-2) mod p via the standard addition chain for
    /// 2^255 - 21 (11 multiplications, 254 squarings).
    pub(crate) fn invert(a: &Fe) -> Fe {
        let z2 = Fe::sq(a); //                      a^2
        let z9 = {
            let t = Fe::sq(&z2); //                 a^4
            let t = Fe::sq(&t); //                  a^8
            Fe::mul(&t, a) //                       a^9
        };
        let z11 = Fe::mul(&z9, &z2); //             a^11
        let z_5_0 = {
            let t = Fe::sq(&z11); //                a^22
            Fe::mul(&t, &z9) //                     a^(2^5 - 1)
        };
        let z_10_0 = {
            let mut t = Fe::sq(&z_5_0);
            for _ in 1..5 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_5_0) //                  a^(2^10 - 1)
        };
        let z_20_0 = {
            let mut t = Fe::sq(&z_10_0);
            for _ in 1..10 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_10_0) //                 a^(2^20 - 1)
        };
        let z_40_0 = {
            let mut t = Fe::sq(&z_20_0);
            for _ in 1..20 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_20_0) //                 a^(2^40 - 1)
        };
        let z_50_0 = {
            let mut t = Fe::sq(&z_40_0);
            for _ in 1..10 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_10_0) //                 a^(2^50 - 1)
        };
        let z_100_0 = {
            let mut t = Fe::sq(&z_50_0);
            for _ in 1..50 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_50_0) //                 a^(2^100 - 1)
        };
        let z_200_0 = {
            let mut t = Fe::sq(&z_100_0);
            for _ in 1..100 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_100_0) //                a^(2^200 - 1)
        };
        let z_250_0 = {
            let mut t = Fe::sq(&z_200_0);
            for _ in 1..50 {
                t = Fe::sq(&t);
            }
            Fe::mul(&t, &z_50_0) //                 a^(2^250 - 1)
        };
        {
            let mut t = Fe::sq(&z_250_0);
            for _ in 1..5 {
                t = Fe::sq(&t); //                  a^(2^255 - 32)
            }
            Fe::mul(&t, &z11) //                    a^(2^255 - 21) = a^(p-2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(n: u8) -> Fe {
        let mut bytes = [0u8; 32];
        bytes[0] = n;
        Fe::from_bytes(&bytes)
    }

    #[test]
    fn test_roundtrip() {
        let mut bytes = [0u8; 32];
        bytes[0] = 9;
        bytes[13] = 0xA7;
        bytes[31] = 0x7E;
        let x = Fe::from_bytes(&bytes);
        assert_eq!(x.to_bytes(), bytes);
    }

    #[test]
    fn test_one() {
        let mut expected = [0u8; 32];
        expected[0] = 1;
        assert_eq!(Fe::ONE.to_bytes(), expected);
    }

    #[test]
    fn test_zero() {
        assert_eq!(Fe::ZERO.to_bytes(), [0u8; 32]);
    }

    #[test]
    fn test_from_bytes_ignores_top_bit() {
        let mut a = [0u8; 32];
        a[0] = 42;
        let mut b = a;
        b[31] = 0x80;
        assert_eq!(Fe::from_bytes(&a).to_bytes(), Fe::from_bytes(&b).to_bytes());
    }

    #[test]
    fn test_to_bytes_is_canonical() {
        // p + 2 encodes as 2
        let mut bytes = [0xFFu8; 32];
        bytes[0] = 0xEF;
        bytes[31] = 0x7F;
        let mut expected = [0u8; 32];
        expected[0] = 2;
        assert_eq!(Fe::from_bytes(&bytes).to_bytes(), expected);
    }

    #[test]
    fn test_mul_identity() {
        let a = fe(42);
        let mut expected = [0u8; 32];
        expected[0] = 42;
        assert_eq!(Fe::mul(&a, &Fe::ONE).to_bytes(), expected);
    }

    #[test]
    fn test_add_sub_cancel() {
        let a = fe(100);
        let b = fe(77);
        let sum = Fe::add(&a, &b);
        let back = Fe::mul(&Fe::sub(&sum, &b), &Fe::ONE);
        assert_eq!(back.to_bytes(), a.to_bytes());
    }

    #[test]
    fn test_sq_matches_mul() {
        let a = fe(123);
        assert_eq!(Fe::sq(&a).to_bytes(), Fe::mul(&a, &a).to_bytes());
    }

    #[test]
    fn test_mul_small() {
        let a = fe(3);
        let mut expected = [0u8; 32];
        // 3 * 121666 = 364998 = 0x591C6
        expected[0] = 0xC6;
        expected[1] = 0x91;
        expected[2] = 0x05;
        assert_eq!(Fe::mul_small(&a, 121666).to_bytes(), expected);
    }

    #[test]
    fn test_cswap() {
        let mut a = fe(1);
        let mut b = fe(2);
        Fe::cswap(&mut a, &mut b, 0);
        assert_eq!(a.to_bytes()[0], 1);
        Fe::cswap(&mut a, &mut b, 1);
        assert_eq!(a.to_bytes()[0], 2);
        assert_eq!(b.to_bytes()[0], 1);
    }

    #[test]
    fn test_invert() {
        let a = fe(9);
        let inv = Fe::invert(&a);
        let product = Fe::mul(&a, &inv);
        let mut expected = [0u8; 32];
        expected[0] = 1;
        assert_eq!(product.to_bytes(), expected);
    }
}
