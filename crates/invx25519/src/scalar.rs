//! Scalar arithmetic modulo the group order l = 2^252 + 27742317777372353535851937790883648493.
//!
//! Multiplication and inversion happen in the Montgomery representation
//! x*R mod l with R = 2^256. The reduction's final correction is a
//! mask-selected add-back, so no step branches on the operand values.

use crate::digit::{load64_le, store64_le};
use crate::mp;

/// l = 2^252 + 27742317777372353535851937790883648493
const GROUP_ORDER: [u64; 4] = [
    0x5812631A5CF5D3ED,
    0x14DEF9DEA2F79CD6,
    0x0000000000000000,
    0x1000000000000000,
];

/// 2^512 mod l
const MONT_MODULUS: [u64; 4] = [
    0xA40611E3449C0F01,
    0xD00E1BA768859347,
    0xCEEC73D217F5BE65,
    0x0399411B7C309A3D,
];

/// -l^(-1) mod 2^256
const MONT_RPRIME: [u64; 4] = [
    0xD2B51DA312547E1B,
    0xB1A206F2FDBA84FF,
    0x14E75438FFA36BEA,
    0x9DB6C6F26FE91836,
];

/// A 256-bit scalar as 4 little-endian limbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Scalar(pub(crate) [u64; 4]);

/// A scalar in Montgomery form: x*R mod l, canonical (below l).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MontScalar(pub(crate) [u64; 4]);

/// The Montgomery form of 8, the starting value of the inverse-key product.
pub(crate) const SC8_MONT: MontScalar = MontScalar([
    0x4EE0D5EBE20BDD6D,
    0xA5620A8D272931AA,
    0xFFFFFFFFFFFFFFF5,
    0x0FFFFFFFFFFFFFFF,
]);

/// Montgomery reduction of a 512-bit product: prod * 2^-256 mod l.
fn reduce_mont(prod: &[u64; 8]) -> MontScalar {
    let lo = [prod[0], prod[1], prod[2], prod[3]];
    let quot = mp::mul256_mod256(&lo, &MONT_RPRIME); // quot = prod * r' mod 2^256
    let temp = mp::mul256(&quot, &GROUP_ORDER); //       temp = quot * l
    let (temp, cout) = mp::add512(&temp, prod); //       temp = temp + prod

    // res = temp / 2^256
    let hi = [temp[4], temp[5], temp[6], temp[7]];

    // constant-time subtraction of l: the mask is all-ones iff res < l,
    // selecting the add-back without a branch
    let (res, bout) = mp::sub256(&hi, &GROUP_ORDER);
    let mask = cout.wrapping_sub(bout);

    let addback = [
        GROUP_ORDER[0] & mask,
        GROUP_ORDER[1] & mask,
        GROUP_ORDER[2] & mask,
        GROUP_ORDER[3] & mask,
    ];
    let (res, _) = mp::add256(&res, &addback);
    MontScalar(res)
}

impl Scalar {
    /// Load a scalar from its 32-byte little-endian encoding.
    pub(crate) fn unpack(key: &[u8; 32]) -> Scalar {
        Scalar([
            load64_le(&key[0..]),
            load64_le(&key[8..]),
            load64_le(&key[16..]),
            load64_le(&key[24..]),
        ])
    }

    /// Write the 32-byte little-endian encoding.
    pub(crate) fn pack(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        store64_le(&mut key[0..], self.0[0]);
        store64_le(&mut key[8..], self.0[1]);
        store64_le(&mut key[16..], self.0[2]);
        store64_le(&mut key[24..], self.0[3]);
        key
    }

    /// Convert to the Montgomery representation.
    pub(crate) fn to_mont(&self) -> MontScalar {
        reduce_mont(&mp::mul256(&self.0, &MONT_MODULUS))
    }

    /// In-place left shift by 3 bits, without reduction. The caller must
    /// guarantee the value is below 2^253.
    pub(crate) fn lsh3(&mut self) {
        mp::shl256(&mut self.0, 3);
    }
}

impl MontScalar {
    /// Convert back from the Montgomery representation.
    pub(crate) fn from_mont(&self) -> Scalar {
        let mut prod = [0u64; 8];
        prod[..4].copy_from_slice(&self.0);
        Scalar(reduce_mont(&prod).0)
    }

    /// Montgomery multiplication: self * other * 2^-256 mod l.
    pub(crate) fn mul(&self, other: &MontScalar) -> MontScalar {
        reduce_mont(&mp::mul256(&self.0, &other.0))
    }

    /// Montgomery squaring.
    fn sqr(&self) -> MontScalar {
        reduce_mont(&mp::sqr256(&self.0))
    }

    /// Modular inverse via the fixed addition chain for l - 2
    /// (<https://briansmith.org/ecc-inversion-addition-chains-01>).
    pub(crate) fn invert(&self) -> MontScalar {
        fn nsqr_mul(mut acc: MontScalar, n: u32, m: &MontScalar) -> MontScalar {
            for _ in 0..n {
                acc = acc.sqr();
            }
            acc.mul(m)
        }

        // windowed powers, named by the binary exponent
        let x1 = *self;
        let x10 = x1.sqr();
        let x100 = x10.sqr();
        let x11 = x10.mul(&x1);
        let x101 = x10.mul(&x11);
        let x111 = x10.mul(&x101);
        let x1001 = x10.mul(&x111);
        let x1011 = x10.mul(&x1001);
        let x1111 = x100.mul(&x1011);

        let mut inv = x1.mul(&x1111); // x10000
        inv = nsqr_mul(inv, 123 + 3, &x101);
        inv = nsqr_mul(inv, 2 + 2, &x11);
        inv = nsqr_mul(inv, 1 + 4, &x1111);
        inv = nsqr_mul(inv, 1 + 4, &x1111);
        inv = nsqr_mul(inv, 4, &x1001);
        inv = nsqr_mul(inv, 2, &x11);
        inv = nsqr_mul(inv, 1 + 4, &x1111);
        inv = nsqr_mul(inv, 1 + 3, &x101);
        inv = nsqr_mul(inv, 3 + 3, &x101);
        inv = nsqr_mul(inv, 3, &x111);
        inv = nsqr_mul(inv, 1 + 4, &x1111);
        inv = nsqr_mul(inv, 2 + 3, &x111);
        inv = nsqr_mul(inv, 2 + 2, &x11);
        inv = nsqr_mul(inv, 1 + 4, &x1011);
        inv = nsqr_mul(inv, 2 + 4, &x1011);
        inv = nsqr_mul(inv, 6 + 4, &x1001);
        inv = nsqr_mul(inv, 2 + 2, &x11);
        inv = nsqr_mul(inv, 3 + 2, &x11);
        inv = nsqr_mul(inv, 3 + 2, &x11);
        inv = nsqr_mul(inv, 1 + 4, &x1001);
        inv = nsqr_mul(inv, 1 + 3, &x111);
        inv = nsqr_mul(inv, 2 + 4, &x1111);
        inv = nsqr_mul(inv, 1 + 4, &x1011);
        inv = nsqr_mul(inv, 3, &x101);
        inv = nsqr_mul(inv, 2 + 4, &x1111);
        inv = nsqr_mul(inv, 3, &x101);
        inv = nsqr_mul(inv, 1 + 2, &x11);
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: u64) -> Scalar {
        Scalar([n, 0, 0, 0])
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let sc = Scalar::unpack(&bytes);
        assert_eq!(sc.pack(), bytes);
    }

    #[test]
    fn test_mont_roundtrip_small() {
        for n in [0u64, 1, 2, 8, 0xFFFF_FFFF_FFFF_FFFF] {
            let sc = scalar(n);
            assert_eq!(sc.to_mont().from_mont(), sc);
        }
    }

    #[test]
    fn test_mont_roundtrip_large_canonical() {
        // l - 1, the largest canonical scalar
        let sc = Scalar([
            GROUP_ORDER[0] - 1,
            GROUP_ORDER[1],
            GROUP_ORDER[2],
            GROUP_ORDER[3],
        ]);
        assert_eq!(sc.to_mont().from_mont(), sc);
    }

    #[test]
    fn test_mont_reduces_group_order_to_zero() {
        let sc = Scalar(GROUP_ORDER);
        assert_eq!(sc.to_mont().from_mont(), scalar(0));
    }

    #[test]
    fn test_sc8_mont_constant() {
        assert_eq!(scalar(8).to_mont(), SC8_MONT);
        assert_eq!(SC8_MONT.from_mont(), scalar(8));
    }

    #[test]
    fn test_mul_small_values() {
        let a = scalar(7).to_mont();
        let b = scalar(6).to_mont();
        assert_eq!(a.mul(&b).from_mont(), scalar(42));
    }

    #[test]
    fn test_invert_times_self_is_one() {
        for n in [3u64, 8, 12345, 0xDEAD_BEEF] {
            let m = scalar(n).to_mont();
            let inv = m.invert();
            assert_eq!(m.mul(&inv).from_mont(), scalar(1));
        }
    }

    #[test]
    fn test_lsh3() {
        let mut sc = Scalar([1, 0, 1 << 61, 0]);
        sc.lsh3();
        assert_eq!(sc, Scalar([8, 0, 0, 1]));
    }
}
