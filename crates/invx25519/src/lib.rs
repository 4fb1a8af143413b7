//! Constant-time X25519 scalar multiplication with invertible private keys.
//!
//! This crate implements the X25519 Diffie-Hellman primitive over
//! Curve25519 with one extension: a sequence of private keys can be
//! collapsed into a single *inverse key* that cancels their combined effect
//! on a public point (see [`invkey`]).
//!
//! To make inversion possible, the key clamping differs from RFC 7748:
//! bits 0-2 and bit 255 are cleared as usual, but bit 254 is NOT forced to
//! 1, because an inverted key may have a zero there. Every private key is
//! therefore implicitly a multiple of 8 below 2^255.
//!
//! Inverse-key cancellation only holds for points on the prime-order
//! subgroup of Curve25519, not for points on its quadratic twist. No
//! runtime check is performed.
//!
//! All scalar multiplication and inversion routines take time independent
//! of the secret values involved.

mod digit;
mod fe;
mod mp;
mod scalar;
mod scalarmult;

pub mod cpu;

use thiserror::Error;

use crate::scalar::{Scalar, SC8_MONT};

/// An X25519 private key. Only bits 3-254 are used; see [`clamp`].
pub type PrivateKey = [u8; 32];

/// An X25519 public key: the little-endian X-coordinate of a curve point.
/// The top bit is ignored on input and always 0 on output.
pub type PublicKey = [u8; 32];

/// X-coordinate of the Curve25519 generator point.
const BASE_POINT: PublicKey = {
    let mut b = [0u8; 32];
    b[0] = 9;
    b
};

/// Scalar multiplication implementation types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImplType {
    /// Select the best implementation for the current machine.
    Auto,
    /// Portable Rust implementation.
    Portable,
    /// ARM64 assembly. Reserved; not compiled into this build.
    Arm64,
    /// AMD64 assembly. Reserved; not compiled into this build.
    Amd64,
    /// AMD64 assembly using MULX+ADX. Reserved; not compiled into this build.
    Amd64x,
}

/// The scalar multiplication contract every back-end satisfies: clamp the
/// key, compute x(key*P) from the point's X-coordinate, return the 32-byte
/// canonical encoding.
type ScmulFn = fn(key: &[u8; 32], point: &[u8; 32]) -> [u8; 32];

/// A scalar multiplication implementation.
pub struct Impl {
    scmul: ScmulFn,
    kind: ImplType,
}

static IMPL_PORTABLE: Impl = Impl {
    scmul: scalarmult::scalarmult_portable,
    kind: ImplType::Portable,
};

impl Impl {
    fn resolve(kind: ImplType) -> Option<&'static Impl> {
        match kind {
            ImplType::Portable => Some(&IMPL_PORTABLE),
            // assembly back-ends register here when they are compiled in
            _ => None,
        }
    }

    /// The type of this implementation.
    pub fn kind(&self) -> ImplType {
        self.kind
    }

    /// Calculates x(key*G), where G is the generator point of Curve25519.
    pub fn scmul_base(&self, key: &PrivateKey) -> PublicKey {
        (self.scmul)(key, &BASE_POINT)
    }

    /// Calculates x(key*P), where P is a given public key.
    pub fn scmul_key(&self, key: &PrivateKey, point: &PublicKey) -> PublicKey {
        (self.scmul)(key, point)
    }
}

fn best_impl_type() -> ImplType {
    #[cfg(target_arch = "x86_64")]
    {
        let cap = cpu::get_cpu_cap();
        if cap.contains(cpu::CpuCap::MULX)
            && cap.contains(cpu::CpuCap::ADX)
            && Impl::resolve(ImplType::Amd64x).is_some()
        {
            return ImplType::Amd64x;
        }
        if Impl::resolve(ImplType::Amd64).is_some() {
            return ImplType::Amd64;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if Impl::resolve(ImplType::Arm64).is_some() {
            return ImplType::Arm64;
        }
    }
    ImplType::Portable
}

/// Selects a scalar multiplication implementation.
///
/// With [`ImplType::Auto`], the best implementation supported by the
/// current machine is returned. A specific type yields `None` if it is not
/// available on this build/CPU.
pub fn select_impl(kind: ImplType) -> Option<&'static Impl> {
    let kind = match kind {
        ImplType::Auto => best_impl_type(),
        other => other,
    };
    let imp = Impl::resolve(kind);
    if imp.is_some() {
        log::debug!("selected {:?} scalar multiplication implementation", kind);
    }
    imp
}

/// Applies the library's key clamping: clears bits 0-2 and bit 255. Unlike
/// RFC 7748, bit 254 is not set, so inverted keys survive unchanged.
///
/// Every scalar multiplication clamps internally; this is exposed for
/// callers that want the canonical form of a key.
pub fn clamp(key: &PrivateKey) -> PrivateKey {
    let mut out = *key;
    out[0] &= 248;
    out[31] &= 127;
    out
}

/// Error returned by [`invkey`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvKeyError {
    /// The computed inverse is >= 2^252 and cannot be shifted left by
    /// 3 bits without breaking the clamping invariant. This happens with
    /// a probability of approx. 2^(-124).
    #[error("scalar inverse out of range")]
    InverseOutOfRange,
}

/// Calculates the inverse of a product of private keys.
///
/// Multiplying a public point by the returned key removes the effect of
/// multiplying it by every key in `keys`, in any order. With no input keys
/// the result is the scalar that undoes nothing: an identity key.
///
/// This only works for public keys on Curve25519 itself, not on its
/// quadratic twist.
pub fn invkey(keys: &[PrivateKey]) -> Result<PrivateKey, InvKeyError> {
    // 8 * keys[0] * keys[1] * ... in Montgomery form; the factor of 8
    // cancels the three bits the ladder's clamping forces to zero
    let mut prod_mont = SC8_MONT;

    for key in keys {
        let mut sc = Scalar::unpack(key);
        sc.0[0] &= 0xFFFF_FFFF_FFFF_FFF8;
        sc.0[3] &= 0x7FFF_FFFF_FFFF_FFFF;
        prod_mont = prod_mont.mul(&sc.to_mont());
    }

    let inv_mont = prod_mont.invert();
    let mut res = inv_mont.from_mont();

    if res.0[3] >= 0x1000_0000_0000_0000 {
        return Err(InvKeyError::InverseOutOfRange);
    }

    // the inverse is below 2^252, so the 3-bit shift cannot overflow the
    // clamped range
    res.lsh3();
    Ok(res.pack())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_portable() {
        let imp = select_impl(ImplType::Portable).unwrap();
        assert_eq!(imp.kind(), ImplType::Portable);
    }

    #[test]
    fn test_select_auto_resolves() {
        let imp = select_impl(ImplType::Auto).unwrap();
        assert_eq!(imp.kind(), ImplType::Portable);
    }

    #[test]
    fn test_assembly_backends_unavailable() {
        assert!(select_impl(ImplType::Arm64).is_none());
        assert!(select_impl(ImplType::Amd64).is_none());
        assert!(select_impl(ImplType::Amd64x).is_none());
    }

    #[test]
    fn test_clamp() {
        let key = [0xFFu8; 32];
        let clamped = clamp(&key);
        assert_eq!(clamped[0], 0xF8);
        assert_eq!(clamped[31], 0x7F);
        assert_eq!(clamped[1..31], key[1..31]);
        // bit 254 is left alone
        let zero_top = clamp(&[0u8; 32]);
        assert_eq!(zero_top, [0u8; 32]);
    }

    #[test]
    fn test_scmul_base_is_scmul_of_nine() {
        let imp = select_impl(ImplType::Portable).unwrap();
        let key = clamp(&[0x5A; 32]);
        let mut nine = [0u8; 32];
        nine[0] = 9;
        assert_eq!(imp.scmul_base(&key), imp.scmul_key(&key, &nine));
    }
}
