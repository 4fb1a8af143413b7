//! x86 CPU capability detection.
//!
//! The capability bitset is computed once per process from raw `cpuid`
//! leaves and cached. On non-x86 targets the set is empty.

use std::sync::OnceLock;

/// A bitset of CPU capabilities relevant to the assembly back-ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuCap(u32);

impl CpuCap {
    pub const RDTSCP: CpuCap = CpuCap(1);
    pub const AVX: CpuCap = CpuCap(2);
    pub const AVX2: CpuCap = CpuCap(4);
    pub const MULX: CpuCap = CpuCap(8);
    pub const ADX: CpuCap = CpuCap(16);

    /// Returns true if every flag in `other` is present in `self`.
    pub fn contains(self, other: CpuCap) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Returns the capabilities of the current CPU. The first call runs the
/// detection; later calls return the cached bitset.
pub fn get_cpu_cap() -> CpuCap {
    static CAP: OnceLock<CpuCap> = OnceLock::new();
    *CAP.get_or_init(detect)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn detect() -> CpuCap {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::__cpuid_count;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::__cpuid_count;

    let mut cap = 0u32;

    // SAFETY: cpuid is available on every x86-64 CPU and on any 32-bit CPU
    // this crate's baseline targets
    let info = unsafe { __cpuid_count(0, 0) };
    let num_ids = info.eax;
    if num_ids >= 1 {
        let info = unsafe { __cpuid_count(1, 0) };
        if info.ecx & (1 << 28) != 0 {
            cap |= CpuCap::AVX.0;
        }
    }
    if num_ids >= 7 {
        let info = unsafe { __cpuid_count(7, 0) };
        if info.ebx & (1 << 5) != 0 {
            cap |= CpuCap::AVX2.0;
        }
        if info.ebx & (1 << 8) != 0 {
            cap |= CpuCap::MULX.0;
        }
        if info.ebx & (1 << 19) != 0 {
            cap |= CpuCap::ADX.0;
        }
    }
    let info = unsafe { __cpuid_count(0x8000_0000, 0) };
    if info.eax >= 0x8000_0001 {
        let info = unsafe { __cpuid_count(0x8000_0001, 0) };
        if info.edx & (1 << 27) != 0 {
            cap |= CpuCap::RDTSCP.0;
        }
    }

    CpuCap(cap)
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn detect() -> CpuCap {
    CpuCap(0)
}
