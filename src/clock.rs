//! High-resolution timestamp source.
//!
//! Reads the platform cycle counter (x86 TSC, ARM virtual counter) for
//! latency measurement. Values are raw counter ticks, not nanoseconds.

/// Read the cycle counter.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn cycles() -> u64 {
    // SAFETY: RDTSC has no preconditions.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Read the virtual counter (CNTVCT_EL0).
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn cycles() -> u64 {
    let value: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on Linux.
    unsafe {
        core::arch::asm!("mrs {}, cntvct_el0", out(reg) value, options(nomem, nostack));
    }
    value
}

/// Monotonic-clock fallback for other architectures.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
pub fn cycles() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_monotonic_enough() {
        let a = cycles();
        // Do a little work so the counter has a chance to advance.
        let mut x = 0u64;
        for i in 0..10_000u64 {
            x = x.wrapping_add(i);
        }
        std::hint::black_box(x);
        let b = cycles();
        assert!(b >= a, "cycle counter went backwards: {} -> {}", a, b);
    }
}
