//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Monotonic time in milliseconds (native; browser hosts pass
//!   `performance.now()` stamps in themselves)
//! - Default RNG seeds

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::OnceLock;
    use std::time::{Instant, SystemTime, UNIX_EPOCH};

    static START: OnceLock<Instant> = OnceLock::new();

    /// Milliseconds since the first call in this process
    pub fn now_ms() -> f64 {
        START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
    }

    /// Seed derived from the wall clock
    pub fn default_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED)
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    pub fn default_seed() -> u64 {
        (js_sys::Date::now() * 1000.0) as u64 ^ (js_sys::Math::random() * u32::MAX as f64) as u64
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::{default_seed, now_ms};
#[cfg(target_arch = "wasm32")]
pub use web::default_seed;
