//! Process-wide configuration, read once at pipeline-construction time.
//!
//! Mirrors the teacher's builder-style `with_*` knobs (see
//! `AdaptiveChunkStrategy::with_target_memory_ratio`), but applied at process scope since
//! the specification fixes these as environment-driven, read-once toggles rather than
//! per-pipeline settings.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// `jit_mode` toggle: `off` forbids dynamic codegen but still permits closure-composition
/// fusion (Variant A/B). Nagare never performs true runtime codegen, so this only affects
/// diagnostics today, but the switch is kept so pipelines built under `off` are reproducible
/// if a bytecode-VM fusion backend is added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitMode {
    Fast,
    Off,
}

#[derive(Debug)]
struct Config {
    fusion_enabled: AtomicBool,
    jit_off: AtomicBool,
    async_concurrency: AtomicUsize,
    unroll_threshold: AtomicUsize,
}

const DEFAULT_ASYNC_CONCURRENCY: usize = 256;
const DEFAULT_UNROLL_THRESHOLD: usize = 200_000;

static CONFIG: OnceLock<Config> = OnceLock::new();

fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        let fusion_enabled = !env_flag("DISABLE_FUSION");
        let jit_off = env_flag("DISABLE_JIT");
        tracing::info!(
            fusion_enabled,
            jit_off,
            "nagare configuration initialized from environment"
        );
        Config {
            fusion_enabled: AtomicBool::new(fusion_enabled),
            jit_off: AtomicBool::new(jit_off),
            async_concurrency: AtomicUsize::new(DEFAULT_ASYNC_CONCURRENCY),
            unroll_threshold: AtomicUsize::new(DEFAULT_UNROLL_THRESHOLD),
        }
    })
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Whether Variants B/C (closure-composition and array-kernel fusion) are enabled. When
/// `false`, only generic async iteration is used.
pub fn fusion_enabled() -> bool {
    config().fusion_enabled.load(Ordering::Relaxed)
}

pub fn jit_mode() -> JitMode {
    if config().jit_off.load(Ordering::Relaxed) {
        JitMode::Off
    } else {
        JitMode::Fast
    }
}

/// Maximum number of in-flight items for the async `toArray` fused path.
pub fn async_concurrency() -> usize {
    config().async_concurrency.load(Ordering::Relaxed)
}

/// Minimum array length before the 4-lane unrolled array kernel is chosen over scalar.
pub fn unroll_threshold() -> usize {
    config().unroll_threshold.load(Ordering::Relaxed)
}

/// Programmatic override, primarily for tests: environment variables are awkward to flip
/// per-test-case, so this bypasses them directly.
pub fn set_for_test(fusion_enabled: bool, jit_off: bool, async_concurrency: usize, unroll_threshold: usize) {
    let c = config();
    c.fusion_enabled.store(fusion_enabled, Ordering::Relaxed);
    c.jit_off.store(jit_off, Ordering::Relaxed);
    c.async_concurrency.store(async_concurrency, Ordering::Relaxed);
    c.unroll_threshold.store(unroll_threshold, Ordering::Relaxed);
}
