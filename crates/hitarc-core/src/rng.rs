//! Seeded pseudo-random stream.
//!
//! `SeededRng` turns an opaque seed string into a reproducible stream of
//! floats, integers, picks and shuffles. Every generator in the crate draws
//! from one of these, so plan reproducibility depends on the exact call
//! order as well as the arithmetic below.

/// Added to the state on every step.
const STEP: u32 = 0x6D2B_79F5;

/// Divisor mapping a 32-bit output into `[0, 1)`.
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Number of distinct four-character base-36 fragments.
const FRAGMENT_SPACE: f64 = 1_679_616.0;

/// A caller-owned mulberry32 generator.
///
/// Forking a stream means deriving a new seed string; state is never copied.
#[derive(Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a generator from a seed string.
    ///
    /// The seed is folded with a rolling `hash * 31 + unit` over its UTF-16
    /// code units in wrapping 32-bit arithmetic. A zero hash becomes 1 so the
    /// empty seed still yields a usable stream.
    pub fn new(seed: &str) -> Self {
        Self {
            state: hash_seed(seed),
        }
    }

    /// Create a generator for one section of a plan, e.g. `("arith-", seed)`.
    pub fn namespaced(prefix: &str, seed: &str) -> Self {
        Self::new(&format!("{prefix}{seed}"))
    }

    /// Current raw state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(STEP);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        f64::from(t ^ (t >> 14)) / TWO_POW_32
    }

    /// Uniform integer in `[min, max]`, both ends inclusive.
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        (self.next_f64() * (max - min + 1) as f64).floor() as i64 + min
    }

    /// Uniform float in `[min, max)`.
    pub fn float(&mut self, min: f64, max: f64) -> f64 {
        self.next_f64() * (max - min) + min
    }

    /// Uniform float in `[min, max)` rounded to `dp` decimal places.
    pub fn float_dp(&mut self, min: f64, max: f64, dp: u32) -> f64 {
        round_dp(self.float(min, max), dp)
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on an empty collection");
        ((self.next_f64() * len as f64).floor() as usize).min(len.saturating_sub(1))
    }

    /// Pick one element.
    ///
    /// # Panics
    ///
    /// Panics if `items` is empty. Generators only call this on non-empty,
    /// validated banks.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "pick() on an empty slice");
        &items[self.index(items.len())]
    }

    /// Pick `n` distinct elements by removing them from a shrinking copy.
    ///
    /// Consumes exactly `min(n, items.len())` draws.
    pub fn pick_n<T: Clone>(&mut self, items: &[T], n: usize) -> Vec<T> {
        let mut pool = items.to_vec();
        let count = n.min(pool.len());
        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = self.index(pool.len());
            picked.push(pool.remove(idx));
        }
        picked
    }

    /// Fisher–Yates shuffle into a new vector.
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            out.swap(i, j.min(i));
        }
        out
    }

    /// Four-character base-36 fragment used to build item identifiers.
    pub fn fragment(&mut self) -> String {
        let n = (self.next_f64() * FRAGMENT_SPACE).floor() as u64;
        format!("{:0>4}", to_base36(n))
    }

    /// `prefix-XXXX` identifier.
    pub fn item_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", self.fragment())
    }
}

fn hash_seed(seed: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    match hash.unsigned_abs() {
        0 => 1,
        h => h,
    }
}

/// Round to `dp` decimal places.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}

/// Lowercase base-36 rendering.
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}
