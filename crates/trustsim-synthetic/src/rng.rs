// ─────────────────────────────────────────────────────────────────────
// Trust Simulation Kernel — Seeded RNG
// ─────────────────────────────────────────────────────────────────────

/// Minimal xorshift64 RNG. The seed is the only entropy source.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF_CAFE_BABE } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in [0, len). `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        (self.next_f64() * len as f64) as usize % len
    }
}
