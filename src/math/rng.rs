//! Seedable pseudo-random bits for the surface jitter.

/// Xorshift generator yielding 64 bits of randomness per step.
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct Xorshift64(pub u64);

impl Xorshift64 {
    pub const DEFAULT_SEED: u64 = 378682147834061;

    /// A zero seed would stick at zero forever, so it is replaced by
    /// [`DEFAULT_SEED`](Self::DEFAULT_SEED).
    pub fn from_seed(seed: u64) -> Self {
        Self(if seed == 0 { Self::DEFAULT_SEED } else { seed })
    }

    pub fn next_bits(&mut self) -> u64 {
        let Self(x) = self;
        *x ^= *x << 13;
        *x ^= *x >> 7;
        *x ^= *x << 17;
        *x
    }

    /// A 15-bit value, `0..=0x7fff`.
    pub fn rand15(&mut self) -> i32 {
        (self.next_bits() >> 49) as i32
    }

    pub fn coin(&mut self) -> bool {
        self.next_bits() & 1 == 1
    }
}

impl Default for Xorshift64 {
    fn default() -> Self {
        Self(Self::DEFAULT_SEED)
    }
}
