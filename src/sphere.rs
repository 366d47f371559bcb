//! Evenly spaced sines and cosines without calling `sin` per sample.
//!
//! Both tables rely on the angle-sum identity
//! `sin(a + 2δ) = 2·cos δ · sin(a + δ) − sin(a)` (likewise for cosine):
//! two seeds and one multiply-add per value.

/// Per-column latitude table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThetaTable {
    pub sin: Vec<f64>,
    pub cos: Vec<f64>,
}

impl ThetaTable {
    pub fn build(theta1: f64, delta: f64, len: usize) -> Self {
        let mut sin = Vec::with_capacity(len);
        let mut cos = Vec::with_capacity(len);
        let two_cos = 2.0 * delta.cos();
        for i in 0..len {
            let (s, c) = match i {
                0 => theta1.sin_cos(),
                1 => (theta1 + delta).sin_cos(),
                _ => (
                    sin[i - 1] * two_cos - sin[i - 2],
                    cos[i - 1] * two_cos - cos[i - 2],
                ),
            };
            sin.push(s);
            cos.push(c);
        }
        Self { sin, cos }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sin.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sin.is_empty()
    }
}

/// Per-row longitude, advanced once at the end of every source row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhiRecurrence {
    pub sin: f64,
    pub cos: f64,
    old_sin: [f64; 2],
    old_cos: [f64; 2],
    two_cos_delta: f64,
}

impl PhiRecurrence {
    pub fn new(phi1: f64, delta: f64) -> Self {
        let (s1, c1) = phi1.sin_cos();
        let (s2, c2) = (phi1 + delta).sin_cos();
        Self {
            sin: s1,
            cos: c1,
            old_sin: [s1, s2],
            old_cos: [c1, c2],
            two_cos_delta: 2.0 * delta.cos(),
        }
    }

    /// Step to the next row. `row` is the row just finished.
    pub fn advance(&mut self, row: usize) {
        if row == 0 {
            self.sin = self.old_sin[1];
            self.cos = self.old_cos[1];
            return;
        }
        self.sin = self.two_cos_delta * self.old_sin[1] - self.old_sin[0];
        self.cos = self.two_cos_delta * self.old_cos[1] - self.old_cos[0];
        self.old_sin = [self.old_sin[1], self.sin];
        self.old_cos = [self.old_cos[1], self.cos];
    }
}
