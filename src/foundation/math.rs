/// Absolute tolerance for derived times (overlaps, ripple deltas) in seconds.
pub(crate) const TIME_EPSILON: f64 = 1e-9;

pub(crate) fn approx_zero(v: f64) -> bool {
    v.abs() <= TIME_EPSILON
}

/// FNV-1a over a sequence of typed fields, used to derive stable identifiers.
///
/// Strings are length-prefixed so `("ab", "c")` and `("a", "bc")` hash differently.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IdHasher(u64);

impl IdHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn str(self, s: &str) -> Self {
        self.bytes(&(s.len() as u64).to_le_bytes()).bytes(s.as_bytes())
    }

    pub(crate) fn char(self, c: char) -> Self {
        self.bytes(&u32::from(c).to_le_bytes())
    }

    /// Bit pattern, so `0.0` and `-0.0` differ.
    pub(crate) fn f64(self, v: f64) -> Self {
        self.bytes(&v.to_bits().to_le_bytes())
    }

    fn bytes(self, bytes: &[u8]) -> Self {
        let h = bytes.iter().fold(self.0, |h, &b| {
            (h ^ u64::from(b)).wrapping_mul(Self::PRIME)
        });
        Self(h)
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}
