use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::foundation::error::{MontageError, MontageResult};

pub use kurbo::Rect;

/// Timeline time in seconds.
///
/// `Time` is totally ordered (via [`f64::total_cmp`]) so it can be used as a sort key and inside
/// ordered maps without `NaN` surprises. Editing code never produces non-finite values; see
/// [`crate::Timeline::validate`].
#[derive(Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Time(pub f64);

impl Time {
    /// Timeline origin.
    pub const ZERO: Self = Self(0.0);

    /// Build a time value from seconds.
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Seconds as `f64`.
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Clamp negative values to [`Time::ZERO`].
    pub fn clamp_non_negative(self) -> Self {
        if self.0 < 0.0 { Self::ZERO } else { self }
    }

    /// Multiply by a dimensionless factor (e.g. a playback rate).
    pub fn scale(self, factor: f64) -> Self {
        Self(self.0 * factor)
    }

    /// Neither NaN nor infinite.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Strictly greater than zero.
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Time {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Time {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Time {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Time {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// Output raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution (both sides > 0).
    pub fn new(width: u32, height: u32) -> MontageResult<Self> {
        if width == 0 || height == 0 {
            return Err(MontageError::validation("resolution width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Scale both sides, rounding to nearest and never going below 1x1.
    pub fn scaled(self, factor: f64) -> Self {
        fn side(v: u32, factor: f64) -> u32 {
            let s = (f64::from(v) * factor).round();
            if s < 1.0 { 1 } else { s as u32 }
        }
        Self {
            width: side(self.width, factor),
            height: side(self.height, factor),
        }
    }
}

/// Render quality tier. Selects the resolution the compiled graph is sized for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Quarter resolution, for fast scrubbing.
    Draft,
    /// Half resolution.
    #[default]
    Preview,
    /// Full resolution.
    Full,
}

impl Quality {
    /// Fraction of the base resolution rendered at this tier.
    pub fn scale_factor(self) -> f64 {
        match self {
            Self::Draft => 0.25,
            Self::Preview => 0.5,
            Self::Full => 1.0,
        }
    }

    /// Lowercase tier name, as accepted by `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Preview => "preview",
            Self::Full => "full",
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = MontageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "preview" => Ok(Self::Preview),
            "full" => Ok(Self::Full),
            other => Err(MontageError::validation(format!(
                "unknown quality '{other}'"
            ))),
        }
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel (premultiplied).
    pub r: u8,
    /// Green channel (premultiplied).
    pub g: u8,
    /// Blue channel (premultiplied).
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Opaque black, the default dip color.
    pub fn black() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// Convert straight-alpha RGBA8 to premultiplied.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
