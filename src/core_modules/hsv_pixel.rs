// THEORY (HSV Pixel):
// The `HsvPixel` is the single-pixel unit of the detector. It carries one pixel
// converted to the hue/saturation/value space in the 8-bit layout that camera
// tooling and the usual CV libraries share:
//   • hue:        0..180, i.e. the hue angle in degrees divided by two
//   • saturation: 0..255, chroma relative to the brightest channel
//   • value:      0..255, the brightest channel
//
// Thresholds for game pieces are tuned in exactly this layout (an orange piece
// sits around H=5..25), so the conversion must agree with it to the rounding.
// Nothing here looks at neighbors; grouping happens in `mask` and `contour`.

pub type Channel = u8;
pub type Hue = u8;
pub type Saturation = u8;
pub type Value = u8;

/// Number of hue steps in the 8-bit layout (degrees / 2).
pub const HUE_RANGE: i32 = 180;

/// Fractional bits of the fixed-point conversion.
const FIXED_SHIFT: u32 = 12;

/// `x / 2^12`, rounded half up. The shift floors, so negative ties go up too.
fn fixed_point_round(scaled: i32) -> i32 {
    (scaled + (1 << (FIXED_SHIFT - 1))) >> FIXED_SHIFT
}

/// `255 / value` in fixed point; 0 for black.
fn saturation_divisor(value: i32) -> i32 {
    if value == 0 {
        return 0;
    }
    ((255 << FIXED_SHIFT) as f64 / value as f64).round_ties_even() as i32
}

/// `180 / (6 * chroma)` in fixed point; 0 for grays.
fn hue_divisor(chroma: i32) -> i32 {
    if chroma == 0 {
        return 0;
    }
    ((HUE_RANGE << FIXED_SHIFT) as f64 / (6 * chroma) as f64).round_ties_even() as i32
}

/// A pixel in 8-bit HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HsvPixel {
    pub hue: Hue,
    pub saturation: Saturation,
    pub value: Value,
}

impl HsvPixel {
    pub const fn new(hue: Hue, saturation: Saturation, value: Value) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts an RGB triple with the 8-bit fixed-point arithmetic of the
    /// usual CV libraries, so thresholds tuned there carry over exactly.
    ///
    /// - `value` is `max(R, G, B)`.
    /// - `saturation` is `255 * (max - min) / max`, rounded, and 0 for black.
    /// - `hue` is the color-wheel angle halved, rounded half up before negative
    ///   angles wrap, and 0 for grays.
    pub fn from_rgb(red: Channel, green: Channel, blue: Channel) -> Self {
        let (r, g, b) = (red as i32, green as i32, blue as i32);
        let maximum_channel = r.max(g).max(b);
        let minimum_channel = r.min(g).min(b);
        let chroma = maximum_channel - minimum_channel;

        let saturation = fixed_point_round(chroma * saturation_divisor(maximum_channel));

        // Hue scaled by six sectors of `chroma` each; red owns ties with the
        // other channels, then green.
        let sector_hue = if maximum_channel == r {
            g - b
        } else if maximum_channel == g {
            b - r + 2 * chroma
        } else {
            r - g + 4 * chroma
        };
        let mut hue = fixed_point_round(sector_hue * hue_divisor(chroma));
        if hue < 0 {
            hue += HUE_RANGE;
        }

        Self {
            hue: hue as Hue,
            saturation: saturation as Saturation,
            value: maximum_channel as Value,
        }
    }

    /// Inclusive per-channel range test, the same rule the mask uses.
    pub fn within(&self, lower: &HsvPixel, upper: &HsvPixel) -> bool {
        (lower.hue..=upper.hue).contains(&self.hue)
            && (lower.saturation..=upper.saturation).contains(&self.saturation)
            && (lower.value..=upper.value).contains(&self.value)
    }

    /// True when every channel of `self` is <= the matching channel of `other`.
    pub fn channelwise_le(&self, other: &HsvPixel) -> bool {
        self.hue <= other.hue && self.saturation <= other.saturation && self.value <= other.value
    }
}

impl From<[u8; 3]> for HsvPixel {
    fn from(channels: [u8; 3]) -> Self {
        Self::new(channels[0], channels[1], channels[2])
    }
}

impl From<HsvPixel> for [u8; 3] {
    fn from(pixel: HsvPixel) -> Self {
        [pixel.hue, pixel.saturation, pixel.value]
    }
}
