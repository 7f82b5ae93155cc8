//! Hex color parsing for figure configurations.

use crate::error::{BucketError, Result};
use plotters::style::RGBColor;

/// Color used for buckets or groups without a configured color.
pub const FALLBACK_GREY: RGBColor = RGBColor(0xbe, 0xbe, 0xbe);

/// Parse a `#rrggbb` color.
pub fn parse_hex(hex: &str) -> Result<RGBColor> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BucketError::InvalidColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| BucketError::InvalidColor(hex.to_string()))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
