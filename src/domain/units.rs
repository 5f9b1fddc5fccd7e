//! Size units and capacity helpers

use crate::error::{Error, Result};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

/// Size used when a request does not specify one: 100 GiB
pub const DEFAULT_VOLUME_SIZE_BYTES: u64 = 100 * GIB;

/// Round a requested size up to a whole number of allocation units
///
/// A zero size still allocates one unit. Sizes whose rounded value would
/// overflow are clamped to the largest whole multiple of the unit.
pub fn allocated_size(allocation_unit: u64, requested_bytes: u64) -> u64 {
    if allocation_unit == 0 {
        return requested_bytes;
    }
    let units = requested_bytes.div_ceil(allocation_unit).max(1);
    units
        .checked_mul(allocation_unit)
        .unwrap_or(u64::MAX / allocation_unit * allocation_unit)
}

/// Whole GiB in a byte count, rounding up
pub fn to_gib_ceil(bytes: u64) -> u64 {
    bytes.div_ceil(GIB)
}

/// Parse capacity string (e.g., "100Gi", "1Ti") to bytes
pub fn parse_capacity(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::CapacityParse("empty capacity string".into()));
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());

    let num_str = &s[..num_end];
    let unit_str = s[num_end..].trim();

    let num: f64 = num_str
        .parse()
        .map_err(|_| Error::CapacityParse(format!("invalid number: {}", num_str)))?;

    let multiplier: u64 = match unit_str.to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KI" | "KIB" => KIB,
        "M" | "MB" | "MI" | "MIB" => MIB,
        "G" | "GB" | "GI" | "GIB" => GIB,
        "T" | "TB" | "TI" | "TIB" => TIB,
        _ => {
            return Err(Error::CapacityParse(format!(
                "unknown unit: {}",
                unit_str
            )))
        }
    };

    Ok((num * multiplier as f64) as u64)
}
