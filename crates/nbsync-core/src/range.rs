// ── Interface-range expansion ──
//
// `Gi0/1-4` → Gi0/1, Gi0/2, Gi0/3, Gi0/4
// `Vlan100-102` → Vlan100, Vlan101, Vlan102
//
// Anything that is not a whole-name match for one of the two patterns is
// returned unchanged as a single name.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SyncError;

/// `<prefix ending in '/'><start>-<end>`
static SLOT_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*/)(\d+)-(\d+)$").expect("slot range pattern"));

/// `<letters><start>-<end>`
static ALPHA_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+)-(\d+)$").expect("alpha range pattern"));

/// Most names a single declaration may expand to.
pub const MAX_RANGE_WIDTH: u32 = 4096;

/// Whether a declared name still carries a range marker.
pub fn is_range(name: &str) -> bool {
    name.contains('-')
}

/// Expand a compact range declaration into concrete interface names.
///
/// The result is never empty. A range whose start exceeds its end is
/// rejected with [`SyncError::DescendingRange`], one wider than
/// [`MAX_RANGE_WIDTH`] as malformed.
pub fn expand(range: &str) -> Result<Vec<String>, SyncError> {
    if !is_range(range) {
        return Ok(vec![range.to_owned()]);
    }

    let Some(caps) = SLOT_RANGE
        .captures(range)
        .or_else(|| ALPHA_RANGE.captures(range))
    else {
        return Ok(vec![range.to_owned()]);
    };

    let (Ok(start), Ok(end)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
        return Ok(vec![range.to_owned()]);
    };

    if start > end {
        return Err(SyncError::DescendingRange {
            range: range.to_owned(),
            start,
            end,
        });
    }

    let width = u64::from(end - start) + 1;
    if width > u64::from(MAX_RANGE_WIDTH) {
        return Err(SyncError::malformed(
            range,
            "name",
            format!("range spans {width} names (at most {MAX_RANGE_WIDTH})"),
        ));
    }

    let prefix = &caps[1];
    Ok((start..=end).map(|i| format!("{prefix}{i}")).collect())
}
