//! Detection quality gate for the hip channels.

use crate::{roles::Channel, table::RoleFrameTable, Error, Result};
use log::debug;

/// Longest run of consecutive `true` values
#[must_use]
pub fn longest_missing_run(missing: &[bool]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &is_missing in missing {
        if is_missing {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Check every hip channel against the gap tolerance
///
/// # Errors
///
/// Returns [`Error::InsufficientDetection`] for the first hip channel whose
/// longest missing run exceeds `max_allowed_gap`.
pub fn validate_detection(table: &RoleFrameTable, max_allowed_gap: usize) -> Result<()> {
    for channel in Channel::HIP {
        let longest_gap = longest_missing_run(&table.missing_mask(channel));
        debug!("Channel {} longest gap: {} frames", channel, longest_gap);
        if longest_gap > max_allowed_gap {
            return Err(Error::InsufficientDetection {
                channel: channel.column_name(),
                longest_gap,
                max_allowed_gap,
            });
        }
    }
    Ok(())
}
