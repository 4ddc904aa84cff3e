//! Pure functions choosing the next fragment to load in a fragment list.

use std::cmp::Ordering;

use crate::track::Fragment;

/// Returns the fragment of `fragments` covering `target_time`, or `None` if none does.
///
/// The fragment following `previous` is preferred when it still covers `target_time`, so
/// playback continuity is kept even when fragment boundaries drift slightly from the
/// buffered ranges.
///
/// `tolerance`, in seconds, lets a fragment ending just after `target_time` be skipped
/// in favor of the next one: with a `10s` fragment `[0, 10]` and a `target_time` of
/// `9.99`, the fragment starting at `10` is the one wanted.
pub(crate) fn select_by_time<'a>(
    previous: Option<&Fragment>,
    fragments: &'a [Fragment],
    target_time: f64,
    tolerance: f64,
) -> Option<&'a Fragment> {
    let first = fragments.first()?;
    let next = match previous {
        Some(prev) => prev
            .sn
            .checked_add(1)
            .and_then(|sn| sn.checked_sub(first.sn))
            .and_then(|idx| fragments.get(idx as usize)),
        None if target_time == 0. && first.start == 0. => Some(first),
        None => None,
    };

    if let Some(next) = next {
        if compare_to_time(next, target_time, tolerance) == Ordering::Equal {
            return Some(next);
        }
    }

    fragments
        .binary_search_by(|candidate| compare_to_time(candidate, target_time, tolerance))
        .ok()
        .map(|idx| &fragments[idx])
}

/// Returns the first fragment of `fragments` covering the absolute `anchor_timestamp`, in
/// seconds, or `None` if none does.
///
/// Unlike start times, which are relative to their track, timestamps can be compared
/// across tracks. This is thus the way to go to find back the right fragment after a
/// track switch or a discontinuity.
pub(crate) fn select_by_timestamp(
    fragments: &[Fragment],
    anchor_timestamp: Option<f64>,
    tolerance: f64,
) -> Option<&Fragment> {
    let anchor = anchor_timestamp?;
    let first = fragments.first()?;
    let last = fragments.last()?;
    if anchor < first.program_date_time.unwrap_or(0.) {
        return None;
    }
    if anchor >= last.end_timestamp().unwrap_or(0.) {
        return None;
    }
    fragments.iter().find(|candidate| {
        let tolerance = candidate_tolerance(candidate, tolerance);
        candidate.end_timestamp().unwrap_or(0.) - tolerance > anchor
    })
}

/// Situates `candidate` relatively to `target_time`:
///   - `Ordering::Less` if it ends before it (tolerance included),
///   - `Ordering::Greater` if it starts after it,
///   - `Ordering::Equal` if it is the fragment to load for `target_time`.
///
/// ```text
///              frag start               frag end
///                  |-----------------------------|
///              <--->                         <--->
///  ...--------><-----------------------------><---------....
/// previous frag         matching fragment         next frag
///     Less                   Equal                 Greater
/// ```
fn compare_to_time(candidate: &Fragment, target_time: f64, tolerance: f64) -> Ordering {
    let tolerance = candidate_tolerance(candidate, tolerance);
    if candidate.end() - tolerance <= target_time {
        Ordering::Less
    } else if candidate.start - tolerance > target_time && candidate.start != 0. {
        // The first fragment is never considered too late, even with a negative target
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Small fragments should not be skipped entirely because of the tolerance.
fn candidate_tolerance(candidate: &Fragment, tolerance: f64) -> f64 {
    tolerance.min(candidate.duration)
}
