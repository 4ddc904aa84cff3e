use std::slice::Iter;

/// Represent a range of time, from a start to an end, generally in seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Returns the start time of the range
    #[cfg(test)]
    pub(crate) fn start(&self) -> f64 {
        self.start
    }

    /// Returns the end time of the range
    #[cfg(test)]
    pub(crate) fn end(&self) -> f64 {
        self.end
    }

    /// Returns `true` if `pos` is between the start and the end of this range, both
    /// included.
    pub(crate) fn contains(&self, pos: f64) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Summary of what is buffered around a given position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BufferedInfo {
    /// Amount of buffer ahead of the position, in seconds.
    pub(crate) len: f64,
    /// Start of the contiguous buffered range the position is in, or the position itself.
    pub(crate) start: f64,
    /// End of the contiguous buffered range the position is in, or the position itself.
    pub(crate) end: f64,
    /// Start of the next buffered range after the position, if any.
    pub(crate) next_start: Option<f64>,
}

/// Chronological ranges of time, generally expressed in seconds, built incrementally as
/// fragments are processed.
///
/// Unlike a media element's buffered ranges, adding time here never merges neighbouring
/// ranges together: a range is only ever extended when the added time starts inside it.
/// Readers wanting contiguous spans should go through `buffered_info`.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    /// Create a new empty `TimeRanges` object
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add `[start, end]` to that `TimeRanges` object.
    ///
    /// The first range containing `start` sees its end pushed to `end` (it is never moved
    /// backward). If no range contains `start`, a new range is appended.
    pub(crate) fn extend_or_append(&mut self, start: f64, end: f64) {
        match self.ranges.iter_mut().find(|r| r.contains(start)) {
            Some(range) => {
                if end > range.end {
                    range.end = end;
                }
            }
            None => self.ranges.push(TimeRange { start, end }),
        }
    }

    /// Computes what is buffered around `pos`, considering that holes smaller than
    /// `max_hole` between ranges do not break contiguity.
    ///
    /// `pos` itself is considered in a range if it is less than `max_hole` before its start.
    pub(crate) fn buffered_info(&self, pos: f64, max_hole: f64) -> BufferedInfo {
        let mut sorted = self.ranges.clone();
        sorted.sort_by(|a, b| {
            a.start
                .total_cmp(&b.start)
                .then_with(|| b.end.total_cmp(&a.end))
        });

        let mut merged: Vec<TimeRange> = Vec::with_capacity(sorted.len());
        for range in sorted {
            match merged.last_mut() {
                Some(last) if range.start - last.end < max_hole => {
                    if range.end > last.end {
                        last.end = range.end;
                    }
                }
                _ => merged.push(range),
            }
        }

        let mut info = BufferedInfo {
            len: 0.,
            start: pos,
            end: pos,
            next_start: None,
        };
        for range in merged {
            if pos + max_hole >= range.start && pos < range.end {
                info.start = range.start;
                info.end = range.end;
                info.len = range.end - pos;
            } else if pos + max_hole < range.start {
                info.next_start = Some(range.start);
                break;
            }
        }
        info
    }
}

impl<'a> IntoIterator for &'a TimeRanges {
    type Item = &'a TimeRange;
    type IntoIter = Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
