use crate::{
    track::{Fragment, TrackId},
    utils::time_ranges::{BufferedInfo, TimeRanges},
    Logger,
};

/// Keeps track, for each track, of the time ranges whose fragments have been successfully
/// processed.
///
/// This is the "already buffered" signal used by the scheduler. It is distinct from what
/// the media element reports: text tracks are not necessarily rendered through the same
/// buffering primitive than audio and video.
#[derive(Debug, Default)]
pub(crate) struct BufferTracker {
    tracks: Vec<(TrackId, TimeRanges)>,
}

impl BufferTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Forget everything and start with an empty range list for each of the given tracks.
    pub(crate) fn reset(&mut self, track_ids: impl Iterator<Item = TrackId>) {
        self.tracks = track_ids.map(|id| (id, TimeRanges::new())).collect();
    }

    /// Record that `fragment` has been processed with success for the track `track_id`.
    ///
    /// Recording the same fragment multiple times has no effect.
    pub(crate) fn record(&mut self, track_id: TrackId, fragment: &Fragment) {
        match self.tracks.iter_mut().find(|(id, _)| *id == track_id) {
            Some((_, ranges)) => ranges.extend_or_append(fragment.start, fragment.end()),
            None => Logger::warn(&format!(
                "BufferTracker: fragment {} processed for unknown track {}",
                fragment.sn, track_id
            )),
        }
    }

    pub(crate) fn ranges(&self, track_id: TrackId) -> Option<&TimeRanges> {
        self.tracks
            .iter()
            .find(|(id, _)| *id == track_id)
            .map(|(_, ranges)| ranges)
    }

    /// Returns what is buffered for `track_id` around `position`, bridging holes smaller
    /// than `max_hole`. An unknown track is considered as having nothing buffered.
    pub(crate) fn buffered_info(
        &self,
        track_id: TrackId,
        position: f64,
        max_hole: f64,
    ) -> BufferedInfo {
        match self.ranges(track_id) {
            Some(ranges) => ranges.buffered_info(position, max_hole),
            None => TimeRanges::new().buffered_info(position, max_hole),
        }
    }
}
