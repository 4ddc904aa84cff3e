use crate::{
    bindings::MediaType,
    buffer_tracker::BufferTracker,
    requester::FragmentFetchRequest,
    track::{Fragment, FragmentRef},
};

/// What differs between the controllers of the various track types.
///
/// The scheduling itself (ticks, selection, state machine) is shared; a controller for a
/// given track type only plugs its own hooks into a `StreamController`.
pub(crate) trait TrackTypeHooks {
    fn media_type(&self) -> MediaType;

    /// Build the request loading `fragment`.
    fn fetch_request(&self, fragment: &Fragment, reference: FragmentRef) -> FragmentFetchRequest;

    /// Called when `fragment` has been processed with success, to update what is known to be
    /// buffered.
    fn on_fragment_processed(
        &mut self,
        buffered: &mut BufferTracker,
        reference: FragmentRef,
        fragment: &Fragment,
    );
}

/// Hooks for text (subtitle) tracks.
///
/// Text cues are not pushed to a media buffer reporting what it contains, so processed
/// fragments are recorded in the `BufferTracker` directly.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TextTrackHooks;

impl TrackTypeHooks for TextTrackHooks {
    fn media_type(&self) -> MediaType {
        MediaType::Subtitle
    }

    fn fetch_request(&self, fragment: &Fragment, reference: FragmentRef) -> FragmentFetchRequest {
        FragmentFetchRequest {
            media_type: MediaType::Subtitle,
            fragment: reference,
            url: fragment.url.clone(),
            timeout: None,
        }
    }

    fn on_fragment_processed(
        &mut self,
        buffered: &mut BufferTracker,
        reference: FragmentRef,
        fragment: &Fragment,
    ) {
        buffered.record(reference.track_id, fragment);
    }
}
