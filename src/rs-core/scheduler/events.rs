use crate::{
    bindings::{
        DecryptJobId, MediaElementId, MediaType, RequestId, ResourceId, TimerId, TimerReason,
    },
    track::{FragmentRef, TrackDetails, TrackDetailsError, TrackId},
};

/// Every event a `StreamController` reacts to.
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    /// A timer started through the `Environment` has elapsed.
    TimerEnded { id: TimerId, reason: TimerReason },

    /// A media element is now linked to the controller.
    MediaAttached { media: MediaElementId },

    /// The media element is being unlinked from the controller.
    MediaDetaching,

    /// The media element started seeking to another position.
    MediaSeeking,

    /// An error happened. `media_type` is the type of the fragment it concerns, if any.
    Error { media_type: Option<MediaType> },

    /// The key needed by `fragment` has been loaded.
    KeyLoaded { fragment: FragmentRef, key: Vec<u8> },

    /// The list of tracks has been (re)published, without details.
    TracksUpdated { track_ids: Vec<TrackId> },

    /// Another track has been chosen. `None` if no track should be loaded.
    TrackSwitched { id: Option<TrackId> },

    /// The details of the track `id` have been loaded or refreshed.
    TrackDetailsLoaded {
        id: TrackId,
        details: Result<TrackDetails, TrackDetailsError>,
    },

    /// The details of the main (audio/video) track have been updated.
    MainDetailsUpdated { first_fragment_start: f64 },

    /// A fragment request issued by this controller finished with success.
    FragmentLoaded {
        request_id: RequestId,
        payload: ResourceId,
        payload_size: u32,
    },

    /// A decryption operation issued by this controller finished.
    Decrypted {
        job_id: DecryptJobId,
        plaintext: ResourceId,
    },

    /// A fragment has been fully processed (parsed, pushed), or failed to be.
    FragmentProcessed { fragment: FragmentRef, success: bool },
}
