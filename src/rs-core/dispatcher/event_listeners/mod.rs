use crate::{
    bindings::{
        DecryptJobId, MediaElementId, MediaType, RequestId, ResourceId, TimerId, TimerReason,
    },
    scheduler::ControllerEvent,
    track::{CipherMethod, Fragment, FragmentRef, KeyMaterial, TrackDetails, TrackDetailsError},
    wasm_bindgen,
};

use super::TextStreamDispatcher;

/// Methods triggered on JavaScript events by the JavaScript code.
#[wasm_bindgen]
impl TextStreamDispatcher {
    /// The JS code should call this method each time a timer started with `jsTimer`
    /// finished.
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier given by `jsTimer` when the timer was started.
    ///
    /// * `reason` - The `reason` given to `jsTimer`.
    pub fn on_timer_ended(&mut self, id: TimerId, reason: TimerReason) {
        self.dispatch(ControllerEvent::TimerEnded { id, reason });
    }

    /// The JS code should call this method once a media element is linked to the
    /// controller. `media` is then given back to `jsGetMediaPosition`.
    pub fn on_media_attached(&mut self, media: MediaElementId) {
        self.dispatch(ControllerEvent::MediaAttached { media });
    }

    pub fn on_media_detaching(&mut self) {
        self.dispatch(ControllerEvent::MediaDetaching);
    }

    /// The JS code should call this method when the media element begins seeking.
    pub fn on_media_seeking(&mut self) {
        self.dispatch(ControllerEvent::MediaSeeking);
    }

    /// The JS code should call this method when an error happens, such as a failed
    /// fragment or key request.
    ///
    /// # Arguments
    ///
    /// * `media_type` - Type of the fragment the error concerns. Only errors concerning
    ///   subtitles are handled. `undefined` if unrelated to a fragment.
    pub fn on_error(&mut self, media_type: Option<MediaType>) {
        self.dispatch(ControllerEvent::Error { media_type });
    }

    /// The JS code should call this method once a key asked through `jsRequestKey` has
    /// been loaded.
    pub fn on_key_loaded(&mut self, track_id: u32, sn: u32, key: Vec<u8>) {
        self.dispatch(ControllerEvent::KeyLoaded {
            fragment: FragmentRef { track_id, sn },
            key,
        });
    }

    /// The JS code should call this method when the list of subtitle tracks changes, for
    /// example when a new content is loaded.
    pub fn on_tracks_updated(&mut self, track_ids: Vec<u32>) {
        self.dispatch(ControllerEvent::TracksUpdated { track_ids });
    }

    /// The JS code should call this method when another subtitle track is chosen.
    ///
    /// # Arguments
    ///
    /// * `track_id` - Identifier of the chosen track, or a negative number to disable
    ///   subtitles.
    pub fn on_track_switched(&mut self, track_id: i32) {
        let id = u32::try_from(track_id).ok();
        self.dispatch(ControllerEvent::TrackSwitched { id });
    }

    /// The JS code should call this method each time the fragment list of a subtitle
    /// track has been loaded or refreshed.
    pub fn on_track_details_loaded(&mut self, track_id: u32, details: JsTrackDetails) {
        self.dispatch(ControllerEvent::TrackDetailsLoaded {
            id: track_id,
            details: details.into_details(),
        });
    }

    /// The JS code should call this method each time the fragment list of the main
    /// (audio and video) track has been updated.
    pub fn on_main_details_updated(&mut self, first_fragment_start: f64) {
        self.dispatch(ControllerEvent::MainDetailsUpdated {
            first_fragment_start,
        });
    }

    /// The JS code should call this method each time a request started with
    /// `jsLoadFragment` finished with success.
    ///
    /// # Arguments
    ///
    /// * `request_id` - The identifier given by `jsLoadFragment` when the request
    ///   was started.
    ///
    /// * `resource_id` - Id refering to the loaded data on the JavaScript-side.
    ///
    /// * `resource_size` - Size of the loaded data, in bytes.
    pub fn on_fragment_loaded(
        &mut self,
        request_id: RequestId,
        resource_id: ResourceId,
        resource_size: u32,
    ) {
        self.dispatch(ControllerEvent::FragmentLoaded {
            request_id,
            payload: resource_id,
            payload_size: resource_size,
        });
    }

    /// The JS code should call this method once a decryption started with `jsDecrypt`
    /// is done, `resource_id` referring to the plaintext.
    pub fn on_decrypted(&mut self, job_id: DecryptJobId, resource_id: ResourceId) {
        self.dispatch(ControllerEvent::Decrypted {
            job_id,
            plaintext: resource_id,
        });
    }

    /// The JS code should call this method once a fragment has been parsed and its cues
    /// pushed, or once that failed.
    pub fn on_fragment_processed(&mut self, track_id: u32, sn: u32, success: bool) {
        self.dispatch(ControllerEvent::FragmentProcessed {
            fragment: FragmentRef { track_id, sn },
            success,
        });
    }
}

/// Fragment list of a track, built on the JavaScript-side from its parsed playlist.
#[wasm_bindgen]
pub struct JsTrackDetails {
    fragments: Vec<Fragment>,
    has_program_date_time: bool,
    live: bool,
}

#[wasm_bindgen]
impl JsTrackDetails {
    /// Create an empty fragment list. `live` should be set if it may be refreshed as
    /// the content evolves.
    #[wasm_bindgen(constructor)]
    pub fn new(live: bool) -> Self {
        Self {
            fragments: vec![],
            has_program_date_time: false,
            live,
        }
    }

    /// Add a clear fragment. Fragments should be added in playlist order.
    ///
    /// # Arguments
    ///
    /// * `sn` - Media sequence number of the fragment.
    ///
    /// * `start` - Start time in seconds.
    ///
    /// * `duration` - Duration in seconds.
    ///
    /// * `url` - Absolute url of the fragment.
    ///
    /// * `program_date_time` - Absolute start time, in seconds since the unix epoch, if
    ///   announced.
    pub fn add_fragment(
        &mut self,
        sn: u32,
        start: f64,
        duration: f64,
        url: String,
        program_date_time: Option<f64>,
    ) {
        let fragment = Fragment::new(sn, start, duration, url);
        self.push(fragment, program_date_time);
    }

    /// Add a fragment whose data needs to be decrypted, `method` being the encryption
    /// method as announced in the playlist (e.g. `"AES-128"`).
    #[allow(clippy::too_many_arguments)]
    pub fn add_encrypted_fragment(
        &mut self,
        sn: u32,
        start: f64,
        duration: f64,
        url: String,
        program_date_time: Option<f64>,
        method: &str,
        key_uri: Option<String>,
        iv: Option<Vec<u8>>,
    ) {
        let key = KeyMaterial::new(CipherMethod::from_attribute(method), key_uri, iv);
        let fragment = Fragment::new(sn, start, duration, url).with_key(key);
        self.push(fragment, program_date_time);
    }
}

impl JsTrackDetails {
    fn push(&mut self, fragment: Fragment, program_date_time: Option<f64>) {
        let fragment = match program_date_time {
            Some(pdt) => {
                self.has_program_date_time = true;
                fragment.with_program_date_time(pdt)
            }
            None => fragment,
        };
        self.fragments.push(fragment);
    }

    fn into_details(self) -> Result<TrackDetails, TrackDetailsError> {
        TrackDetails::new(self.fragments, self.has_program_date_time, self.live)
    }
}
