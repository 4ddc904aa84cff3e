use crate::wasm_bindgen;
use std::fmt;

/// # js_functions
///
/// This file lists all JavaScript functions that are callable from Rust as well as
/// struct and enumeration used by those functions.
///
/// Rust code should not call them directly but go through the `Environment` trait, so
/// the scheduling logic can run outside of a JavaScript host.

#[wasm_bindgen]
extern "C" {
    // Log the given text in the JavaScript console, with the log level given.
    pub fn jsLog(log_level: LogLevel, log: &str);

    // Starts a timer for the number of milliseconds indicated by the `duration` argument.
    //
    // Once this timer has elapsed, and unless `jsClearTimer` has been called since with
    // the `TimerId` returned by this function, the `on_timer_ended` method of the
    // `TextStreamDispatcher` will be called with both the corresponding `TimerId` and
    // `reason`.
    pub fn jsTimer(duration: f64, reason: TimerReason) -> TimerId;

    // Clear a timer started with `jsTimer`.
    pub fn jsClearTimer(id: TimerId);

    // Returns the current position, in seconds, of the media element identified by `media`.
    pub fn jsGetMediaPosition(media: MediaElementId) -> f64;

    // Returns the load state of a fragment, as known by the JavaScript-side fragment tracker.
    pub fn jsGetFragmentState(media_type: MediaType, track_id: u32, sn: u32) -> FragmentLoadState;

    // Fetch the fragment at the given `url` from the network.
    //
    // If and when it finishes with success, the `on_fragment_loaded` method of the
    // `TextStreamDispatcher` will be called with the returned `RequestId`.
    //
    // If and when it fails, an error scoped to the `media_type` will be emitted through
    // `on_error` instead.
    //
    // In both cases, those methods will always be called asynchronously after the
    // `jsLoadFragment` call.
    //
    // If the request has been aborted while pending through `jsAbortRequest`, none of
    // those methods will be called for it.
    pub fn jsLoadFragment(
        media_type: MediaType,
        track_id: u32,
        sn: u32,
        url: &str,
        timeout: Option<f64>,
    ) -> RequestId;

    // Abort a request started with `jsLoadFragment` based on its `request_id`.
    //
    // Returns `true` if a pending request with the given RequestId was found and aborted,
    // `false` if no pending request was found with that RequestId.
    pub fn jsAbortRequest(request_id: RequestId) -> bool;

    // Ask the JavaScript-side key loader for the key behind `key_uri`.
    //
    // Once loaded, the `on_key_loaded` method of the `TextStreamDispatcher` will be called.
    // On failure, an error scoped to the `media_type` will be emitted through `on_error`.
    pub fn jsRequestKey(media_type: MediaType, track_id: u32, sn: u32, key_uri: Option<String>);

    // Decrypt the resource behind `payload` with the AES-128-CBC cipher.
    //
    // Once done, the `on_decrypted` method of the `TextStreamDispatcher` is called with the
    // returned `DecryptJobId` and the `ResourceId` of the plaintext.
    pub fn jsDecrypt(payload: ResourceId, key: &[u8], iv: &[u8]) -> DecryptJobId;

    // Republish a decrypted fragment, so text parsers can process it.
    pub fn jsAnnounceDecryptedFragment(
        media_type: MediaType,
        track_id: u32,
        sn: u32,
        plaintext: ResourceId,
        decrypt_start: f64,
        decrypt_end: f64,
    );

    // Free resource stored in JavaScript's memory.
    pub fn jsFreeResource(resource_id: ResourceId) -> bool;

    // Monotonic timestamp in milliseconds (`performance.now()`).
    pub fn jsNow() -> f64;
}

/// Load state of a fragment as tracked on the JavaScript-side.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentLoadState {
    /// Never loaded, or evicted since.
    NotLoaded = 0,
    /// A request for it is pending.
    Loading = 1,
    /// Loaded but only partially in the buffer.
    Partial = 2,
    /// Loaded and entirely buffered.
    Loaded = 3,
}

/// "Reason" associated to a timer started by the `TextStreamDispatcher`.
///
/// This can then help to identify what the timer was for once resolved.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerReason {
    /// The regular scheduling interval.
    SchedulerInterval = 0,

    /// A one-shot tick requested after an event which may allow new fragments to be
    /// loaded.
    ImmediateTick = 1,
}

/// Levels with which a log can be emitted.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd)]
pub enum LogLevel {
    /// Log level reserved for very important errors and highly unexpected events.
    Error = 0,

    /// Log level reserved for less important errors and unexpected events.
    Warn = 1,

    /// Log level reserved for important events
    Info = 2,

    /// Log level used when debugging. Small-ish yet impactful events should be logged with it.
    Debug = 3,
}

/// Identify a resource allocated on the JavaScript side.
///
/// Resources received from the JavaScript-side are owned by it. Only resources produced
/// for this controller and never announced (e.g. stale decryption output) have to be freed
/// from Rust through `jsFreeResource`.
pub type ResourceId = u32;

/// Identify a pending request.
pub type RequestId = u32;

/// Identify a pending timer.
pub type TimerId = f64;

/// Identify a pending decryption operation.
pub type DecryptJobId = u32;

/// Identify the media element a controller is attached to.
pub type MediaElementId = u32;

/// Type of elementary track a controller schedules fragments for.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Audio = 0,
    Video = 1,
    Subtitle = 2,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MediaType::Audio => "audio",
                MediaType::Video => "video",
                MediaType::Subtitle => "subtitle",
            }
        )
    }
}
