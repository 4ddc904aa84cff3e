use super::{
    jsAbortRequest, jsAnnounceDecryptedFragment, jsClearTimer, jsDecrypt, jsFreeResource,
    jsGetFragmentState, jsGetMediaPosition, jsLoadFragment, jsNow, jsRequestKey, jsTimer,
    DecryptJobId, FragmentLoadState, MediaElementId, MediaType, RequestId, ResourceId, TimerId,
    TimerReason,
};
use crate::{
    decrypter::DecryptStats,
    requester::{FragmentFetchRequest, KeyLoadRequest},
    track::FragmentRef,
};

/// Everything a stream controller needs from its host.
///
/// In production this is the JavaScript-side, reached through the functions declared in
/// `js_functions`. Every call is non-blocking: asynchronous operations return an identifier
/// and complete later through one of the dispatcher's event listeners.
pub(crate) trait Environment {
    fn start_timer(&mut self, duration: f64, reason: TimerReason) -> TimerId;
    fn clear_timer(&mut self, id: TimerId);

    /// Current position, in seconds, of the given media element.
    fn media_position(&self, media: MediaElementId) -> f64;

    /// Load state of a fragment according to the external fragment tracker.
    fn fragment_state(&self, media_type: MediaType, fragment: &FragmentRef) -> FragmentLoadState;

    fn fetch_fragment(&mut self, request: &FragmentFetchRequest) -> RequestId;
    fn abort_request(&mut self, id: RequestId) -> bool;
    fn request_key(&mut self, request: &KeyLoadRequest);

    fn decrypt(&mut self, payload: ResourceId, key: &[u8], iv: &[u8]) -> DecryptJobId;
    fn announce_decrypted(
        &mut self,
        media_type: MediaType,
        fragment: &FragmentRef,
        plaintext: ResourceId,
        stats: DecryptStats,
    );
    fn free_resource(&mut self, id: ResourceId);

    /// Monotonic clock, in milliseconds.
    fn now(&self) -> f64;
}

/// `Environment` implementation calling the JavaScript functions imported through
/// `wasm_bindgen`.
#[derive(Default)]
pub(crate) struct JsEnvironment;

impl Environment for JsEnvironment {
    fn start_timer(&mut self, duration: f64, reason: TimerReason) -> TimerId {
        jsTimer(duration, reason)
    }

    fn clear_timer(&mut self, id: TimerId) {
        jsClearTimer(id);
    }

    fn media_position(&self, media: MediaElementId) -> f64 {
        jsGetMediaPosition(media)
    }

    fn fragment_state(&self, media_type: MediaType, fragment: &FragmentRef) -> FragmentLoadState {
        jsGetFragmentState(media_type, fragment.track_id, fragment.sn)
    }

    fn fetch_fragment(&mut self, request: &FragmentFetchRequest) -> RequestId {
        jsLoadFragment(
            request.media_type,
            request.fragment.track_id,
            request.fragment.sn,
            &request.url,
            request.timeout,
        )
    }

    fn abort_request(&mut self, id: RequestId) -> bool {
        jsAbortRequest(id)
    }

    fn request_key(&mut self, request: &KeyLoadRequest) {
        jsRequestKey(
            request.media_type,
            request.fragment.track_id,
            request.fragment.sn,
            request.key_uri.clone(),
        );
    }

    fn decrypt(&mut self, payload: ResourceId, key: &[u8], iv: &[u8]) -> DecryptJobId {
        jsDecrypt(payload, key, iv)
    }

    fn announce_decrypted(
        &mut self,
        media_type: MediaType,
        fragment: &FragmentRef,
        plaintext: ResourceId,
        stats: DecryptStats,
    ) {
        jsAnnounceDecryptedFragment(
            media_type,
            fragment.track_id,
            fragment.sn,
            plaintext,
            stats.tstart,
            stats.tdecrypt,
        );
    }

    fn free_resource(&mut self, id: ResourceId) {
        jsFreeResource(id);
    }

    fn now(&self) -> f64 {
        jsNow()
    }
}
