use super::{
    DecryptJobId, Environment, FragmentLoadState, MediaElementId, MediaType, RequestId,
    ResourceId, TimerId, TimerReason,
};
use crate::{
    decrypter::DecryptStats,
    requester::{FragmentFetchRequest, KeyLoadRequest},
    track::FragmentRef,
};

/// `Environment` recording every call, for tests.
#[derive(Debug, Default)]
pub(crate) struct MockEnvironment {
    next_id: u32,
    pub(crate) clock: f64,
    pub(crate) position: f64,
    pub(crate) fragment_states: Vec<(FragmentRef, FragmentLoadState)>,

    /// Timers started and not yet ended or cleared.
    pub(crate) timers: Vec<(TimerId, TimerReason)>,
    pub(crate) fetches: Vec<(RequestId, FragmentFetchRequest)>,
    pub(crate) aborted: Vec<RequestId>,
    pub(crate) key_requests: Vec<KeyLoadRequest>,
    pub(crate) decrypts: Vec<(DecryptJobId, ResourceId, Vec<u8>, Vec<u8>)>,
    pub(crate) announced: Vec<(MediaType, FragmentRef, ResourceId, DecryptStats)>,
    pub(crate) freed: Vec<ResourceId>,
}

impl MockEnvironment {
    fn generate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Remove and return the first pending timer started for `reason`.
    pub(crate) fn take_timer(&mut self, reason: TimerReason) -> Option<TimerId> {
        let idx = self.timers.iter().position(|(_, r)| *r == reason)?;
        Some(self.timers.remove(idx).0)
    }

    pub(crate) fn has_timer(&self, reason: TimerReason) -> bool {
        self.timers.iter().any(|(_, r)| *r == reason)
    }
}

impl Environment for MockEnvironment {
    fn start_timer(&mut self, _duration: f64, reason: TimerReason) -> TimerId {
        let id = self.generate_id() as TimerId;
        self.timers.push((id, reason));
        id
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.timers.retain(|(t, _)| *t != id);
    }

    fn media_position(&self, _media: MediaElementId) -> f64 {
        self.position
    }

    fn fragment_state(&self, _media_type: MediaType, fragment: &FragmentRef) -> FragmentLoadState {
        self.fragment_states
            .iter()
            .find(|(f, _)| f == fragment)
            .map_or(FragmentLoadState::NotLoaded, |(_, s)| *s)
    }

    fn fetch_fragment(&mut self, request: &FragmentFetchRequest) -> RequestId {
        let id = self.generate_id();
        self.fetches.push((id, request.clone()));
        id
    }

    fn abort_request(&mut self, id: RequestId) -> bool {
        self.aborted.push(id);
        true
    }

    fn request_key(&mut self, request: &KeyLoadRequest) {
        self.key_requests.push(request.clone());
    }

    fn decrypt(&mut self, payload: ResourceId, key: &[u8], iv: &[u8]) -> DecryptJobId {
        let id = self.generate_id();
        self.decrypts.push((id, payload, key.to_vec(), iv.to_vec()));
        id
    }

    fn announce_decrypted(
        &mut self,
        media_type: MediaType,
        fragment: &FragmentRef,
        plaintext: ResourceId,
        stats: DecryptStats,
    ) {
        self.announced.push((media_type, *fragment, plaintext, stats));
    }

    fn free_resource(&mut self, id: ResourceId) {
        self.freed.push(id);
    }

    fn now(&self) -> f64 {
        self.clock
    }
}
