use super::{ControllerEvent, ControllerState, StreamController, TrackTypeHooks};
use crate::{
    bindings::{
        DecryptJobId, Environment, FragmentLoadState, MediaElementId, RequestId, ResourceId,
        TimerId, TimerReason,
    },
    fragment_selector::{select_by_time, select_by_timestamp},
    requester::KeyLoadRequest,
    track::{FragmentRef, TrackDetails, TrackDetailsError, TrackId, TrackList},
    Logger,
};

impl<H: TrackTypeHooks> StreamController<H> {
    /// Run the transition associated to `event`.
    pub(crate) fn handle_event(&mut self, env: &mut dyn Environment, event: ControllerEvent) {
        match event {
            ControllerEvent::TimerEnded { id, reason } => self.on_timer_ended(env, id, reason),
            ControllerEvent::MediaAttached { media } => self.on_media_attached(env, media),
            ControllerEvent::MediaDetaching => self.on_media_detaching(env),
            ControllerEvent::MediaSeeking => {
                self.frag_previous = None;
                self.tick_driver.request_tick(env);
            }
            ControllerEvent::Error { media_type } => {
                if media_type == Some(self.hooks.media_type()) {
                    Logger::warn("Scheduler: Error while loading, going back to idle");
                    self.cancel_in_flight(env);
                    self.back_to_idle();
                }
            }
            ControllerEvent::KeyLoaded { fragment, key } => self.on_key_loaded(env, fragment, &key),
            ControllerEvent::TracksUpdated { track_ids } => {
                Logger::info(&format!("Scheduler: {} track(s) announced", track_ids.len()));
                self.tracks = TrackList::new(&track_ids);
                self.buffer_tracker.reset(self.tracks.ids());
            }
            ControllerEvent::TrackSwitched { id } => self.on_track_switched(env, id),
            ControllerEvent::TrackDetailsLoaded { id, details } => {
                self.on_track_details_loaded(env, id, details)
            }
            ControllerEvent::MainDetailsUpdated {
                first_fragment_start,
            } => self.last_main_start = first_fragment_start,
            ControllerEvent::FragmentLoaded {
                request_id,
                payload,
                payload_size,
            } => self.on_fragment_loaded(env, request_id, payload, payload_size),
            ControllerEvent::Decrypted { job_id, plaintext } => {
                self.on_decrypted(env, job_id, plaintext)
            }
            ControllerEvent::FragmentProcessed { fragment, success } => {
                self.on_fragment_processed(env, fragment, success)
            }
        }
    }

    /// Check whether a new fragment should be loaded and start loading it if so.
    pub(crate) fn tick(&mut self, env: &mut dyn Environment) {
        let Some(media) = self.media else {
            return;
        };
        if self.state != ControllerState::Idle {
            return;
        }
        let Some(track_id) = self.current_track_id else {
            return;
        };
        let Some(details) = self.tracks.get(track_id).and_then(|t| t.details()) else {
            return;
        };

        let position = env.media_position(media);
        let buffered = self
            .buffer_tracker
            .buffered_info(track_id, position, self.config.max_buffer_hole);
        Logger::lazy_debug(&|| {
            format!(
                "Scheduler: tick at {position}, buffered [{}, {}], next range at {:?}",
                buffered.start, buffered.end, buffered.next_start
            )
        });
        let tolerance = self.config.max_fragment_lookup_tolerance;
        let candidate = if buffered.len < self.config.target_buffer_length()
            && buffered.end < details.end()
        {
            select_by_time(
                self.frag_previous.as_ref(),
                details.fragments(),
                buffered.end,
                tolerance,
            )
        } else if details.has_program_date_time() {
            self.frag_previous.as_ref().and_then(|prev| {
                select_by_timestamp(details.fragments(), prev.end_timestamp(), tolerance)
            })
        } else {
            None
        };
        let Some(mut fragment) = candidate.cloned() else {
            return;
        };

        let reference = FragmentRef {
            track_id,
            sn: fragment.sn,
        };
        let media_type = self.hooks.media_type();
        if fragment.is_encrypted() {
            Logger::info(&format!(
                "Scheduler: Loading key for {media_type} fragment {} (track {track_id})",
                fragment.sn
            ));
            let key_uri = fragment.key.as_ref().and_then(|k| k.uri.clone());
            self.state = ControllerState::KeyLoading;
            env.request_key(&KeyLoadRequest {
                media_type,
                fragment: reference,
                key_uri,
            });
            return;
        }

        match env.fragment_state(media_type, &reference) {
            FragmentLoadState::NotLoaded => {}
            state => {
                Logger::lazy_debug(&|| {
                    format!(
                        "Scheduler: Fragment {} (track {track_id}) already {state:?}",
                        reference.sn
                    )
                });
                return;
            }
        }

        fragment.track_id = Some(track_id);
        let request = self.hooks.fetch_request(&fragment, reference);
        self.frag_current = Some(fragment.clone());
        self.state = ControllerState::Loading;
        self.requester.fetch_fragment(env, fragment, request);
    }

    fn on_timer_ended(&mut self, env: &mut dyn Environment, id: TimerId, reason: TimerReason) {
        if self.tick_driver.on_timer_ended(env, id, reason) {
            self.tick(env);
        }
    }

    fn on_media_attached(&mut self, env: &mut dyn Environment, media: MediaElementId) {
        Logger::info("Scheduler: Media attached");
        self.media = Some(media);
        self.state = ControllerState::Idle;
        self.tick_driver.request_tick(env);
    }

    fn on_media_detaching(&mut self, env: &mut dyn Environment) {
        Logger::info("Scheduler: Media detaching");
        self.cancel_in_flight(env);
        self.media = None;
        self.state = ControllerState::Stopped;
    }

    fn on_key_loaded(&mut self, env: &mut dyn Environment, fragment: FragmentRef, key: &[u8]) {
        match self
            .tracks
            .get_mut(fragment.track_id)
            .and_then(|t| t.details_mut())
        {
            Some(details) => {
                match details
                    .fragment(fragment.sn)
                    .and_then(|f| f.key.as_ref())
                    .map(|k| k.uri.clone())
                {
                    Some(uri) => {
                        let updated = details.install_key(uri.as_deref(), key);
                        Logger::debug(&format!(
                            "Scheduler: Key installed on {updated} fragment(s) of track {}",
                            fragment.track_id
                        ));
                    }
                    None => Logger::warn(&format!(
                        "Scheduler: Key loaded for unknown encrypted fragment {} (track {})",
                        fragment.sn, fragment.track_id
                    )),
                }
            }
            None => Logger::warn(&format!(
                "Scheduler: Key loaded for track {} with no details",
                fragment.track_id
            )),
        }
        if self.state == ControllerState::KeyLoading {
            self.state = ControllerState::Idle;
            self.tick_driver.request_tick(env);
        }
    }

    fn on_track_switched(&mut self, env: &mut dyn Environment, id: Option<TrackId>) {
        if self.current_track_id != id {
            self.cancel_in_flight(env);
        }
        self.current_track_id = id;
        match id.and_then(|id| self.tracks.get(id)) {
            None => {
                Logger::info("Scheduler: No track to load, stopping");
                self.tick_driver.stop(env);
            }
            Some(track) if track.details().is_some() => {
                Logger::info(&format!("Scheduler: Switching to track {}", track.id()));
                self.tick_driver.start(env);
                self.tick_driver.request_tick(env);
            }
            Some(track) => {
                Logger::info(&format!(
                    "Scheduler: Switching to track {}, waiting for its details",
                    track.id()
                ));
                self.tick_driver.stop(env);
            }
        }
    }

    fn on_track_details_loaded(
        &mut self,
        env: &mut dyn Environment,
        id: TrackId,
        details: Result<TrackDetails, TrackDetailsError>,
    ) {
        let mut details = match details {
            Ok(details) => details,
            Err(err) => {
                Logger::warn(&format!("Scheduler: Ignoring details of track {id}: {err}"));
                return;
            }
        };
        let Some(track) = self.tracks.get_mut(id) else {
            Logger::warn(&format!("Scheduler: Details loaded for unknown track {id}"));
            return;
        };
        if let Some(previous) = track.details() {
            details.inherit_keys(previous);
        }
        if details.is_live() {
            details.align_on(track.details(), self.last_main_start);
        }
        Logger::debug(&format!(
            "Scheduler: Details of track {id} loaded ({} fragment(s))",
            details.fragments().len()
        ));
        track.set_details(details);
        if self.current_track_id == Some(id) {
            self.tick_driver.start(env);
            self.tick_driver.request_tick(env);
        }
    }

    fn on_fragment_loaded(
        &mut self,
        env: &mut dyn Environment,
        request_id: RequestId,
        payload: ResourceId,
        payload_size: u32,
    ) {
        let Some(info) = self.requester.on_request_finished(request_id) else {
            Logger::info("Scheduler: Ignoring result of an aborted request");
            return;
        };
        let is_current = self.state == ControllerState::Loading
            && self.frag_current.as_ref().and_then(|f| f.reference()) == Some(info.reference);
        if !is_current {
            Logger::info(&format!(
                "Scheduler: Ignoring stale fragment {} (track {})",
                info.reference.sn, info.reference.track_id
            ));
            return;
        }
        if let Err(reason) = self.decrypter.start(
            env,
            &info.fragment,
            info.reference,
            payload,
            payload_size,
        ) {
            Logger::debug(&format!(
                "Scheduler: Fragment {} not decrypted: {reason}",
                info.reference.sn
            ));
        }
    }

    fn on_decrypted(
        &mut self,
        env: &mut dyn Environment,
        job_id: DecryptJobId,
        plaintext: ResourceId,
    ) {
        let media_type = self.hooks.media_type();
        self.decrypter
            .on_completed(env, media_type, job_id, plaintext, self.current_track_id);
    }

    fn on_fragment_processed(
        &mut self,
        env: &mut dyn Environment,
        fragment: FragmentRef,
        success: bool,
    ) {
        let was_current =
            self.frag_current.as_ref().and_then(|f| f.reference()) == Some(fragment);
        let frag_current = if was_current {
            self.frag_current.take()
        } else {
            None
        };
        self.back_to_idle();

        if !success {
            Logger::warn(&format!(
                "Scheduler: Processing of fragment {} (track {}) failed",
                fragment.sn, fragment.track_id
            ));
            return;
        }
        if self.current_track_id != Some(fragment.track_id) {
            Logger::info(&format!(
                "Scheduler: Fragment {} of old track {} processed, ignoring",
                fragment.sn, fragment.track_id
            ));
            return;
        }

        let processed = frag_current.or_else(|| {
            self.tracks
                .get(fragment.track_id)
                .and_then(|t| t.details())
                .and_then(|d| d.fragment(fragment.sn))
                .cloned()
        });
        match processed {
            Some(processed) => {
                self.hooks
                    .on_fragment_processed(&mut self.buffer_tracker, fragment, &processed);
                self.frag_previous = Some(processed);
                self.tick_driver.request_tick(env);
            }
            None => Logger::warn(&format!(
                "Scheduler: Unknown fragment {} (track {}) processed",
                fragment.sn, fragment.track_id
            )),
        }
    }
}
