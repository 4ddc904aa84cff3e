use crate::{
    bindings::{Environment, MediaElementId},
    buffer_tracker::BufferTracker,
    decrypter::DecryptionCoordinator,
    requester::Requester,
    track::{Fragment, TrackId, TrackList},
    Logger,
};

mod configuration;
mod core;
mod events;
mod hooks;
mod tick_driver;

pub(crate) use configuration::{ConfigurationError, SchedulerConfiguration};
pub(crate) use events::ControllerEvent;
pub(crate) use hooks::{TextTrackHooks, TrackTypeHooks};

use configuration::{check_positive, check_strictly_positive};
use tick_driver::TickDriver;

#[cfg(test)]
mod tests;

/// Loading state of a `StreamController`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControllerState {
    /// No media element is attached: nothing is loaded.
    Stopped,
    /// Ready to select a new fragment on the next tick.
    Idle,
    /// Waiting for the key of the selected fragment.
    KeyLoading,
    /// Waiting for the selected fragment to be loaded and processed.
    Loading,
}

/// Schedules the loading of the fragments of one track type.
///
/// At regular intervals, and after events which may allow loading to progress, it checks
/// how much of the chosen track is buffered around the current position and selects the
/// next fragment to load, if any. At most one fragment is being loaded at a time.
///
/// What is specific to a track type is brought by its `TrackTypeHooks`.
pub(crate) struct StreamController<H: TrackTypeHooks> {
    hooks: H,
    state: ControllerState,
    config: SchedulerConfiguration,

    /// Tracks announced for the current content.
    tracks: TrackList,

    /// Track fragments are currently loaded from, if one.
    current_track_id: Option<TrackId>,

    /// Fragment being loaded, from its selection until it has been processed.
    frag_current: Option<Fragment>,

    /// Last fragment processed with success, anchor for the next selection.
    frag_previous: Option<Fragment>,

    /// Media element currently attached.
    media: Option<MediaElementId>,

    /// Start, in seconds, of the first fragment of the main track.
    last_main_start: f64,

    buffer_tracker: BufferTracker,
    tick_driver: TickDriver,
    requester: Requester,
    decrypter: DecryptionCoordinator,
}

impl<H: TrackTypeHooks> StreamController<H> {
    pub(crate) fn new(hooks: H, config: SchedulerConfiguration) -> Self {
        Self {
            hooks,
            state: ControllerState::Stopped,
            tracks: TrackList::default(),
            current_track_id: None,
            frag_current: None,
            frag_previous: None,
            media: None,
            last_main_start: 0.,
            buffer_tracker: BufferTracker::new(),
            tick_driver: TickDriver::new(config.tick_interval),
            requester: Requester::new(config.fragment_request_timeout),
            decrypter: DecryptionCoordinator::new(),
            config,
        }
    }

    pub(crate) fn set_max_buffer_length(&mut self, value: f64) -> Result<(), ConfigurationError> {
        self.config.max_buffer_length = check_positive("max_buffer_length", value)?;
        Ok(())
    }

    pub(crate) fn set_max_max_buffer_length(
        &mut self,
        value: f64,
    ) -> Result<(), ConfigurationError> {
        self.config.max_max_buffer_length = check_positive("max_max_buffer_length", value)?;
        Ok(())
    }

    pub(crate) fn set_max_buffer_hole(&mut self, value: f64) -> Result<(), ConfigurationError> {
        self.config.max_buffer_hole = check_positive("max_buffer_hole", value)?;
        Ok(())
    }

    pub(crate) fn set_max_fragment_lookup_tolerance(
        &mut self,
        value: f64,
    ) -> Result<(), ConfigurationError> {
        self.config.max_fragment_lookup_tolerance =
            check_positive("max_fragment_lookup_tolerance", value)?;
        Ok(())
    }

    pub(crate) fn set_tick_interval(
        &mut self,
        env: &mut dyn Environment,
        value: f64,
    ) -> Result<(), ConfigurationError> {
        let interval = check_strictly_positive("tick_interval", value)?;
        self.config.tick_interval = interval;
        self.tick_driver.update_interval(env, interval);
        Ok(())
    }

    pub(crate) fn set_fragment_request_timeout(
        &mut self,
        value: Option<f64>,
    ) -> Result<(), ConfigurationError> {
        let timeout = value
            .map(|v| check_strictly_positive("fragment_request_timeout", v))
            .transpose()?;
        self.config.fragment_request_timeout = timeout;
        self.requester.update_fragment_request_timeout(timeout);
        Ok(())
    }

    /// Forget about everything being loaded or decrypted.
    fn cancel_in_flight(&mut self, env: &mut dyn Environment) {
        self.requester.abort_all(env);
        self.decrypter.cancel_all();
        self.frag_current = None;
        if matches!(
            self.state,
            ControllerState::Loading | ControllerState::KeyLoading
        ) {
            self.state = ControllerState::Idle;
        }
    }

    /// Go back to waiting for the next selection, unless no media is attached.
    fn back_to_idle(&mut self) {
        if self.media.is_some() {
            self.state = ControllerState::Idle;
        } else {
            Logger::debug("Scheduler: No media attached, staying stopped");
            self.state = ControllerState::Stopped;
        }
    }
}
