use crate::bindings::{Environment, TimerId, TimerReason};

/// Drives a controller's ticks through host timers.
///
/// A regular interval is re-armed each time it fires, while one-shot "immediate" ticks can
/// be requested after events which may allow loading to progress. At most one immediate
/// tick is pending at any time.
#[derive(Debug)]
pub(crate) struct TickDriver {
    /// Interval between regular ticks, in milliseconds.
    interval: f64,

    interval_timer: Option<TimerId>,
    immediate_timer: Option<TimerId>,
}

impl TickDriver {
    pub(crate) fn new(interval: f64) -> Self {
        Self {
            interval,
            interval_timer: None,
            immediate_timer: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.interval_timer.is_some()
    }

    /// (Re)start the regular interval.
    pub(crate) fn start(&mut self, env: &mut dyn Environment) {
        if let Some(id) = self.interval_timer.take() {
            env.clear_timer(id);
        }
        self.interval_timer = Some(env.start_timer(self.interval, TimerReason::SchedulerInterval));
    }

    /// Stop all ticks, pending immediate one included.
    pub(crate) fn stop(&mut self, env: &mut dyn Environment) {
        if let Some(id) = self.interval_timer.take() {
            env.clear_timer(id);
        }
        if let Some(id) = self.immediate_timer.take() {
            env.clear_timer(id);
        }
    }

    /// Ask for a tick as soon as possible. Does nothing if stopped.
    pub(crate) fn request_tick(&mut self, env: &mut dyn Environment) {
        if self.is_running() && self.immediate_timer.is_none() {
            self.immediate_timer = Some(env.start_timer(0., TimerReason::ImmediateTick));
        }
    }

    pub(crate) fn update_interval(&mut self, env: &mut dyn Environment, interval: f64) {
        self.interval = interval;
        if self.is_running() {
            self.start(env);
        }
    }

    /// Method to call once a timer finished.
    ///
    /// Returns `true` if it was one of this `TickDriver`'s timers, meaning a tick should be
    /// performed.
    pub(crate) fn on_timer_ended(
        &mut self,
        env: &mut dyn Environment,
        id: TimerId,
        reason: TimerReason,
    ) -> bool {
        match reason {
            TimerReason::SchedulerInterval if self.interval_timer == Some(id) => {
                self.interval_timer =
                    Some(env.start_timer(self.interval, TimerReason::SchedulerInterval));
                true
            }
            TimerReason::ImmediateTick if self.immediate_timer == Some(id) => {
                self.immediate_timer = None;
                true
            }
            _ => false,
        }
    }
}
