use super::*;
use crate::{
    bindings::{FragmentLoadState, MediaType, MockEnvironment, TimerReason},
    track::{CipherMethod, FragmentRef, KeyMaterial, TrackDetails},
    utils::time_ranges::TimeRanges,
};

impl<H: TrackTypeHooks> StreamController<H> {
    fn state(&self) -> ControllerState {
        self.state
    }

    fn current_track_id(&self) -> Option<TrackId> {
        self.current_track_id
    }

    fn frag_previous(&self) -> Option<&Fragment> {
        self.frag_previous.as_ref()
    }

    fn buffered(&self, track_id: TrackId) -> Option<&TimeRanges> {
        self.buffer_tracker.ranges(track_id)
    }
}

fn fragments(list: &[(f64, f64)]) -> Vec<Fragment> {
    list.iter()
        .enumerate()
        .map(|(i, (start, duration))| {
            Fragment::new(i as u32, *start, *duration, format!("{i}.vtt"))
        })
        .collect()
}

fn details(list: &[(f64, f64)]) -> TrackDetails {
    TrackDetails::new(fragments(list), false, false).unwrap()
}

fn encrypted_details(list: &[(f64, f64)]) -> TrackDetails {
    let frags = fragments(list)
        .into_iter()
        .map(|f| {
            f.with_key(KeyMaterial::new(
                CipherMethod::Aes128,
                Some("key.bin".to_owned()),
                None,
            ))
        })
        .collect();
    TrackDetails::new(frags, false, false).unwrap()
}

fn reference(track_id: TrackId, sn: u32) -> FragmentRef {
    FragmentRef { track_id, sn }
}

/// Controller with a media attached, tracks `0` and `1` announced and track `0` chosen
/// with the given details.
fn setup(
    details: TrackDetails,
    max_buffer_length: f64,
) -> (StreamController<TextTrackHooks>, MockEnvironment) {
    let mut env = MockEnvironment::default();
    let config = SchedulerConfiguration {
        max_buffer_length,
        ..SchedulerConfiguration::default()
    };
    let mut ctrl = StreamController::new(TextTrackHooks, config);
    ctrl.handle_event(&mut env, ControllerEvent::MediaAttached { media: 1 });
    ctrl.handle_event(
        &mut env,
        ControllerEvent::TracksUpdated {
            track_ids: vec![0, 1],
        },
    );
    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(0) });
    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 0,
            details: Ok(details),
        },
    );
    (ctrl, env)
}

/// Fire the regular tick interval. Returns `false` if it was not running.
fn tick(ctrl: &mut StreamController<TextTrackHooks>, env: &mut MockEnvironment) -> bool {
    match env.take_timer(TimerReason::SchedulerInterval) {
        Some(id) => {
            ctrl.handle_event(
                env,
                ControllerEvent::TimerEnded {
                    id,
                    reason: TimerReason::SchedulerInterval,
                },
            );
            true
        }
        None => false,
    }
}

fn processed(
    ctrl: &mut StreamController<TextTrackHooks>,
    env: &mut MockEnvironment,
    fragment: FragmentRef,
    success: bool,
) {
    ctrl.handle_event(env, ControllerEvent::FragmentProcessed { fragment, success });
}

fn ranges_of(ctrl: &StreamController<TextTrackHooks>, track_id: TrackId) -> Vec<(f64, f64)> {
    ctrl.buffered(track_id)
        .unwrap()
        .into_iter()
        .map(|r| (r.start(), r.end()))
        .collect()
}

#[test]
fn test_loads_fragments_until_buffer_is_full() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.), (12., 6.)]), 10.);

    assert!(tick(&mut ctrl, &mut env));
    assert_eq!(ctrl.state(), ControllerState::Loading);
    assert_eq!(env.fetches.len(), 1);
    assert_eq!(env.fetches[0].1.fragment, reference(0, 0));
    assert_eq!(env.fetches[0].1.media_type, MediaType::Subtitle);
    assert_eq!(env.fetches[0].1.url, "0.vtt");
    assert_eq!(env.fetches[0].1.timeout, Some(20000.));

    // Nothing new while loading
    assert!(tick(&mut ctrl, &mut env));
    assert_eq!(env.fetches.len(), 1);

    processed(&mut ctrl, &mut env, reference(0, 0), true);
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert_eq!(ranges_of(&ctrl, 0), vec![(0., 6.)]);
    assert_eq!(ctrl.frag_previous().map(|f| f.sn), Some(0));

    assert!(tick(&mut ctrl, &mut env));
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(env.fetches[1].1.fragment, reference(0, 1));

    processed(&mut ctrl, &mut env, reference(0, 1), true);
    assert_eq!(ranges_of(&ctrl, 0), vec![(0., 12.)]);

    // 12 seconds buffered ahead of 0, more than the wanted 10
    assert!(tick(&mut ctrl, &mut env));
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(ctrl.state(), ControllerState::Idle);
}

#[test]
fn test_loads_next_fragment_once_position_advanced() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.), (12., 6.)]), 10.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 1), true);
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 2);

    env.position = 5.;
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 3);
    assert_eq!(env.fetches[2].1.fragment, reference(0, 2));
}

#[test]
fn test_nothing_loaded_when_everything_is_buffered() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 1), true);
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 2);
}

#[test]
fn test_reselects_from_timestamp_when_buffer_is_full() {
    let base = 1_600_000_000.;
    let frags = fragments(&[(0., 6.), (6., 6.), (12., 6.)])
        .into_iter()
        .map(|f| {
            let pdt = base + f.start;
            f.with_program_date_time(pdt)
        })
        .collect();
    let details = TrackDetails::new(frags, true, false).unwrap();
    let (mut ctrl, mut env) = setup(details, 10.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 1), true);

    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 3);
    assert_eq!(env.fetches[2].1.fragment, reference(0, 2));
}

#[test]
fn test_encrypted_fragment_loads_key_first() {
    let (mut ctrl, mut env) = setup(encrypted_details(&[(0., 6.), (6., 6.)]), 30.);

    tick(&mut ctrl, &mut env);
    assert_eq!(ctrl.state(), ControllerState::KeyLoading);
    assert_eq!(env.key_requests.len(), 1);
    assert_eq!(env.key_requests[0].fragment, reference(0, 0));
    assert_eq!(env.key_requests[0].key_uri.as_deref(), Some("key.bin"));
    assert!(env.fetches.is_empty());

    tick(&mut ctrl, &mut env);
    assert_eq!(env.key_requests.len(), 1);
    assert!(env.fetches.is_empty());

    let key = vec![7u8; 16];
    ctrl.handle_event(
        &mut env,
        ControllerEvent::KeyLoaded {
            fragment: reference(0, 0),
            key: key.clone(),
        },
    );
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert!(env.has_timer(TimerReason::ImmediateTick));

    tick(&mut ctrl, &mut env);
    assert_eq!(ctrl.state(), ControllerState::Loading);
    assert_eq!(env.fetches.len(), 1);
    let request_id = env.fetches[0].0;

    env.clock = 100.;
    ctrl.handle_event(
        &mut env,
        ControllerEvent::FragmentLoaded {
            request_id,
            payload: 42,
            payload_size: 1024,
        },
    );
    assert_eq!(env.decrypts.len(), 1);
    let (job_id, payload, used_key, iv) = env.decrypts[0].clone();
    assert_eq!(payload, 42);
    assert_eq!(used_key, key);
    assert_eq!(iv, vec![0u8; 16]);

    env.clock = 110.;
    ctrl.handle_event(
        &mut env,
        ControllerEvent::Decrypted {
            job_id,
            plaintext: 43,
        },
    );
    assert_eq!(env.announced.len(), 1);
    let (media_type, fragment, plaintext, stats) = env.announced[0];
    assert_eq!(media_type, MediaType::Subtitle);
    assert_eq!(fragment, reference(0, 0));
    assert_eq!(plaintext, 43);
    assert_eq!(stats.tstart, 100.);
    assert_eq!(stats.tdecrypt, 110.);

    // The key was installed on the fragments sharing it
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    tick(&mut ctrl, &mut env);
    assert_eq!(env.key_requests.len(), 1);
    assert_eq!(env.fetches.len(), 2);
}

#[test]
fn test_clear_fragment_is_not_decrypted() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    let request_id = env.fetches[0].0;
    ctrl.handle_event(
        &mut env,
        ControllerEvent::FragmentLoaded {
            request_id,
            payload: 42,
            payload_size: 1024,
        },
    );
    assert!(env.decrypts.is_empty());
    assert_eq!(ctrl.state(), ControllerState::Loading);
}

#[test]
fn test_error_for_other_type_is_ignored() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    assert_eq!(ctrl.state(), ControllerState::Loading);

    ctrl.handle_event(
        &mut env,
        ControllerEvent::Error {
            media_type: Some(MediaType::Audio),
        },
    );
    assert_eq!(ctrl.state(), ControllerState::Loading);
    ctrl.handle_event(&mut env, ControllerEvent::Error { media_type: None });
    assert_eq!(ctrl.state(), ControllerState::Loading);
    assert!(env.aborted.is_empty());

    ctrl.handle_event(
        &mut env,
        ControllerEvent::Error {
            media_type: Some(MediaType::Subtitle),
        },
    );
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert_eq!(env.aborted, vec![env.fetches[0].0]);

    // Retried on the next tick
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(env.fetches[1].1.fragment, reference(0, 0));
}

#[test]
fn test_failure_leaves_anchor_and_ranges_untouched() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.), (12., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    tick(&mut ctrl, &mut env);

    let previous = ctrl.frag_previous().cloned();
    let ranges = ranges_of(&ctrl, 0);
    processed(&mut ctrl, &mut env, reference(0, 1), false);
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert_eq!(ctrl.frag_previous().cloned(), previous);
    assert_eq!(ranges_of(&ctrl, 0), ranges);

    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 3);
    assert_eq!(env.fetches[2].1.fragment, reference(0, 1));
}

#[test]
fn test_duplicate_success_is_a_no_op() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    assert_eq!(ranges_of(&ctrl, 0), vec![(0., 6.)]);
    assert_eq!(ctrl.state(), ControllerState::Idle);
}

#[test]
fn test_switching_to_track_without_details_halts_ticking() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    let request_id = env.fetches[0].0;

    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(1) });
    assert_eq!(ctrl.current_track_id(), Some(1));
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert_eq!(env.aborted, vec![request_id]);
    assert!(!env.has_timer(TimerReason::SchedulerInterval));
    assert!(!env.has_timer(TimerReason::ImmediateTick));

    // The aborted request's result is stale
    ctrl.handle_event(
        &mut env,
        ControllerEvent::FragmentLoaded {
            request_id,
            payload: 42,
            payload_size: 10,
        },
    );
    assert!(env.decrypts.is_empty());

    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 1,
            details: Ok(details(&[(0., 6.)])),
        },
    );
    assert!(tick(&mut ctrl, &mut env));
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(env.fetches[1].1.fragment, reference(1, 0));
}

#[test]
fn test_switching_to_no_track_stops_ticking() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.)]), 30.);
    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: None });
    assert!(!tick(&mut ctrl, &mut env));
    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(5) });
    assert!(!tick(&mut ctrl, &mut env));
    assert!(env.fetches.is_empty());
}

#[test]
fn test_stale_decryption_is_dropped() {
    let (mut ctrl, mut env) = setup(encrypted_details(&[(0., 6.)]), 30.);
    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 1,
            details: Ok(details(&[(0., 6.)])),
        },
    );
    ctrl.handle_event(
        &mut env,
        ControllerEvent::KeyLoaded {
            fragment: reference(0, 0),
            key: vec![1; 16],
        },
    );
    tick(&mut ctrl, &mut env);
    let request_id = env.fetches[0].0;
    ctrl.handle_event(
        &mut env,
        ControllerEvent::FragmentLoaded {
            request_id,
            payload: 42,
            payload_size: 10,
        },
    );
    let job_id = env.decrypts[0].0;

    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(1) });
    ctrl.handle_event(
        &mut env,
        ControllerEvent::Decrypted {
            job_id,
            plaintext: 43,
        },
    );
    assert!(env.announced.is_empty());
    assert_eq!(env.freed, vec![43]);

    // Processing results of the old track only bring the state back to idle
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    assert_eq!(ctrl.state(), ControllerState::Idle);
    assert!(ranges_of(&ctrl, 0).is_empty());
    assert!(ctrl.frag_previous().is_none());
}

#[test]
fn test_seeking_clears_anchor() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.), (12., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    assert!(ctrl.frag_previous().is_some());

    ctrl.handle_event(&mut env, ControllerEvent::MediaSeeking);
    assert!(ctrl.frag_previous().is_none());

    env.position = 13.;
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(env.fetches[1].1.fragment, reference(0, 2));
}

#[test]
fn test_no_tick_without_media() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    let request_id = env.fetches[0].0;

    ctrl.handle_event(&mut env, ControllerEvent::MediaDetaching);
    assert_eq!(ctrl.state(), ControllerState::Stopped);
    assert_eq!(env.aborted, vec![request_id]);

    processed(&mut ctrl, &mut env, reference(0, 0), false);
    assert_eq!(ctrl.state(), ControllerState::Stopped);
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 1);

    ctrl.handle_event(&mut env, ControllerEvent::MediaAttached { media: 2 });
    assert_eq!(ctrl.state(), ControllerState::Idle);
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 2);
}

#[test]
fn test_already_loaded_fragment_is_not_fetched() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    env.fragment_states
        .push((reference(0, 0), FragmentLoadState::Loading));
    tick(&mut ctrl, &mut env);
    assert!(env.fetches.is_empty());
    assert_eq!(ctrl.state(), ControllerState::Idle);
}

#[test]
fn test_invalid_or_unknown_details_are_ignored() {
    let mut env = MockEnvironment::default();
    let mut ctrl = StreamController::new(TextTrackHooks, SchedulerConfiguration::default());
    ctrl.handle_event(&mut env, ControllerEvent::MediaAttached { media: 1 });
    ctrl.handle_event(&mut env, ControllerEvent::TracksUpdated { track_ids: vec![0] });
    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(0) });

    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 0,
            details: TrackDetails::new(vec![], false, false),
        },
    );
    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 3,
            details: Ok(details(&[(0., 6.)])),
        },
    );
    assert!(!env.has_timer(TimerReason::SchedulerInterval));
}

#[test]
fn test_live_details_are_aligned() {
    let mut env = MockEnvironment::default();
    let mut ctrl = StreamController::new(TextTrackHooks, SchedulerConfiguration::default());
    ctrl.handle_event(&mut env, ControllerEvent::MediaAttached { media: 1 });
    ctrl.handle_event(&mut env, ControllerEvent::TracksUpdated { track_ids: vec![0] });
    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(0) });
    ctrl.handle_event(
        &mut env,
        ControllerEvent::MainDetailsUpdated {
            first_fragment_start: 100.,
        },
    );
    let live = |list: &[(f64, f64)]| TrackDetails::new(fragments(list), false, true).unwrap();

    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 0,
            details: Ok(live(&[(0., 6.), (6., 6.)])),
        },
    );
    env.position = 100.;
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 1);
    assert_eq!(env.fetches[0].1.fragment, reference(0, 0));
}

#[test]
fn test_configuration_setters() {
    let mut env = MockEnvironment::default();
    let (mut ctrl, _) = setup(details(&[(0., 6.)]), 30.);
    assert!(ctrl.set_max_buffer_length(-1.).is_err());
    assert_eq!(ctrl.config.max_buffer_length, 30.);
    assert!(ctrl.set_max_buffer_hole(0.).is_ok());
    assert!(ctrl.set_tick_interval(&mut env, 0.).is_err());
    assert!(ctrl.set_fragment_request_timeout(None).is_ok());
    assert_eq!(ctrl.config.fragment_request_timeout, None);
    assert!(ctrl.set_fragment_request_timeout(Some(f64::NAN)).is_err());
}

#[test]
fn test_loaded_keys_survive_details_refresh() {
    let (mut ctrl, mut env) = setup(encrypted_details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    ctrl.handle_event(
        &mut env,
        ControllerEvent::KeyLoaded {
            fragment: reference(0, 0),
            key: vec![3; 16],
        },
    );
    tick(&mut ctrl, &mut env);
    assert_eq!(env.fetches.len(), 1);
    processed(&mut ctrl, &mut env, reference(0, 0), true);

    ctrl.handle_event(
        &mut env,
        ControllerEvent::TrackDetailsLoaded {
            id: 0,
            details: Ok(encrypted_details(&[(0., 6.), (6., 6.)])),
        },
    );
    tick(&mut ctrl, &mut env);
    assert_eq!(env.key_requests.len(), 1);
    assert_eq!(ctrl.state(), ControllerState::Loading);
    assert_eq!(env.fetches.len(), 2);
    assert_eq!(env.fetches[1].1.fragment, reference(0, 1));
}

#[test]
fn test_switching_to_same_track_keeps_loading() {
    let (mut ctrl, mut env) = setup(details(&[(0., 6.), (6., 6.)]), 30.);
    tick(&mut ctrl, &mut env);
    let request_id = env.fetches[0].0;

    ctrl.handle_event(&mut env, ControllerEvent::TrackSwitched { id: Some(0) });
    assert_eq!(ctrl.state(), ControllerState::Loading);
    assert!(env.aborted.is_empty());

    ctrl.handle_event(
        &mut env,
        ControllerEvent::FragmentLoaded {
            request_id,
            payload: 42,
            payload_size: 10,
        },
    );
    processed(&mut ctrl, &mut env, reference(0, 0), true);
    assert_eq!(ranges_of(&ctrl, 0), vec![(0., 6.)]);
    assert_eq!(ctrl.frag_previous().map(|f| f.sn), Some(0));
}
