//! Playback coordinator behaviour against the mock media backend

mod common;

use common::{drain, init_logging, names, test_config, three_segments, MockBackend};
use seamline_engine::{
    EngineError, InstanceRegistry, MediaSignal, NoticeDuration, PlayerConfig, PlayerEvent,
    PlayerStatus, Preload, SeekOutcome, SegmentedPlayer,
};
use std::rc::Rc;
use std::time::{Duration, Instant};

struct Fixture {
    registry: Rc<InstanceRegistry>,
    backend: MockBackend,
    player: SegmentedPlayer,
}

fn fixture_with(config: PlayerConfig) -> Fixture {
    init_logging();
    let registry = InstanceRegistry::shared();
    let backend = MockBackend::new();
    let player = SegmentedPlayer::new(&three_segments(), &config, &registry, backend.factory())
        .expect("player should build");
    Fixture {
        registry,
        backend,
        player,
    }
}

fn fixture() -> Fixture {
    fixture_with(test_config())
}

/// Plays segment 0 through to the running state
fn running() -> Fixture {
    let fx = fixture();
    fx.player.play().unwrap();
    fx.backend.emit(0, MediaSignal::CanPlay);
    fx.player.process_signals();
    fx
}

fn ready_latest(fx: &Fixture) {
    fx.backend.emit_latest(MediaSignal::CanPlay);
    fx.player.process_signals();
}

#[test]
fn test_first_play_loads_segment_zero() {
    let fx = fixture();
    let rx = fx.player.subscribe();
    assert_eq!(fx.player.status(), PlayerStatus::Idle);

    fx.player.play().unwrap();

    assert_eq!(fx.backend.created(), 1);
    assert_eq!(fx.player.status(), PlayerStatus::Loading(0));
    assert_eq!(names(&drain(&rx)), vec!["play", "segment_changed"]);

    fx.backend.emit(0, MediaSignal::CanPlay);
    assert_eq!(fx.player.process_signals(), 1);

    assert_eq!(fx.player.status(), PlayerStatus::Playing(0));
    let handle = fx.backend.handle(0);
    assert_eq!(handle.borrow().play_calls, 1);
    assert!(handle.borrow().current);
}

#[test]
fn test_gap_seek_pauses_without_swap() {
    let fx = running();
    let rx = fx.player.subscribe();

    let outcome = fx.player.seek(20.0).unwrap();

    assert_eq!(outcome, SeekOutcome::Gap);
    assert!(fx.player.is_paused());
    assert_eq!(fx.player.status(), PlayerStatus::GapPaused);
    assert_eq!(fx.backend.created(), 1);
    assert_eq!(fx.player.notice_text().as_deref(), Some("No footage"));

    let events = drain(&rx);
    assert!(events.contains(&PlayerEvent::Pause));
    assert!(events.iter().any(|e| matches!(
        e,
        PlayerEvent::GapReached { gap } if gap.time_start.as_millis() == 18_001
    )));
}

#[test]
fn test_play_from_gap_resumes_at_next_segment() {
    let fx = running();
    fx.player.seek(20.0).unwrap();
    let rx = fx.player.subscribe();

    fx.player.play().unwrap();

    assert_eq!(fx.player.status(), PlayerStatus::Loading(2));
    assert_eq!(fx.player.position(), 25.0);
    assert_eq!(fx.backend.created(), 2);
    assert!(drain(&rx).contains(&PlayerEvent::NoticeHide));
}

#[test]
fn test_two_swaps_in_a_row_perform_one() {
    let fx = running();

    assert_eq!(fx.player.seek(12.0).unwrap(), SeekOutcome::Swapping(1));
    assert_eq!(fx.player.seek(26.0).unwrap(), SeekOutcome::Ignored);
    assert_eq!(fx.backend.created(), 2);
    assert_eq!(fx.backend.live(), 2);

    fx.backend.emit(1, MediaSignal::CanPlay);
    fx.player.process_signals();

    assert_eq!(fx.player.status(), PlayerStatus::Playing(1));
    assert!(fx.backend.handle(0).borrow().removed);
    assert_eq!(fx.backend.live(), 1);
    assert_eq!(fx.backend.handle(1).borrow().seeks, vec![2.0]);
}

#[test]
fn test_seek_within_loaded_segment_repositions_in_place() {
    let fx = running();

    let outcome = fx.player.seek(3.0).unwrap();

    assert_eq!(outcome, SeekOutcome::InPlace(0));
    assert_eq!(fx.backend.created(), 1);
    assert_eq!(fx.backend.handle(0).borrow().seeks, vec![3.0]);
    assert_eq!(fx.player.notice_text().as_deref(), Some("FF 3 s"));
}

#[test]
fn test_seek_backwards_shows_rewind_notice() {
    let fx = running();
    fx.player.seek(6.0).unwrap();
    fx.player.seek(2.0).unwrap();
    assert_eq!(fx.player.notice_text().as_deref(), Some("REW 4 s"));
}

#[test]
fn test_seek_into_small_hole_snaps_forward() {
    let fx = running();

    let outcome = fx.player.seek(9.0).unwrap();

    assert_eq!(outcome, SeekOutcome::Swapping(1));
    assert_eq!(fx.player.position(), 10.0);
    assert!(fx.backend.handle(1).borrow().seeks.is_empty());
}

#[test]
fn test_seek_is_clamped_to_timeline() {
    let fx = running();
    assert_eq!(fx.player.seek(-4.0).unwrap(), SeekOutcome::InPlace(0));
    assert_eq!(fx.player.seek(500.0).unwrap(), SeekOutcome::Swapping(2));
    assert_eq!(fx.player.position(), 33.0);
}

#[test]
fn test_unresolvable_seek_pauses() {
    let fx = running();
    assert_eq!(fx.player.seek(f64::NAN).unwrap(), SeekOutcome::OutOfRange);
    assert!(fx.player.is_paused());
}

#[test]
fn test_pause_twice_matches_pause_once() {
    let fx = running();
    let rx = fx.player.subscribe();

    fx.player.pause().unwrap();
    let status = fx.player.status();
    let position = fx.player.position();
    fx.player.pause().unwrap();

    assert_eq!(fx.player.status(), status);
    assert_eq!(fx.player.position(), position);
    assert_eq!(names(&drain(&rx)), vec!["pause"]);
    assert!(fx.backend.handle(0).borrow().paused);
}

#[test]
fn test_toggle_follows_handle_state() {
    let fx = running();

    fx.player.toggle().unwrap();
    assert!(fx.player.is_paused());

    fx.player.toggle().unwrap();
    assert!(!fx.player.is_paused());
    assert_eq!(fx.backend.handle(0).borrow().play_calls, 2);
}

#[test]
fn test_toggle_pauses_a_loading_player() {
    let fx = fixture();
    fx.player.play().unwrap();
    assert!(fx.player.is_loading());

    fx.player.toggle().unwrap();
    assert!(fx.player.is_paused());

    fx.backend.emit(0, MediaSignal::CanPlay);
    fx.player.process_signals();
    assert_eq!(fx.player.status(), PlayerStatus::Paused(0));
    assert_eq!(fx.backend.handle(0).borrow().play_calls, 0);
}

#[test]
fn test_signals_from_outgoing_handle_are_dropped() {
    let fx = running();
    fx.player.seek(12.0).unwrap();

    fx.backend.emit(0, MediaSignal::Ended);
    fx.player.process_signals();

    assert_eq!(fx.player.status(), PlayerStatus::Loading(1));
    assert_eq!(fx.backend.created(), 2);

    ready_latest(&fx);
    assert!(!fx.backend.emit(0, MediaSignal::TimeUpdate));
}

#[test]
fn test_ended_chains_to_next_segment() {
    let fx = running();
    let rx = fx.player.subscribe();

    fx.backend.emit(0, MediaSignal::Ended);
    fx.player.process_signals();

    assert_eq!(fx.player.status(), PlayerStatus::Loading(1));
    assert!(drain(&rx).contains(&PlayerEvent::SegmentChanged { index: 1 }));

    ready_latest(&fx);
    assert_eq!(fx.player.status(), PlayerStatus::Playing(1));
}

#[test]
fn test_last_segment_end_finishes_timeline() {
    let fx = running();
    fx.player.seek(26.0).unwrap();
    ready_latest(&fx);
    let rx = fx.player.subscribe();

    fx.backend.emit_latest(MediaSignal::Ended);
    fx.player.process_signals();

    assert_eq!(fx.player.played_fraction(), 1.0);
    assert!(fx.player.is_paused());
    assert_eq!(names(&drain(&rx)), vec!["pause", "ended"]);
    assert_eq!(fx.registry.holder(), None);
}

#[test]
fn test_play_after_finish_restarts() {
    let fx = running();
    fx.player.seek(26.0).unwrap();
    ready_latest(&fx);
    fx.backend.emit_latest(MediaSignal::Ended);
    fx.player.process_signals();

    fx.player.play().unwrap();

    assert_eq!(fx.player.status(), PlayerStatus::Loading(0));
    assert_eq!(fx.player.position(), 0.0);
    assert_eq!(fx.backend.created(), 3);
}

#[test]
fn test_loop_restarts_after_last_segment() {
    let fx = fixture_with(PlayerConfig {
        loop_playback: true,
        ..test_config()
    });
    fx.player.play().unwrap();
    fx.player.process_signals();
    ready_latest(&fx);
    fx.player.seek(30.0).unwrap();
    ready_latest(&fx);

    fx.backend.emit_latest(MediaSignal::Ended);
    fx.player.process_signals();

    assert_eq!(fx.player.status(), PlayerStatus::Loading(0));
    assert!(!fx.player.is_paused());
}

#[test]
fn test_media_error_while_loading_pauses_and_reports() {
    let fx = fixture();
    let rx = fx.player.subscribe();
    fx.player.play().unwrap();

    fx.backend.handle(0).borrow_mut().media_error = true;
    fx.backend.emit(0, MediaSignal::Error);
    fx.player.process_signals();

    assert!(fx.player.is_paused());
    assert!(!fx.player.is_loading());
    assert_eq!(fx.player.notice_text().as_deref(), Some("Video load failed"));
    assert!(drain(&rx).contains(&PlayerEvent::Error {
        has_media_error: true
    }));
    assert_eq!(fx.registry.holder(), None);

    fx.player.play().unwrap();
    assert_eq!(fx.backend.created(), 2);
    assert_eq!(fx.player.status(), PlayerStatus::Loading(0));
}

#[test]
fn test_incidental_error_is_reported_only() {
    let fx = fixture();
    let rx = fx.player.subscribe();
    fx.player.play().unwrap();

    fx.backend.emit(0, MediaSignal::Error);
    fx.player.process_signals();

    assert!(fx.player.is_loading());
    assert!(!fx.player.is_paused());
    assert!(drain(&rx).contains(&PlayerEvent::Error {
        has_media_error: false
    }));
}

#[test]
fn test_factory_failure_surfaces_synchronously() {
    let fx = fixture();
    fx.backend.fail_next_create();

    let result = fx.player.play();

    assert!(matches!(result, Err(EngineError::MediaLoadFailure { .. })));
    assert!(fx.player.is_paused());
    assert_eq!(fx.player.status(), PlayerStatus::Idle);
}

#[test]
fn test_rejected_play_pauses() {
    let fx = fixture();
    fx.player.play().unwrap();
    fx.backend.handle(0).borrow_mut().reject_play = true;
    let rx = fx.player.subscribe();

    ready_latest(&fx);

    assert!(fx.player.is_paused());
    assert_eq!(fx.player.status(), PlayerStatus::Paused(0));
    assert_eq!(names(&drain(&rx)), vec!["pause"]);
}

#[test]
fn test_native_controls_echo_into_player() {
    let fx = running();

    fx.backend.emit(0, MediaSignal::Pause);
    fx.player.process_signals();
    assert!(fx.player.is_paused());

    fx.backend.handle(0).borrow_mut().paused = false;
    fx.backend.emit(0, MediaSignal::Play);
    fx.player.process_signals();
    assert!(!fx.player.is_paused());
}

#[test]
fn test_play_echo_from_paused_handle_is_ignored() {
    let fx = running();
    fx.player.pause().unwrap();

    fx.backend.emit(0, MediaSignal::Play);
    fx.player.process_signals();

    assert!(fx.player.is_paused());
    assert_eq!(fx.backend.handle(0).borrow().play_calls, 1);
}

#[test]
fn test_volume_clamped_announced_and_carried() {
    let fx = fixture();

    assert_eq!(fx.player.set_volume(1.5).unwrap(), 1.0);
    assert_eq!(fx.player.notice_text().as_deref(), Some("Volume 100%"));

    fx.player.play().unwrap();
    assert_eq!(fx.backend.handle(0).borrow().volume, 1.0);

    assert_eq!(fx.player.set_volume_quiet(0.25).unwrap(), 0.25);
    assert_eq!(fx.backend.handle(0).borrow().volume, 0.25);
    assert_eq!(fx.player.notice_text().as_deref(), Some("Volume 100%"));
}

#[test]
fn test_speed_applies_to_current_handle_only() {
    let fx = fixture();
    assert!(matches!(
        fx.player.speed(2.0),
        Err(EngineError::InvalidState(_))
    ));

    fx.player.play().unwrap();
    ready_latest(&fx);
    fx.player.speed(2.0).unwrap();
    assert_eq!(fx.backend.handle(0).borrow().rate, 2.0);
    assert!(matches!(
        fx.player.speed(0.0),
        Err(EngineError::InvalidSpeed(_))
    ));

    fx.player.seek(12.0).unwrap();
    assert_eq!(fx.backend.handle(1).borrow().rate, 1.0);
}

#[test]
fn test_time_update_maps_to_virtual_and_wall_clock() {
    let fx = running();
    fx.player.seek(12.0).unwrap();
    ready_latest(&fx);
    let rx = fx.player.subscribe();

    fx.backend.handle(1).borrow_mut().time = 2.5;
    fx.backend.emit(1, MediaSignal::TimeUpdate);
    fx.player.process_signals();

    assert_eq!(fx.player.position(), 12.5);
    match drain(&rx).as_slice() {
        [PlayerEvent::TimeUpdate {
            position_secs,
            played_fraction,
            wall_clock,
        }] => {
            assert_eq!(*position_secs, 12.5);
            assert_eq!(*played_fraction, 12.5 / 33.0);
            assert_eq!(wall_clock.as_millis(), 12_500);
        }
        other => panic!("unexpected events {:?}", other),
    }
    assert_eq!(fx.player.clock_text(), "00:12 / 00:33");
}

#[test]
fn test_progress_reports_loaded_fraction() {
    let fx = running();
    fx.backend.handle(0).borrow_mut().buffered = Some(4.0);

    fx.backend.emit(0, MediaSignal::Progress);
    fx.player.process_signals();

    assert_eq!(fx.player.loaded_fraction(), 4.0 / 33.0);
}

#[test]
fn test_notice_auto_hides_on_tick() {
    let fx = running();
    fx.player.seek(3.0).unwrap();
    let rx = fx.player.subscribe();

    fx.player.tick(Instant::now());
    assert!(drain(&rx).is_empty());

    fx.player.tick(Instant::now() + Duration::from_secs(3));
    assert_eq!(drain(&rx), vec![PlayerEvent::NoticeHide]);
    assert!(fx.player.notice_text().is_none());
}

#[test]
fn test_custom_notice_and_resize() {
    let fx = fixture();
    let rx = fx.player.subscribe();

    fx.player.notice("Camera 2", NoticeDuration::Persistent).unwrap();
    fx.player.resize().unwrap();

    assert_eq!(
        drain(&rx),
        vec![
            PlayerEvent::NoticeShow {
                text: "Camera 2".to_string()
            },
            PlayerEvent::Resize
        ]
    );
}

#[test]
fn test_poster_created_and_replaced_on_play() {
    let fx = fixture_with(PlayerConfig::default());

    assert_eq!(fx.backend.created(), 1);
    {
        let poster = fx.backend.handle(0);
        let poster = poster.borrow();
        assert_eq!(poster.request.preload, Preload::Metadata);
        assert!(poster.current);
    }
    assert_eq!(fx.player.status(), PlayerStatus::Idle);

    fx.player.play().unwrap();
    assert_eq!(fx.backend.handle(1).borrow().request.preload, Preload::Auto);
    ready_latest(&fx);

    assert!(fx.backend.handle(0).borrow().removed);
    assert_eq!(fx.player.status(), PlayerStatus::Playing(0));
}

#[test]
fn test_autoplay_starts_loading_at_construction() {
    let fx = fixture_with(PlayerConfig {
        autoplay: true,
        ..test_config()
    });
    assert_eq!(fx.player.status(), PlayerStatus::Loading(0));
    assert_eq!(fx.registry.holder(), Some(fx.player.id()));
}

#[test]
fn test_invalid_config_rejected() {
    let registry = InstanceRegistry::shared();
    let backend = MockBackend::new();
    let config = PlayerConfig {
        volume: 2.0,
        ..test_config()
    };

    let result = SegmentedPlayer::new(&three_segments(), &config, &registry, backend.factory());

    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    assert!(registry.is_empty());
}

#[test]
fn test_destroy_tears_everything_down() {
    let fx = running();
    fx.player.seek(12.0).unwrap();
    let rx = fx.player.subscribe();

    fx.player.destroy();

    let events = drain(&rx);
    assert_eq!(events.last(), Some(&PlayerEvent::Destroy));
    assert_eq!(fx.backend.live(), 0);
    assert!(fx.registry.is_empty());
    assert_eq!(fx.player.status(), PlayerStatus::Destroyed);
    assert!(matches!(fx.player.play(), Err(EngineError::Destroyed)));
    assert!(matches!(fx.player.seek(1.0), Err(EngineError::Destroyed)));
    assert_eq!(fx.player.process_signals(), 0);

    fx.player.destroy();
    assert!(rx.recv().is_err());
}
