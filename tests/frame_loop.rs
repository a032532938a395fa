mod common;

use bird_sentry::frame::ImageFiles;
use bird_sentry::{FrameLoopState, Mode, ResultSet};
use common::*;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
fn target_label_sounds_deterrent_and_saves_frame() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(1, 0.8)])],
        Box::new(player.clone()),
    );

    let state = FrameLoopState::new(Instant::now());
    let (_, report) = frame_loop.handle_frame(state, &frame()).unwrap();
    let report = report.unwrap();

    assert!(report.deterrent);
    assert!(report.saved.as_ref().unwrap().exists());
    assert_eq!(report.novel, None);
    assert_eq!(*player.played.borrow(), [dir.path().join("alarm.wav")]);

    let lines = log_lines(dir.path());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "frame");
    assert_eq!(lines[0]["results"][0]["label"], SQUIRREL);
    assert_eq!(lines[1]["event"], "deterrent");
    assert_eq!(lines[1]["label"], SQUIRREL);
    assert_eq!(lines[1]["played"], true);
    assert!(lines[1]["timestamp"].is_string());
}

#[test]
fn background_frame_is_not_saved_but_deterrent_still_checked() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(0, 0.9), (1, 0.3)])],
        Box::new(player.clone()),
    );

    let (_, report) = frame_loop
        .handle_frame(FrameLoopState::new(Instant::now()), &frame())
        .unwrap();
    let report = report.unwrap();

    assert!(report.saved.is_none());
    assert!(report.deterrent);
    assert!(saved_images(dir.path()).is_empty());
    assert_eq!(player.played.borrow().len(), 1);
}

#[test]
fn empty_results_are_neither_saved_nor_deterred() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(1, 0.05), (2, 0.02)])],
        Box::new(player.clone()),
    );

    let (state, report) = frame_loop
        .handle_frame(FrameLoopState::new(Instant::now()), &frame())
        .unwrap();
    let report = report.unwrap();

    assert!(report.results.is_empty());
    assert!(report.saved.is_none());
    assert!(!report.deterrent);
    assert!(state.previous.is_empty());
    assert!(player.played.borrow().is_empty());
}

#[test]
fn non_target_foreground_is_saved_silently() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(2, 0.7), (0, 0.2)])],
        Box::new(player.clone()),
    );

    let (_, report) = frame_loop
        .handle_frame(FrameLoopState::new(Instant::now()), &frame())
        .unwrap();

    assert!(report.unwrap().saved.is_some());
    assert!(player.played.borrow().is_empty());
    assert_eq!(saved_images(dir.path()).len(), 1);
}

#[test]
fn training_saves_only_on_label_change() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Training),
        dir.path(),
        vec![
            scores(&[(2, 0.6), (3, 0.3), (4, 0.2)]),
            scores(&[(4, 0.7), (2, 0.5), (3, 0.4)]),
            scores(&[(2, 0.6), (3, 0.3), (1, 0.2)]),
        ],
        Box::new(player.clone()),
    );

    let mut state = FrameLoopState::new(Instant::now());
    let mut novel = Vec::new();
    for _ in 0..3 {
        let (next, report) = frame_loop.handle_frame(state, &frame()).unwrap();
        let report = report.unwrap();
        assert_eq!(report.saved.is_some(), report.novel.unwrap());
        novel.push(report.novel.unwrap());
        state = next;
    }

    assert_eq!(novel, [true, false, true]);
    assert_eq!(saved_images(dir.path()).len(), 2);
    // squirrel appeared in the last frame but the deterrent is off in training
    assert!(player.played.borrow().is_empty());
}

#[test]
fn training_can_also_sound_deterrent() {
    let dir = tempdir().unwrap();
    let player = RecordingPlayer::default();
    let mut opts = options(Mode::Training);
    opts.deterrent_in_training = true;
    let mut frame_loop = build_loop(
        opts,
        dir.path(),
        vec![scores(&[(1, 0.9)])],
        Box::new(player.clone()),
    );

    let (_, report) = frame_loop
        .handle_frame(FrameLoopState::new(Instant::now()), &frame())
        .unwrap();

    assert!(report.unwrap().deterrent);
    assert_eq!(player.played.borrow().len(), 1);
}

#[test]
fn state_is_replaced_with_current_frame() {
    let dir = tempdir().unwrap();
    let mut frame_loop = build_loop(
        options(Mode::Training),
        dir.path(),
        vec![scores(&[(2, 0.6), (3, 0.3)])],
        Box::new(RecordingPlayer::default()),
    );

    let before = Instant::now();
    let state = FrameLoopState::new(before);
    assert_eq!(state.previous, ResultSet::placeholder());
    let (state, report) = frame_loop.handle_frame(state, &frame()).unwrap();

    assert_eq!(state.previous, report.unwrap().results);
    assert!(state.previous_time >= before);
}

#[test]
fn classifier_failure_keeps_previous_state() {
    let dir = tempdir().unwrap();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![None],
        Box::new(RecordingPlayer::default()),
    );

    let start = Instant::now();
    let (state, report) = frame_loop
        .handle_frame(FrameLoopState::new(start), &frame())
        .unwrap();

    assert!(report.is_none());
    assert_eq!(state.previous, ResultSet::placeholder());
    assert_eq!(state.previous_time, start);
}

#[test]
fn unknown_class_index_is_fatal() {
    let dir = tempdir().unwrap();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(42, 0.9)])],
        Box::new(RecordingPlayer::default()),
    );

    let result = frame_loop.handle_frame(FrameLoopState::new(Instant::now()), &frame());
    assert!(result.is_err());
}

#[test]
fn playback_failure_does_not_stop_the_loop() {
    let dir = tempdir().unwrap();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        dir.path(),
        vec![scores(&[(1, 0.9)]), scores(&[(1, 0.8)])],
        Box::new(BrokenPlayer),
    );

    let state = FrameLoopState::new(Instant::now());
    let (state, first) = frame_loop.handle_frame(state, &frame()).unwrap();
    let (_, second) = frame_loop.handle_frame(state, &frame()).unwrap();

    assert!(first.unwrap().deterrent);
    assert!(second.unwrap().deterrent);
    assert_eq!(saved_images(dir.path()).len(), 2);
    let alarms: Vec<_> = log_lines(dir.path())
        .into_iter()
        .filter(|l| l["event"] == "deterrent")
        .collect();
    assert_eq!(alarms.len(), 2);
    assert!(alarms.iter().all(|l| l["played"] == false));
}

#[test]
fn save_failure_is_logged_and_skipped() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone");
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        &missing,
        vec![scores(&[(2, 0.9)])],
        Box::new(RecordingPlayer::default()),
    );

    let (state, report) = frame_loop
        .handle_frame(FrameLoopState::new(Instant::now()), &frame())
        .unwrap();

    assert!(report.unwrap().saved.is_none());
    assert_eq!(state.previous.top().unwrap().label, "cardinal");
}

#[test]
fn run_drains_the_source() {
    let frames_dir = tempdir().unwrap();
    let storage = tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        frame().save(frames_dir.path().join(name)).unwrap();
    }
    std::fs::write(frames_dir.path().join("notes.txt"), "not a frame").unwrap();
    let mut source = ImageFiles::from_dir(frames_dir.path()).unwrap();
    assert_eq!(source.len(), 3);

    let player = RecordingPlayer::default();
    let mut frame_loop = build_loop(
        options(Mode::Deterrent),
        storage.path(),
        vec![
            scores(&[(2, 0.9)]),
            scores(&[(0, 0.9)]),
            scores(&[(1, 0.9)]),
        ],
        Box::new(player.clone()),
    );
    frame_loop.run(&mut source).unwrap();

    let saved = saved_images(storage.path());
    assert_eq!(saved.len(), 2);
    assert_eq!(player.played.borrow().len(), 1);
    let frames: Vec<_> = log_lines(storage.path())
        .into_iter()
        .filter(|l| l["event"] == "frame")
        .collect();
    assert_eq!(frames.len(), 2);
}

#[test]
fn diagnostics_survive_zero_frame_gap() {
    let dir = tempdir().unwrap();
    let mut opts = options(Mode::Deterrent);
    opts.print = true;
    let mut frame_loop = build_loop(
        opts,
        dir.path(),
        vec![scores(&[(2, 0.6), (3, 0.3)]), scores(&[])],
        Box::new(RecordingPlayer::default()),
    );

    // a previous frame that ends after this one leaves no gap, so FPS is inf
    let ahead = Instant::now() + Duration::from_secs(3600);
    let (state, report) = frame_loop
        .handle_frame(FrameLoopState::new(ahead), &frame())
        .unwrap();
    assert_eq!(report.unwrap().results.len(), 2);
    assert!(state.previous_time < ahead);

    let (state, report) = frame_loop.handle_frame(state, &frame()).unwrap();
    assert!(report.unwrap().results.is_empty());
    assert!(state.previous.is_empty());
}
