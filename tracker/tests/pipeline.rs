//! End-to-end: frames through the pipeline, across the channel, into
//! action controllers on other threads.

use std::thread;
use std::time::Duration;

use handlazy_tracker::actions::{ActionController, ControlAction, ControlMode};
use handlazy_tracker::channel::{channel, RecvError};
use handlazy_tracker::gesture::{
    DetectedHand, GestureConfig, GestureType, HandFrame, HandJoint, HandLandmarks, Handedness,
    Landmark, LANDMARK_COUNT,
};
use handlazy_tracker::pipeline::{GestureState, TrackingPipeline};

/// Palm at the bottom of the frame, thumb and index tip where asked.
fn hand(thumb: (f32, f32), index: (f32, f32)) -> DetectedHand {
    let mut points = vec![Landmark::new(0.5, 0.9, 0.0); LANDMARK_COUNT];
    points[HandJoint::ThumbTip.index()] = Landmark::new(thumb.0, thumb.1, 0.0);
    points[HandJoint::IndexTip.index()] = Landmark::new(index.0, index.1, 0.0);
    DetectedHand {
        landmarks: HandLandmarks::from_slice(&points).unwrap(),
        handedness: Some(Handedness::Right),
        confidence: Some(0.9),
    }
}

fn pointing(ts: i64, y: f32) -> HandFrame {
    HandFrame::with_hand(ts, hand((0.2, 0.9), (0.5, y)))
}

fn pinching(ts: i64) -> HandFrame {
    HandFrame::with_hand(ts, hand((0.51, 0.5), (0.5, 0.5)))
}

fn pipeline() -> TrackingPipeline {
    TrackingPipeline::new(GestureConfig::default(), 1000, 1000).unwrap()
}

#[test]
fn replayed_records_produce_a_click() {
    let mut p = pipeline();
    let mut controller = ActionController::new(&GestureConfig::default(), ControlMode::Pointer);

    let lines: Vec<String> = [pointing(0, 0.5), pinching(40), pointing(80, 0.5)]
        .iter()
        .map(HandFrame::to_sexp)
        .collect();

    let mut actions = Vec::new();
    for line in &lines {
        let frame = HandFrame::from_sexp(line).unwrap();
        actions.extend(controller.handle(&p.process(&frame)));
    }
    let clicks: Vec<_> = actions
        .iter()
        .filter(|a| matches!(a, ControlAction::Click { .. }))
        .collect();
    assert_eq!(clicks.len(), 1, "actions: {:?}", actions);
}

#[test]
fn consumer_on_another_thread_sees_final_state() {
    let (tx, rx) = channel::<GestureState>();
    let consumer = thread::spawn(move || {
        let mut timestamps = Vec::new();
        while let Ok(state) = rx.recv() {
            timestamps.push(state.timestamp_ms);
            thread::sleep(Duration::from_millis(2));
        }
        timestamps
    });

    let mut p = pipeline();
    for i in 0..300 {
        let ts = i * 33;
        let frame = if i % 10 < 5 { pointing(ts, 0.5) } else { pinching(ts) };
        tx.publish(p.process(&frame));
    }
    drop(tx);

    let timestamps = consumer.join().unwrap();
    assert!(!timestamps.is_empty());
    assert!(
        timestamps.windows(2).all(|w| w[0] < w[1]),
        "states delivered out of order"
    );
    assert_eq!(timestamps.last(), Some(&(299 * 33)));
}

#[test]
fn multiple_consumers_each_get_latest() {
    let (tx, a) = channel::<GestureState>();
    let b = a.resubscribe();
    let mut p = pipeline();

    tx.publish(p.process(&pointing(0, 0.5)));
    tx.publish(p.process(&pinching(40)));
    tx.publish(p.process(&pinching(300)));

    for rx in [&a, &b] {
        let state = rx.recv().unwrap();
        assert_eq!(state.gesture, GestureType::PinchHold);
        assert_eq!(rx.try_recv(), None);
    }
    drop(tx);
    assert_eq!(a.recv(), Err(RecvError::Closed));
}

#[test]
fn held_pinch_steps_volume_in_media_mode() {
    let config = GestureConfig::default();
    let mut p = pipeline();
    let mut controller = ActionController::new(&config, ControlMode::Media);

    let mut levels = Vec::new();
    let mut frames = vec![pointing(0, 0.5)];
    frames.extend((1..=10).map(|i| pinching(i * 50)));
    for frame in &frames {
        for action in controller.handle(&p.process(frame)) {
            if let ControlAction::SetVolume { percent } = action {
                levels.push(percent);
            }
        }
    }
    // first step on pinch entry at 50, then every 200 ms: 250, 450
    assert_eq!(levels, vec![60, 70, 80]);
}

#[test]
fn lost_hand_mid_pinch_releases_without_click() {
    let mut p = pipeline();
    let mut controller = ActionController::new(&GestureConfig::default(), ControlMode::Pointer);

    controller.handle(&p.process(&pointing(0, 0.5)));
    controller.handle(&p.process(&pinching(40)));
    let state = p.process(&HandFrame::empty(80));
    assert_eq!(state.gesture, GestureType::PinchRelease);
    assert!(controller.handle(&state).is_empty());
    assert_eq!(p.process(&HandFrame::empty(110)).gesture, GestureType::Idle);
}
