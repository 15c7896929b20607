//! Integration tests for Store timers and action broadcasting
//!
//! A self-rescheduling timer (the shape of a simulation clock) driven
//! through the public Store API with paused tokio time.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use critter_core::{Effect, EffectId, Reducer, SmallVec, cancellable_delay, smallvec};
use critter_runtime::{Store, StoreConfig, StoreError};
use std::time::Duration;

const BEAT: EffectId = EffectId::new("beat");
const INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum BeatAction {
    Start,
    Stop,
    Beat { epoch: u64 },
    Ping,
    Pong,
}

#[derive(Debug, Clone, Default)]
struct BeatState {
    running: bool,
    epoch: u64,
    beats: u32,
    limit: Option<u32>,
}

#[derive(Clone)]
struct BeatEnvironment;

#[derive(Clone)]
struct BeatReducer;

impl Reducer for BeatReducer {
    type State = BeatState;
    type Action = BeatAction;
    type Environment = BeatEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BeatAction::Start => {
                state.running = true;
                state.epoch += 1;
                smallvec![cancellable_delay! {
                    id: BEAT,
                    duration: INTERVAL,
                    action: BeatAction::Beat { epoch: state.epoch }
                }]
            },
            BeatAction::Stop => {
                state.running = false;
                state.epoch += 1;
                smallvec![Effect::Cancel(BEAT)]
            },
            BeatAction::Beat { epoch } if state.running && epoch == state.epoch => {
                state.beats += 1;
                if state.limit.is_some_and(|limit| state.beats >= limit) {
                    state.running = false;
                    return smallvec![Effect::Cancel(BEAT)];
                }
                smallvec![cancellable_delay! {
                    id: BEAT,
                    duration: INTERVAL,
                    action: BeatAction::Beat { epoch }
                }]
            },
            BeatAction::Beat { .. } => smallvec![Effect::None],
            BeatAction::Ping => smallvec![Effect::Future(Box::pin(async {
                Some(BeatAction::Pong)
            }))],
            BeatAction::Pong => smallvec![Effect::None],
        }
    }
}

fn store(limit: Option<u32>) -> Store<BeatState, BeatAction, BeatEnvironment, BeatReducer> {
    Store::with_config(
        BeatState {
            limit,
            ..BeatState::default()
        },
        BeatReducer,
        BeatEnvironment,
        StoreConfig::default().with_broadcast_capacity(64),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn recurring_timer_fires_once_per_interval() {
    let store = store(None);
    store.send(BeatAction::Start).await.unwrap();

    tokio::time::sleep(INTERVAL * 5 + INTERVAL / 2).await;
    assert_eq!(store.state(|s| s.beats).await, 5);
    assert!(store.is_pending(BEAT));
}

#[tokio::test(start_paused = true)]
async fn stopping_halts_the_timer_for_good() {
    let store = store(None);
    store.send(BeatAction::Start).await.unwrap();

    tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
    store.send(BeatAction::Stop).await.unwrap();
    let beats = store.state(|s| s.beats).await;

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(store.state(|s| s.beats).await, beats);
    assert!(!store.is_pending(BEAT));
}

#[tokio::test(start_paused = true)]
async fn reducer_can_halt_its_own_timer() {
    let store = store(Some(3));
    store.send(BeatAction::Start).await.unwrap();

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(store.state(|s| s.beats).await, 3);
    assert!(!store.state(|s| s.running).await);
}

#[tokio::test(start_paused = true)]
async fn restart_does_not_double_schedule() {
    let store = store(None);
    store.send(BeatAction::Start).await.unwrap();
    tokio::time::sleep(INTERVAL / 2).await;
    store.send(BeatAction::Start).await.unwrap();

    tokio::time::sleep(INTERVAL * 3 + INTERVAL / 4).await;
    assert_eq!(store.state(|s| s.beats).await, 3);
}

#[tokio::test(start_paused = true)]
async fn timer_firings_are_broadcast() {
    let store = store(None);
    let mut rx = store.subscribe_actions();
    store.send(BeatAction::Start).await.unwrap();

    let first = tokio::time::timeout(INTERVAL * 2, rx.recv())
        .await
        .expect("beat within two intervals")
        .unwrap();
    assert_eq!(first, BeatAction::Beat { epoch: 1 });
}

#[tokio::test]
async fn send_and_wait_for_returns_matching_action() {
    let store = store(None);
    let result = store
        .send_and_wait_for(
            BeatAction::Ping,
            |a| matches!(a, BeatAction::Pong),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    assert_eq!(result, BeatAction::Pong);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_a_running_timer() {
    let store = store(None);
    store.send(BeatAction::Start).await.unwrap();

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert!(matches!(
        store.send(BeatAction::Start).await,
        Err(StoreError::ShutdownInProgress)
    ));
}
