//! Shared helpers for service tests

use uuid::Uuid;

use crate::domain::{Actor, UserRole};
use crate::repositories::MockActivityRecorder;

pub fn actor(role: UserRole) -> Actor {
    Actor::new(Uuid::new_v4(), role)
}

/// Recorder expecting exactly one entry with `action`.
pub fn expect_activity(action: &'static str) -> MockActivityRecorder {
    let mut recorder = MockActivityRecorder::new();
    recorder
        .expect_record()
        .withf(move |entry| entry.action == action)
        .times(1)
        .return_const(());
    recorder
}

/// Recorder that fails the test if anything is recorded.
pub fn no_activity() -> MockActivityRecorder {
    let mut recorder = MockActivityRecorder::new();
    recorder.expect_record().never();
    recorder
}
