//! Animation tables for the player and enemy spritesheets.

use arcade2d::{Animation, AnimationSet};

pub const IDLE: &str = "idle";
pub const RUN: &str = "run";
// Two keys for the same frames: a second mid-air jump must restart the
// animation, and replaying the key that is still running would be ignored.
pub const JUMP_FIRST: &str = "jump1";
pub const JUMP_SECOND: &str = "jump2";

pub const PLAGUE_DOCTOR_IDLE: &str = "plagueDoctor-idle";

pub fn player_animations() -> AnimationSet {
    let jump = Animation::new(17, 23, 2.0, 1);
    AnimationSet::new()
        .with(IDLE, Animation::looping(0, 8, 8.0))
        .with(RUN, Animation::looping(11, 16, 8.0))
        .with(JUMP_FIRST, jump.clone())
        .with(JUMP_SECOND, jump)
}

pub fn plague_doctor_animations() -> AnimationSet {
    AnimationSet::new().with(PLAGUE_DOCTOR_IDLE, Animation::looping(0, 12, 8.0))
}
