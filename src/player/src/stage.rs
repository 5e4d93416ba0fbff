// src/player/src/stage.rs
use crate::stats::PlayerStats;

/// Attack and defense a player needs to hold a stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRequirement {
    pub attack: f64,
    pub defense: f64,
}

/// Requirement for `stage`; stage 1 (and the invalid stage 0) asks for nothing.
pub fn requirement(stage: u32) -> StageRequirement {
    if stage <= 1 {
        return StageRequirement {
            attack: 0.0,
            defense: 0.0,
        };
    }
    // past a few thousand stages the powers are infinite anyway
    let steps = i32::try_from(stage - 2).unwrap_or(i32::MAX);
    StageRequirement {
        attack: (15.0 * 1.2f64.powi(steps)).round(),
        defense: (8.0 * 1.18f64.powi(steps)).round(),
    }
}

pub fn meets(stage: u32, stats: &PlayerStats) -> bool {
    let needed = requirement(stage);
    stats.attack >= needed.attack && stats.defense >= needed.defense
}

/// Highest stage at or below `stage` that `stats` satisfy. Never raises the
/// stage; the floor is stage 1.
pub fn clamp_stage(stage: u32, stats: &PlayerStats) -> u32 {
    let stage = stage.max(1);
    if meets(stage, stats) {
        return stage;
    }
    // requirements never shrink as stages rise, so bisect between a stage
    // that is held (or the floor) and one that is not
    let (mut held, mut missed) = (1, stage);
    while missed - held > 1 {
        let mid = held + (missed - held) / 2;
        if meets(mid, stats) {
            held = mid;
        } else {
            missed = mid;
        }
    }
    held
}
