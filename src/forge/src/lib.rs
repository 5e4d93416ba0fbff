//src/forge/src/lib.rs
//! Item mutation engines: gacha draws, enhancement, inheritance and synthesis.
//!
//! Every engine is a pure function of its inputs and a random source. None of
//! them touch player state; they return a result the caller applies as one
//! transition.

pub mod enhancement;
pub mod gacha;
pub mod inheritance;
pub mod synthesis;

pub use crate::enhancement::{EnhanceAttempt, EnhanceError, EnhanceOutcome, enhance, enhancement_cost};
pub use crate::gacha::{DrawCategory, DrawResult, Gacha, GachaError, GradeRates, MultiDrawResult};
pub use crate::inheritance::{InheritError, InheritOutcome, InheritanceRule, inherit};
pub use crate::synthesis::{SYNTHESIS_INPUT_COUNT, SynthesisError, SynthesisOutcome, synthesize};
