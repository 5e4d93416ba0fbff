//src/forge/src/inheritance.rs
use items::{Grade, Item, ItemId, ItemType, RandomSource};
use thiserror::Error;
use tracing::{debug, info};

/// Success chance and level loss for one grade gap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritanceRule {
    pub success_rate: f64,
    pub level_reduction: u32,
}

/// Largest grade gap inheritance accepts
pub const MAX_GRADE_GAP: u8 = 4;

/// Rule for a gap of `gap` grades; `None` outside `1..=MAX_GRADE_GAP`.
pub const fn rule_for_gap(gap: u8) -> Option<InheritanceRule> {
    let (success_rate, level_reduction) = match gap {
        1 => (0.70, 1),
        2 => (0.50, 2),
        3 => (0.30, 3),
        4 => (0.15, 4),
        _ => return None,
    };
    Some(InheritanceRule {
        success_rate,
        level_reduction,
    })
}

#[derive(Debug, Error, PartialEq)]
pub enum InheritError {
    #[error("source and target are the same item")]
    SameItem,
    #[error("type mismatch: source is {source_type}, target is {target_type}")]
    TypeMismatch {
        source_type: ItemType,
        target_type: ItemType,
    },
    #[error("{0} cannot take part in inheritance")]
    NotEnhanceable(ItemType),
    #[error("target grade {target} must be higher than source grade {source_grade}")]
    GradeNotHigher { source_grade: Grade, target: Grade },
    #[error("grade gap {0} is outside 1..=4")]
    GradeGapOutOfRange(i32),
    #[error("source item has no enhancement to pass on")]
    SourceNotEnhanced,
}

/// Result of a resolved inheritance roll.
///
/// The source is consumed whatever the roll; on success the caller also
/// replaces the target with `inherited_item`.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritOutcome {
    pub success: bool,
    pub inherited_item: Option<Item>,
    pub consumed_source: ItemId,
    pub target_id: ItemId,
    pub grade_gap: u8,
    pub success_rate: f64,
}

/// Check every precondition without touching randomness.
pub fn validate(source: &Item, target: &Item) -> Result<(u8, InheritanceRule), InheritError> {
    if source.id == target.id {
        return Err(InheritError::SameItem);
    }
    if source.item_type != target.item_type {
        return Err(InheritError::TypeMismatch {
            source_type: source.item_type,
            target_type: target.item_type,
        });
    }
    if !source.is_enhanceable() {
        return Err(InheritError::NotEnhanceable(source.item_type));
    }
    let gap = source.grade.gap_to(target.grade);
    if gap <= 0 {
        return Err(InheritError::GradeNotHigher {
            source_grade: source.grade,
            target: target.grade,
        });
    }
    let rule = u8::try_from(gap)
        .ok()
        .and_then(|gap| rule_for_gap(gap).map(|rule| (gap, rule)))
        .ok_or(InheritError::GradeGapOutOfRange(gap))?;
    if source.enhancement_level == 0 {
        return Err(InheritError::SourceNotEnhanced);
    }
    Ok(rule)
}

/// Level the target ends up with after a successful transfer
pub fn inherited_level(source_level: u32, rule: &InheritanceRule) -> u32 {
    source_level.saturating_sub(rule.level_reduction)
}

/// Transfer `source`'s enhancement level onto the higher-grade `target`.
pub fn inherit<R: RandomSource + ?Sized>(
    source: &Item,
    target: &Item,
    rng: &mut R,
) -> Result<InheritOutcome, InheritError> {
    let (grade_gap, rule) = validate(source, target)?;

    let roll = rng.next_f64();
    let success = roll < rule.success_rate;
    debug!(source = %source.id, target = %target.id, grade_gap, roll, rate = rule.success_rate, "inheritance roll");

    let inherited_item = success.then(|| {
        target.at_enhancement_level(inherited_level(source.enhancement_level, &rule))
    });

    info!(
        source = %source.id,
        target = %target.id,
        success,
        level = inherited_item.as_ref().map(|item| item.enhancement_level),
        "inheritance resolved"
    );
    Ok(InheritOutcome {
        success,
        inherited_item,
        consumed_source: source.id.clone(),
        target_id: target.id.clone(),
        grade_gap,
        success_rate: rule.success_rate,
    })
}
