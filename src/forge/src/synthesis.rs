//src/forge/src/synthesis.rs
use items::{Grade, Item, ItemError, ItemId, RandomSource, create_item, random_enhanceable_type};
use thiserror::Error;
use tracing::info;

/// Items consumed by one synthesis
pub const SYNTHESIS_INPUT_COUNT: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum SynthesisError {
    #[error("{0} items cannot be synthesized into a higher grade")]
    TerminalGrade(Grade),
    #[error("need {required} {grade} items, have {available} ({missing} missing)")]
    InsufficientMaterials {
        grade: Grade,
        available: usize,
        required: usize,
        missing: usize,
    },
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// The caller removes `used_items` and stores `synthesized_item`.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub synthesized_item: Item,
    pub used_items: Vec<Item>,
}

impl SynthesisOutcome {
    pub fn used_ids(&self) -> Vec<ItemId> {
        self.used_items.iter().map(|item| item.id.clone()).collect()
    }
}

/// Merge ten `grade` items picked at random from `pool` into one item of the
/// next grade with a random type.
pub fn synthesize<R: RandomSource + ?Sized>(
    pool: &[Item],
    grade: Grade,
    rng: &mut R,
) -> Result<SynthesisOutcome, SynthesisError> {
    let next = grade.next().ok_or(SynthesisError::TerminalGrade(grade))?;

    let mut candidates: Vec<&Item> = pool.iter().filter(|item| item.grade == grade).collect();
    if candidates.len() < SYNTHESIS_INPUT_COUNT {
        return Err(SynthesisError::InsufficientMaterials {
            grade,
            available: candidates.len(),
            required: SYNTHESIS_INPUT_COUNT,
            missing: SYNTHESIS_INPUT_COUNT - candidates.len(),
        });
    }

    // partial Fisher-Yates: the first ten slots end up a uniform sample
    for i in 0..SYNTHESIS_INPUT_COUNT {
        let j = i + rng.next_index(candidates.len() - i);
        candidates.swap(i, j);
    }
    let used_items: Vec<Item> = candidates[..SYNTHESIS_INPUT_COUNT]
        .iter()
        .map(|item| (*item).clone())
        .collect();

    let item_type = random_enhanceable_type(rng);
    let synthesized_item = create_item(item_type, next, rng)?;
    info!(from = %grade, to = %next, item = %synthesized_item.id, "synthesis");

    Ok(SynthesisOutcome {
        synthesized_item,
        used_items,
    })
}
