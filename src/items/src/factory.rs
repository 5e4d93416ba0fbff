//src/items/src/factory.rs
use crate::grade::Grade;
use crate::item_type::ItemType;
use crate::rng::RandomSource;
use crate::stats::ItemStats;
use crate::table;
use crate::{Item, ItemError, ItemId};

/// Bounds of the random bonus added to each populated base stat, in points
pub const BONUS_MIN: u32 = 1;
pub const BONUS_MAX: u32 = 5;

/// Build a fresh item of `item_type` at `grade`.
///
/// The type template decides which fields are populated; each populated field
/// receives the grade's base magnitude plus a uniform bonus of
/// `BONUS_MIN..=BONUS_MAX` points. Same random source state, same item.
pub fn create_item<R: RandomSource + ?Sized>(
    item_type: ItemType,
    grade: Grade,
    rng: &mut R,
) -> Result<Item, ItemError> {
    if !item_type.allows_grade(grade) {
        return Err(ItemError::GradeNotAllowed { item_type, grade });
    }

    let template = table::template(item_type);
    let magnitudes = table::grade_base_stats(grade);

    let mut base = ItemStats::default();
    for kind in template.non_zero() {
        let bonus = rng.next_in_range(BONUS_MIN, BONUS_MAX) as f64;
        base.set(
            kind,
            template.get(kind) * magnitudes.get(kind) + kind.from_points(bonus),
        );
    }

    Ok(Item {
        id: ItemId::generate(rng),
        item_type,
        grade,
        base_stats: base,
        enhanced_stats: base,
        level: 1,
        enhancement_level: 0,
        image_path: item_type.image_path(),
    })
}

/// Uniformly pick one of the twelve enhanceable types
pub fn random_enhanceable_type<R: RandomSource + ?Sized>(rng: &mut R) -> ItemType {
    ItemType::ENHANCEABLE[rng.next_index(ItemType::ENHANCEABLE.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRandom, SeededRandom};
    use crate::stats::StatKind;
    use strum::IntoEnumIterator;

    #[test]
    fn only_the_primary_stat_is_populated() {
        let mut rng = SeededRandom::new(11);
        for kind in ItemType::ENHANCEABLE {
            for grade in Grade::STANDARD {
                let item = create_item(kind, grade, &mut rng).unwrap();
                let populated: Vec<_> = item.base_stats.non_zero().collect();
                assert_eq!(populated, vec![kind.primary_stat()], "{kind} {grade}");
                assert_eq!(item.base_stats, item.enhanced_stats);
                assert_eq!(item.enhancement_level, 0);
                assert_eq!(item.level, 1);
            }
        }
    }

    #[test]
    fn bonus_stays_within_bounds() {
        let mut rng = SeededRandom::new(3);
        for _ in 0..200 {
            let helmet = create_item(ItemType::Helmet, Grade::Rare, &mut rng).unwrap();
            let bonus = helmet.base_stats.defense - 20.0;
            assert!((1.0..=5.0).contains(&bonus), "bonus {bonus}");

            let ring = create_item(ItemType::Ring, Grade::Rare, &mut rng).unwrap();
            let bonus = StatKind::CriticalChance.to_points(ring.base_stats.critical_chance - 0.020);
            assert!((1.0..=5.0).contains(&bonus), "bonus points {bonus}");
        }
    }

    #[test]
    fn scripted_rolls_pick_exact_bonus() {
        // 0.0 -> lowest bonus, 0.99 -> highest
        let low = create_item(ItemType::Weapon, Grade::Common, &mut ScriptedRandom::constant(0.0)).unwrap();
        let high = create_item(ItemType::Weapon, Grade::Common, &mut ScriptedRandom::constant(0.99)).unwrap();
        assert_eq!(low.base_stats.attack, 11.0);
        assert_eq!(high.base_stats.attack, 15.0);
    }

    #[test]
    fn deterministic_for_a_seed() {
        let a = create_item(ItemType::Pet, Grade::Epic, &mut SeededRandom::new(99)).unwrap();
        let b = create_item(ItemType::Pet, Grade::Epic, &mut SeededRandom::new(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ids_are_unique() {
        let mut rng = SeededRandom::new(5);
        let ids: std::collections::HashSet<_> = (0..500)
            .map(|_| create_item(ItemType::Boots, Grade::Common, &mut rng).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn impossible_combinations_are_rejected() {
        let mut rng = SeededRandom::new(1);
        assert!(matches!(
            create_item(ItemType::Helmet, Grade::Divine, &mut rng),
            Err(ItemError::GradeNotAllowed { .. })
        ));
        assert!(create_item(ItemType::DivineSword, Grade::Mythic, &mut rng).is_err());
        let sword = create_item(ItemType::DivineSword, Grade::Divine, &mut rng).unwrap();
        assert_eq!(sword.base_stats.non_zero().collect::<Vec<_>>(), vec![StatKind::Attack]);
    }

    #[test]
    fn random_type_is_never_unique() {
        let mut rng = SeededRandom::new(8);
        for _ in 0..100 {
            assert!(random_enhanceable_type(&mut rng).is_enhanceable());
        }
        assert!(ItemType::iter().count() > ItemType::ENHANCEABLE.len());
    }
}
