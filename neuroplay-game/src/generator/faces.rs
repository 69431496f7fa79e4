use rand::seq::SliceRandom;
use std::collections::HashSet;

use super::GenerationError;
use super::options::with_distractors;
use crate::constants::DISTRACTOR_COUNT;
use crate::puzzle::{FaceIdentity, FaceSpec, GameKind};
use crate::rng::RngBundle;

/// Study set of `count` faces plus one probe. Probes do not repeat until
/// every identity in the catalog has been asked about once.
pub(super) fn generate(
    rngs: &mut RngBundle,
    catalog: &[FaceIdentity],
    count: u8,
    probed: &mut HashSet<String>,
) -> Result<FaceSpec, GenerationError> {
    let needed = usize::from(count).max(DISTRACTOR_COUNT + 1);
    if catalog.is_empty() {
        return Err(GenerationError::EmptyCatalog(GameKind::FaceName));
    }
    if catalog.len() < needed {
        return Err(GenerationError::CatalogTooSmall {
            family: GameKind::FaceName,
            needed,
            available: catalog.len(),
        });
    }

    let mut fresh: Vec<&FaceIdentity> = catalog
        .iter()
        .filter(|identity| !probed.contains(&identity.id))
        .collect();
    if fresh.is_empty() {
        probed.clear();
        fresh = catalog.iter().collect();
    }
    let Some(probe) = fresh.choose(rngs.content()).copied() else {
        return Err(GenerationError::EmptyCatalog(GameKind::FaceName));
    };

    let others: Vec<&FaceIdentity> = catalog
        .iter()
        .filter(|identity| identity.id != probe.id)
        .collect();
    let mut identities: Vec<FaceIdentity> = others
        .choose_multiple(rngs.content(), usize::from(count).saturating_sub(1))
        .map(|identity| (*identity).clone())
        .collect();
    identities.push(probe.clone());
    identities.shuffle(rngs.shuffle());
    let probe_index = identities
        .iter()
        .position(|identity| identity.id == probe.id)
        .unwrap_or_default();

    // Wrong names come from the study set; unseen names only fill the gap.
    let studied: Vec<String> = identities
        .iter()
        .filter(|identity| identity.id != probe.id)
        .map(|identity| identity.name.clone())
        .collect();
    let pool: Vec<String> = if studied.len() >= DISTRACTOR_COUNT {
        studied
    } else {
        let unseen: Vec<String> = others
            .iter()
            .map(|identity| identity.name.clone())
            .filter(|name| !studied.contains(name))
            .collect();
        let missing = DISTRACTOR_COUNT - studied.len();
        let top_up: Vec<String> = unseen
            .choose_multiple(rngs.distractors(), missing)
            .cloned()
            .collect();
        studied.into_iter().chain(top_up).collect()
    };
    let options = with_distractors(GameKind::FaceName, probe.name.clone(), pool, rngs)?;

    probed.insert(probe.id.clone());
    Ok(FaceSpec {
        identities,
        probe: probe_index,
        options,
        answer: probe.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameContent;

    #[test]
    fn probes_cycle_through_catalog_before_repeating() {
        let content = GameContent::bundled().unwrap();
        let mut rngs = RngBundle::from_user_seed(4);
        let mut probed = HashSet::new();
        let mut seen = HashSet::new();
        for _ in 0..content.faces.len() {
            let spec = generate(&mut rngs, &content.faces, 4, &mut probed).unwrap();
            assert!(seen.insert(spec.answer.clone()), "{} repeated", spec.answer);
        }
        let next = generate(&mut rngs, &content.faces, 4, &mut probed).unwrap();
        assert_eq!(probed.len(), 1);
        assert!(seen.contains(&next.answer));
    }

    #[test]
    fn probe_points_at_answer() {
        let content = GameContent::bundled().unwrap();
        let mut rngs = RngBundle::from_user_seed(17);
        let mut probed = HashSet::new();
        let spec = generate(&mut rngs, &content.faces, 6, &mut probed).unwrap();
        assert_eq!(spec.identities.len(), 6);
        assert_eq!(spec.identities[spec.probe].name, spec.answer);
        assert!(spec.options.contains(&spec.answer));
        assert_eq!(spec.options.len(), 4);
    }

    #[test]
    fn distractors_come_from_the_study_set() {
        let content = GameContent::bundled().unwrap();
        let mut rngs = RngBundle::from_user_seed(23);
        let mut probed = HashSet::new();
        for count in [4, 6] {
            for _ in 0..10 {
                let spec = generate(&mut rngs, &content.faces, count, &mut probed).unwrap();
                for option in &spec.options {
                    assert!(
                        spec.identities.iter().any(|identity| identity.name == *option),
                        "{option} was never studied"
                    );
                }
            }
        }
    }

    #[test]
    fn small_study_sets_are_topped_up_from_the_catalog() {
        let content = GameContent::bundled().unwrap();
        let mut rngs = RngBundle::from_user_seed(31);
        let mut probed = HashSet::new();
        for _ in 0..10 {
            let spec = generate(&mut rngs, &content.faces, 3, &mut probed).unwrap();
            assert_eq!(spec.options.len(), 4);
            for identity in &spec.identities {
                assert!(spec.options.contains(&identity.name));
            }
        }
    }

    #[test]
    fn tiny_catalog_is_rejected() {
        let catalog = vec![
            FaceIdentity {
                id: "a".into(),
                name: "A".into(),
                portrait: String::new(),
            },
            FaceIdentity {
                id: "b".into(),
                name: "B".into(),
                portrait: String::new(),
            },
        ];
        let mut rngs = RngBundle::from_user_seed(1);
        let err = generate(&mut rngs, &catalog, 2, &mut HashSet::new()).unwrap_err();
        assert!(matches!(err, GenerationError::CatalogTooSmall { .. }));
        let err = generate(&mut rngs, &[], 2, &mut HashSet::new()).unwrap_err();
        assert_eq!(err, GenerationError::EmptyCatalog(GameKind::FaceName));
    }
}
