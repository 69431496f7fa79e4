//! Fixed, known-good rounds used when generation keeps failing.
use std::rc::Rc;

use crate::graph::Graph;
use crate::puzzle::{
    Cell, CognitiveDomain, Direction, DirectionPrompt, DirectionQuestion, DirectionSpec,
    FaceIdentity, FaceSpec, MapSpec, PuzzleSpec, QuestionPayload, ScreeningQuestionSpec,
    SequenceSpec, StepList,
};

const LINE_LANDMARKS: [&str; 5] = ["Gate", "Fountain", "Square", "Tower", "Garden"];
const FALLBACK_FACES: [(&str, &str); 4] = [
    ("fallback-1", "Ada"),
    ("fallback-2", "Ben"),
    ("fallback-3", "Cem"),
    ("fallback-4", "Dora"),
];

pub(super) fn sequence() -> PuzzleSpec {
    PuzzleSpec::Sequence(SequenceSpec {
        grid_size: 3,
        length: 3,
        cells: vec![0, 4, 8],
    })
}

pub(super) fn direction(prompt: DirectionPrompt) -> PuzzleSpec {
    let question = match prompt {
        DirectionPrompt::Replay => DirectionQuestion::Replay,
        DirectionPrompt::StepRecall => DirectionQuestion::StepRecall {
            index: 0,
            options: Direction::ALL.to_vec(),
            answer: Direction::Up,
        },
    };
    PuzzleSpec::Direction(DirectionSpec {
        grid: 3,
        start: Cell::new(1, 1),
        steps: StepList::from_slice(&[Direction::Up, Direction::Right]),
        target: Cell::new(0, 2),
        question,
    })
}

/// Gate - Fountain - Square - Tower - Garden, asked from Gate to Square.
pub(super) fn map() -> PuzzleSpec {
    let graph = Rc::new(Graph::chain("fallback-line", &LINE_LANDMARKS));
    PuzzleSpec::Map(MapSpec {
        graph,
        from: 0,
        to: 2,
        path: vec![0, 1, 2],
        options: ["Square", "Fountain", "Garden", "Tower"]
            .iter()
            .map(|name| (*name).to_string())
            .collect(),
        answer: LINE_LANDMARKS[1].to_string(),
    })
}

pub(super) fn face() -> PuzzleSpec {
    let identities: Vec<FaceIdentity> = FALLBACK_FACES
        .iter()
        .map(|(id, name)| FaceIdentity {
            id: (*id).to_string(),
            name: (*name).to_string(),
            portrait: String::new(),
        })
        .collect();
    let options = identities.iter().map(|face| face.name.clone()).collect();
    PuzzleSpec::Face(FaceSpec {
        answer: FALLBACK_FACES[0].1.to_string(),
        identities,
        probe: 0,
        options,
    })
}

/// A trivially answerable choice question that keeps the slot's id and
/// domain so domain averages stay aligned with the bank.
pub(super) fn screening(id: &str, domain: CognitiveDomain) -> PuzzleSpec {
    PuzzleSpec::Screening(ScreeningQuestionSpec {
        id: id.to_string(),
        domain,
        prompt: "Which of these is a colour?".to_string(),
        payload: QuestionPayload::Choice {
            options: ["Table", "Blue", "Seven", "Run"]
                .iter()
                .map(|option| (*option).to_string())
                .collect(),
            answer: "Blue".to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinder::find_path;
    use crate::puzzle::walk;

    #[test]
    fn map_template_is_consistent() {
        let PuzzleSpec::Map(spec) = map() else {
            panic!("expected map");
        };
        assert_eq!(find_path(&spec.graph, spec.from, spec.to), spec.path);
        assert_eq!(spec.path_names()[1], spec.answer);
        assert!(spec.options.contains(&spec.answer));
        assert!(!spec.options.iter().any(|o| o == spec.from_name()));
    }

    #[test]
    fn direction_template_walks_to_target() {
        for prompt in [DirectionPrompt::Replay, DirectionPrompt::StepRecall] {
            let PuzzleSpec::Direction(spec) = direction(prompt) else {
                panic!("expected direction");
            };
            assert_eq!(walk(spec.start, &spec.steps, spec.grid), Some(spec.target));
        }
    }

    #[test]
    fn face_template_probe_matches_answer() {
        let PuzzleSpec::Face(spec) = face() else {
            panic!("expected face");
        };
        assert_eq!(spec.identities[spec.probe].name, spec.answer);
        assert_eq!(spec.options.len(), 4);
    }
}
