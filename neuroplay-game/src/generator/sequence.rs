use rand::Rng;
use rand::seq::index;

use super::GenerationError;
use crate::puzzle::{GameKind, SequenceSpec};

/// `length` grid cells in presentation order. Cells are distinct whenever
/// the grid has enough of them.
pub(super) fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    grid_size: u8,
    length: u8,
) -> Result<SequenceSpec, GenerationError> {
    let cells = usize::from(grid_size) * usize::from(grid_size);
    if cells == 0 || length == 0 {
        return Err(GenerationError::ConstraintUnsatisfiable {
            family: GameKind::SequenceRecall,
            reason: format!("{length} cells on a {grid_size}x{grid_size} grid"),
        });
    }
    let wanted = usize::from(length);
    let picks = if wanted <= cells {
        index::sample(rng, cells, wanted).into_vec()
    } else {
        (0..wanted).map(|_| rng.gen_range(0..cells)).collect()
    };
    Ok(SequenceSpec {
        grid_size,
        length,
        cells: picks,
    })
}
