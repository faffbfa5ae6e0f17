//! Section C: infer a composed grid transformation from training pairs.

use crate::model::{locate, GridExample, Item, ItemKind};
use crate::rng::SeededRng;

/// Binary grid, row-major.
pub type Grid = Vec<Vec<u8>>;

const ITEMS: usize = 6;
const TRAIN_PAIRS: usize = 3;
const MIN_SIDE: i64 = 4;
const MAX_SIDE: i64 = 6;

/// A composed transformation and how it is described to the test-taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridRule {
    RotateInvertCross,
    TransposeChecker,
    MirrorDominantQuadrant,
    FlipMirrorZeroBorder,
    ParityCollapse,
    RotateStagger,
}

impl GridRule {
    pub const ALL: [GridRule; 6] = [
        GridRule::RotateInvertCross,
        GridRule::TransposeChecker,
        GridRule::MirrorDominantQuadrant,
        GridRule::FlipMirrorZeroBorder,
        GridRule::ParityCollapse,
        GridRule::RotateStagger,
    ];

    pub fn prompt(self) -> &'static str {
        match self {
            GridRule::RotateInvertCross => {
                "Deduce the precise multi-step mapping between each input grid and its output."
            }
            GridRule::TransposeChecker => {
                "Identify the composed transformation applied to the training grids."
            }
            GridRule::MirrorDominantQuadrant => {
                "Resolve how the transformation emphasises only one quadrant."
            }
            GridRule::FlipMirrorZeroBorder => {
                "Infer the chained operations that leave only interior structure."
            }
            GridRule::ParityCollapse => "Work out how entire rows become uniform in the outputs.",
            GridRule::RotateStagger => {
                "Disentangle the rotation and shifting operations visible in the examples."
            }
        }
    }

    /// Correct description first, then three decoys.
    pub fn descriptions(self) -> [&'static str; 4] {
        match self {
            GridRule::RotateInvertCross => [
                "Rotate 180° → invert binary values → force the central cross to 1s",
                "Transpose → zero the border → invert binary values",
                "Flip horizontally → rotate 90° → mirror across the diagonal",
                "Rotate 90° clockwise → write a checkerboard overlay → keep the cross off",
            ],
            GridRule::TransposeChecker => [
                "Transpose the matrix → overlay 1s on even-parity (r+c) cells",
                "Rotate 270° → overlay a central cross of 1s",
                "Flip vertically → zero every odd column",
                "Transpose → replace the densest quadrant with zeros",
            ],
            GridRule::MirrorDominantQuadrant => [
                "Mirror across the main diagonal → promote the quadrant with the most 1s to solid 1s, others to 0s",
                "Transpose → delete the sparsest quadrant",
                "Rotate 90° → invert rows with more 1s than 0s",
                "Mirror across the anti-diagonal → copy top-right into all quadrants",
            ],
            GridRule::FlipMirrorZeroBorder => [
                "Flip horizontally → mirror across diagonal → set every border cell to 0",
                "Rotate 180° → invert binary → erase the centre cross",
                "Flip vertically → rotate 90° → set border cells to 1",
                "Transpose → duplicate the top row to every row",
            ],
            GridRule::ParityCollapse => [
                "Measure row parity → write full 1s for odd rows → full 0s for even rows",
                "Rows with majority zeros copy the row above",
                "Every second row mirrors the main diagonal",
                "Rotate 90° → erase rows with even indices",
            ],
            GridRule::RotateStagger => [
                "Rotate 90° clockwise → shift rows downward cyclically by one → zero the new top row",
                "Rotate 270° → shift columns right by two → fill voids with 1s",
                "Flip vertically → shift rows upward by index count",
                "Transpose → append a zero row at the bottom",
            ],
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            GridRule::RotateInvertCross => {
                "Each output rotates the grid 180°, inverts 0/1, then activates the middle row and column."
            }
            GridRule::TransposeChecker => {
                "Outputs are transposes of the inputs with a parity mask forcing even (r+c) cells to 1."
            }
            GridRule::MirrorDominantQuadrant => {
                "The grid becomes diagonal-symmetric, then the quadrant containing the most 1s is saturated while others clear."
            }
            GridRule::FlipMirrorZeroBorder => {
                "Outputs result from a horizontal flip, diagonal mirroring, then zeroing the perimeter."
            }
            GridRule::ParityCollapse => {
                "Row parity is measured and collapsed: odd-parity rows become all 1s, even-parity rows become all 0s."
            }
            GridRule::RotateStagger => {
                "Each output is a clockwise rotation, followed by a single-step downward cyclic shift with the promoted top row cleared."
            }
        }
    }

    pub fn apply(self, grid: &Grid) -> Grid {
        match self {
            GridRule::RotateInvertCross => activate_cross(&invert(&rotate_180(grid))),
            GridRule::TransposeChecker => {
                let t = transpose(grid);
                t.iter()
                    .enumerate()
                    .map(|(r, row)| {
                        row.iter()
                            .enumerate()
                            .map(|(c, &cell)| u8::from(cell == 1 || (r + c) % 2 == 0))
                            .collect()
                    })
                    .collect()
            }
            GridRule::MirrorDominantQuadrant => saturate_dominant_quadrant(&mirror_diagonal(grid)),
            GridRule::FlipMirrorZeroBorder => zero_border(&mirror_diagonal(&flip_horizontal(grid))),
            GridRule::ParityCollapse => grid
                .iter()
                .map(|row| {
                    let ones: u32 = row.iter().map(|&c| u32::from(c)).sum();
                    vec![(ones % 2) as u8; row.len()]
                })
                .collect(),
            GridRule::RotateStagger => rotate_shift_zero_top(grid),
        }
    }
}

pub fn generate(rng: &mut SeededRng) -> Vec<Item> {
    let rules = rng.shuffle(&GridRule::ALL);
    rules
        .into_iter()
        .take(ITEMS)
        .map(|rule| build_item(rule, rng))
        .collect()
}

fn build_item(rule: GridRule, rng: &mut SeededRng) -> Item {
    let fragment = rng.fragment();
    let train = (0..TRAIN_PAIRS)
        .map(|_| {
            let input = random_grid(rng);
            let output = rule.apply(&input);
            GridExample { input, output }
        })
        .collect();
    let descriptions = rule.descriptions();
    let options: Vec<String> = rng
        .shuffle(&descriptions)
        .into_iter()
        .map(str::to_owned)
        .collect();
    let correct_index = locate(&options, &descriptions[0].to_owned());

    let mut item = Item::choice(fragment, ItemKind::Grid, rule.prompt(), options, correct_index)
        .with_rationale(rule.explanation());
    item.train = train;
    item
}

fn random_grid(rng: &mut SeededRng) -> Grid {
    let rows = rng.int(MIN_SIDE, MAX_SIDE) as usize;
    let cols = rng.int(MIN_SIDE, MAX_SIDE) as usize;
    (0..rows)
        .map(|_| (0..cols).map(|_| u8::from(rng.next_f64() > 0.5)).collect())
        .collect()
}

fn dims(grid: &Grid) -> (usize, usize) {
    (grid.len(), grid.first().map_or(0, Vec::len))
}

pub fn rotate_clockwise(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    let mut out = vec![vec![0; rows]; cols];
    for (r, row) in grid.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            out[c][rows - 1 - r] = cell;
        }
    }
    out
}

pub fn rotate_180(grid: &Grid) -> Grid {
    grid.iter()
        .rev()
        .map(|row| row.iter().rev().copied().collect())
        .collect()
}

pub fn transpose(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    let mut out = vec![vec![0; rows]; cols];
    for (r, row) in grid.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            out[c][r] = cell;
        }
    }
    out
}

pub fn flip_horizontal(grid: &Grid) -> Grid {
    grid.iter()
        .map(|row| row.iter().rev().copied().collect())
        .collect()
}

pub fn invert(grid: &Grid) -> Grid {
    grid.iter()
        .map(|row| row.iter().map(|&c| u8::from(c == 0)).collect())
        .collect()
}

fn activate_cross(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    let mut out = grid.clone();
    if rows == 0 || cols == 0 {
        return out;
    }
    let (mid_row, mid_col) = (rows / 2, cols / 2);
    out[mid_row].iter_mut().for_each(|c| *c = 1);
    for row in out.iter_mut() {
        row[mid_col] = 1;
    }
    out
}

/// Copy the upper triangle of the leading square block onto the lower one.
pub fn mirror_diagonal(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    let limit = rows.min(cols);
    let mut out = grid.clone();
    for r in 0..limit {
        for c in (r + 1)..limit {
            out[c][r] = grid[r][c];
        }
    }
    out
}

fn saturate_dominant_quadrant(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    let (mid_row, mid_col) = (rows / 2, cols / 2);
    let quadrant = |r: usize, c: usize| (if r < mid_row { 0 } else { 2 }) + usize::from(c >= mid_col);

    let mut sums = [0u32; 4];
    for (r, row) in grid.iter().enumerate() {
        for (c, &cell) in row.iter().enumerate() {
            sums[quadrant(r, c)] += u32::from(cell);
        }
    }
    // First quadrant wins ties.
    let max = sums.iter().copied().max().unwrap_or(0);
    let dominant = sums.iter().position(|&s| s == max).unwrap_or(0);

    (0..rows)
        .map(|r| (0..cols).map(|c| u8::from(quadrant(r, c) == dominant)).collect())
        .collect()
}

fn zero_border(grid: &Grid) -> Grid {
    let (rows, cols) = dims(grid);
    grid.iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, &cell)| {
                    if r == 0 || c == 0 || r + 1 == rows || c + 1 == cols {
                        0
                    } else {
                        cell
                    }
                })
                .collect()
        })
        .collect()
}

fn rotate_shift_zero_top(grid: &Grid) -> Grid {
    let rotated = rotate_clockwise(grid);
    let rows = rotated.len();
    if rows == 0 {
        return rotated;
    }
    let mut shifted: Grid = (0..rows)
        .map(|i| rotated[(i + rows - 1) % rows].clone())
        .collect();
    shifted[0].iter_mut().for_each(|c| *c = 0);
    shifted
}
