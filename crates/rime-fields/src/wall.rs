//! Wall-adjacent cell detection on a structured channel mesh.

use crate::error::{FieldError, FieldResult};
use rime_core::{RimeError, WallProfile};

/// Cells touching the wall, one per mesh column, ordered by `x`.
#[derive(Clone, Debug, PartialEq)]
pub struct WallCells {
    /// Cell centres of the wall-adjacent cells.
    pub centres: Vec<[f64; 3]>,
    /// Index of each wall cell in the full internal field.
    pub indices: Vec<usize>,
}

/// Streamwise length and wall-normal height of each wall cell.
#[derive(Clone, Debug, PartialEq)]
pub struct WallCellSizes {
    pub lengths: Vec<f64>,
    pub heights: Vec<f64>,
}

/// Pick the top-most cell of every mesh column.
///
/// Cells are ordered by `x`, then `y`, and cut into columns of
/// `points_per_column - 1` cells (the column has that many vertices).
pub fn find_wall_cells(centres: &[[f64; 3]], points_per_column: usize) -> FieldResult<WallCells> {
    if points_per_column < 2 {
        return Err(RimeError::InvalidArg {
            what: "points_per_column must be at least 2",
        }
        .into());
    }
    if centres.is_empty() {
        return Err(FieldError::Missing {
            what: "cell centres".to_string(),
        });
    }

    let mut order: Vec<usize> = (0..centres.len()).collect();
    order.sort_by(|&a, &b| {
        centres[a][0]
            .total_cmp(&centres[b][0])
            .then(centres[a][1].total_cmp(&centres[b][1]))
    });

    let cells_per_column = points_per_column - 1;
    let indices: Vec<usize> = order
        .chunks(cells_per_column)
        .filter_map(|column| {
            column
                .iter()
                .copied()
                .max_by(|&a, &b| centres[a][1].total_cmp(&centres[b][1]))
        })
        .collect();

    Ok(WallCells {
        centres: indices.iter().map(|&i| centres[i]).collect(),
        indices,
    })
}

impl WallCells {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Wall samples `(x, y)` at the wall faces, one per wall cell.
    ///
    /// The face `y` is the channel half-height; the cell centres sit half
    /// a cell below it.
    pub fn profile(&self, faces: &[[f64; 3]]) -> FieldResult<WallProfile> {
        let faces = self.matching_faces(faces)?;
        let x = faces.iter().map(|f| f[0]).collect();
        let y = faces.iter().map(|f| f[1]).collect();
        Ok(WallProfile::new(x, y)?)
    }

    /// Faces ordered by `x`, checked to pair up with the wall cells.
    fn matching_faces(&self, faces: &[[f64; 3]]) -> FieldResult<Vec<[f64; 3]>> {
        if faces.len() != self.centres.len() {
            return Err(RimeError::LengthMismatch {
                what: "wall faces vs wall cells",
                expected: self.centres.len(),
                actual: faces.len(),
            }
            .into());
        }
        let mut sorted = faces.to_vec();
        sorted.sort_by(|a, b| a[0].total_cmp(&b[0]));
        Ok(sorted)
    }

    /// Pick the wall entries out of a full internal-field array.
    pub fn select(&self, field: &[f64]) -> FieldResult<Vec<f64>> {
        self.indices
            .iter()
            .map(|&i| {
                field.get(i).copied().ok_or_else(|| {
                    FieldError::from(RimeError::LengthMismatch {
                        what: "field shorter than wall cell index",
                        expected: i + 1,
                        actual: field.len(),
                    })
                })
            })
            .collect()
    }

    /// Sizes from wall cell centres and the wall face centres above them.
    ///
    /// Height is the face-to-centre distance in `y`. Length averages the
    /// neighbour spacing of the centre row and the face row.
    pub fn sizes(&self, faces: &[[f64; 3]]) -> FieldResult<WallCellSizes> {
        let faces = self.matching_faces(faces)?;
        let n = faces.len();
        if n < 2 {
            return Err(RimeError::InvalidArg {
                what: "cell sizes need at least two wall cells",
            }
            .into());
        }

        let heights = faces
            .iter()
            .zip(&self.centres)
            .map(|(f, c)| f[1] - c[1])
            .collect();
        let lengths = (0..n)
            .map(|i| 0.5 * (row_spacing(&self.centres, i) + row_spacing(&faces, i)))
            .collect();

        Ok(WallCellSizes { lengths, heights })
    }
}

fn dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// One-sided spacing at the ends, mean of both neighbours inside.
fn row_spacing(row: &[[f64; 3]], i: usize) -> f64 {
    let n = row.len();
    if i == 0 {
        dist(&row[1], &row[0])
    } else if i == n - 1 {
        dist(&row[n - 1], &row[n - 2])
    } else {
        0.5 * (dist(&row[i], &row[i - 1]) + dist(&row[i + 1], &row[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three columns of two cells each, listed out of order.
    fn grid() -> Vec<[f64; 3]> {
        vec![
            [0.2, 0.5, 0.0],
            [0.0, 0.5, 0.0],
            [0.1, 1.5, 0.0],
            [0.0, 1.5, 0.0],
            [0.2, 1.2, 0.0],
            [0.1, 0.5, 0.0],
        ]
    }

    #[test]
    fn picks_top_cell_per_column() {
        let wall = find_wall_cells(&grid(), 3).unwrap();
        assert_eq!(wall.indices, vec![3, 2, 4]);
        let y: Vec<f64> = wall.centres.iter().map(|c| c[1]).collect();
        assert_eq!(y, vec![1.5, 1.5, 1.2]);
    }

    #[test]
    fn profile_is_taken_at_the_faces() {
        let wall = find_wall_cells(&grid(), 3).unwrap();
        // Listed out of order, as a patch may be.
        let faces = [[0.2, 1.6, 0.0], [0.0, 2.0, 0.0], [0.1, 2.0, 0.0]];
        let profile = wall.profile(&faces).unwrap();
        assert_eq!(profile.x(), &[0.0, 0.1, 0.2]);
        assert_eq!(profile.y(), &[2.0, 2.0, 1.6]);
        assert!(wall.profile(&faces[..2]).is_err());
    }

    #[test]
    fn select_maps_field_to_wall() {
        let wall = find_wall_cells(&grid(), 3).unwrap();
        let field = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        assert_eq!(wall.select(&field).unwrap(), vec![13.0, 12.0, 14.0]);
        assert!(wall.select(&field[..3]).is_err());
    }

    #[test]
    fn sizes_from_faces() {
        let wall = find_wall_cells(&grid(), 3).unwrap();
        let faces = [[0.0, 2.0, 0.0], [0.1, 2.0, 0.0], [0.2, 1.6, 0.0]];
        let sizes = wall.sizes(&faces).unwrap();
        assert!((sizes.heights[0] - 0.5).abs() < 1e-12);
        assert!((sizes.heights[2] - 0.4).abs() < 1e-12);
        assert!((sizes.lengths[0] - 0.1).abs() < 1e-12);
        assert!(wall.sizes(&faces[..2]).is_err());
    }

    #[test]
    fn rejects_degenerate_columns() {
        assert!(find_wall_cells(&grid(), 1).is_err());
        assert!(find_wall_cells(&[], 3).is_err());
    }
}
