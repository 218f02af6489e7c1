//! Synaptic weight matrices, stored either densely or as a collection of dense blocks.
use log;
use nalgebra::{DMatrix, DVectorView, DVectorViewMut};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::SNNError;

/// A dense block placed at a given offset of a block-sparse matrix.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Row of the top-left entry of the block.
    pub row: usize,
    /// Column of the top-left entry of the block.
    pub col: usize,
    /// The block entries.
    pub matrix: DMatrix<f64>,
}

impl Block {
    pub fn new(row: usize, col: usize, matrix: DMatrix<f64>) -> Self {
        Block { row, col, matrix }
    }
}

/// A weight matrix mapping an input vector to the synaptic input of a layer.
/// Entry (i, j) is the weight from input j to neuron i.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Weights {
    /// A fully dense matrix.
    Dense(DMatrix<f64>),
    /// A matrix whose non-zero entries are grouped in dense blocks, e.g., a block-diagonal matrix.
    /// Overlapping blocks add up.
    BlockSparse {
        nrows: usize,
        ncols: usize,
        blocks: Vec<Block>,
    },
}

impl Weights {
    /// Create dense weights from a row-major slice.
    /// Returns an error if the number of entries does not match the shape.
    pub fn dense_from_row_slice(
        nrows: usize,
        ncols: usize,
        data: &[f64],
    ) -> Result<Self, SNNError> {
        if data.len() != nrows * ncols {
            return Err(SNNError::DimensionMismatch(format!(
                "{} entries cannot fill a {}x{} matrix",
                data.len(),
                nrows,
                ncols
            )));
        }
        Ok(Weights::Dense(DMatrix::from_row_slice(nrows, ncols, data)))
    }

    /// The n x n identity, i.e., each neuron receives exactly one input with unit weight.
    pub fn identity(n: usize) -> Self {
        Weights::Dense(DMatrix::identity(n, n))
    }

    /// Create block-sparse weights with the provided shape and blocks.
    /// Returns an error if a block does not fit in the matrix.
    pub fn block_sparse(
        nrows: usize,
        ncols: usize,
        blocks: Vec<Block>,
    ) -> Result<Self, SNNError> {
        let weights = Weights::BlockSparse {
            nrows,
            ncols,
            blocks,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check that every block fits in the declared shape.
    /// Weights built directly from the enum variants or deserialized are only checked here.
    pub fn validate(&self) -> Result<(), SNNError> {
        if let Weights::BlockSparse {
            nrows,
            ncols,
            blocks,
        } = self
        {
            for block in blocks.iter() {
                let (r, c) = block.matrix.shape();
                if block.row + r > *nrows || block.col + c > *ncols {
                    return Err(SNNError::DimensionMismatch(format!(
                        "A {}x{} block at ({}, {}) does not fit in a {}x{} matrix",
                        r, c, block.row, block.col, nrows, ncols
                    )));
                }
            }
        }
        Ok(())
    }

    /// Create a block-diagonal matrix, the blocks being placed one after the other
    /// along the diagonal.
    pub fn block_diagonal(matrices: Vec<DMatrix<f64>>) -> Self {
        let (mut nrows, mut ncols) = (0, 0);
        let blocks = matrices
            .into_iter()
            .map(|matrix| {
                let block = Block::new(nrows, ncols, matrix);
                nrows += block.matrix.nrows();
                ncols += block.matrix.ncols();
                block
            })
            .collect();
        Weights::BlockSparse { nrows, ncols, blocks }
    }

    /// Returns dense weights whose entries are sampled uniformly between the specified limits.
    /// The seed makes the construction reproducible.
    pub fn rand(
        nrows: usize,
        ncols: usize,
        lim_weights: (f64, f64),
        seed: u64,
    ) -> Result<Self, SNNError> {
        let (min_weight, max_weight) = lim_weights;
        if !(min_weight.is_finite() && max_weight.is_finite()) || min_weight > max_weight {
            return Err(SNNError::InvalidParameter(format!(
                "Invalid weight limits ({}, {})",
                min_weight, max_weight
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weight_dist = Uniform::new_inclusive(min_weight, max_weight);
        log::debug!("Sampling {}x{} weights with seed {}", nrows, ncols, seed);
        Ok(Weights::Dense(DMatrix::from_fn(nrows, ncols, |_, _| {
            weight_dist.sample(&mut rng)
        })))
    }

    /// Returns the number of rows, i.e., of neurons fed by the weights.
    pub fn nrows(&self) -> usize {
        match self {
            Weights::Dense(matrix) => matrix.nrows(),
            Weights::BlockSparse { nrows, .. } => *nrows,
        }
    }

    /// Returns the number of columns, i.e., the input dimension.
    pub fn ncols(&self) -> usize {
        match self {
            Weights::Dense(matrix) => matrix.ncols(),
            Weights::BlockSparse { ncols, .. } => *ncols,
        }
    }

    /// Returns the (rows, columns) shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Returns the weight from input `j` to neuron `i`, if in bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.nrows() || j >= self.ncols() {
            return None;
        }
        match self {
            Weights::Dense(matrix) => Some(matrix[(i, j)]),
            Weights::BlockSparse { blocks, .. } => Some(
                blocks
                    .iter()
                    .filter_map(|block| {
                        let (r, c) = block.matrix.shape();
                        match (i.checked_sub(block.row), j.checked_sub(block.col)) {
                            (Some(bi), Some(bj)) if bi < r && bj < c => {
                                Some(block.matrix[(bi, bj)])
                            }
                            _ => None,
                        }
                    })
                    .sum(),
            ),
        }
    }

    /// Overwrite `out` with the product of the weights and `x`.
    /// The caller is responsible for `x` and `out` matching the shape.
    pub fn mul_into(&self, x: &[f64], out: &mut [f64]) {
        match self {
            Weights::Dense(matrix) => {
                let (m, n) = (out.len(), x.len());
                let x = DVectorView::from_slice(x, n);
                let mut out = DVectorViewMut::from_slice(out, m);
                out.gemv(1.0, matrix, &x, 0.0);
            }
            Weights::BlockSparse { .. } => {
                out.fill(0.0);
                self.mul_add_into(x, out);
            }
        }
    }

    /// Add the product of the weights and `x` to `out`.
    /// The caller is responsible for `x` and `out` matching the shape.
    pub fn mul_add_into(&self, x: &[f64], out: &mut [f64]) {
        match self {
            Weights::Dense(matrix) => {
                let (m, n) = (out.len(), x.len());
                let x = DVectorView::from_slice(x, n);
                let mut out = DVectorViewMut::from_slice(out, m);
                out.gemv(1.0, matrix, &x, 1.0);
            }
            Weights::BlockSparse { blocks, .. } => {
                for block in blocks.iter() {
                    let (r, c) = block.matrix.shape();
                    let x = DVectorView::from_slice(&x[block.col..block.col + c], c);
                    let mut out =
                        DVectorViewMut::from_slice(&mut out[block.row..block.row + r], r);
                    out.gemv(1.0, &block.matrix, &x, 1.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_mul_into() {
        let weights =
            Weights::dense_from_row_slice(2, 3, &[1.0, 2.0, 3.0, -1.0, 0.0, 0.5]).unwrap();
        let mut out = vec![42.0; 2];
        weights.mul_into(&[1.0, 1.0, 2.0], &mut out);
        assert_eq!(out, vec![9.0, 0.0]);

        weights.mul_add_into(&[1.0, 0.0, 0.0], &mut out);
        assert_eq!(out, vec![10.0, -1.0]);
    }

    #[test]
    fn test_dense_invalid_shape() {
        assert!(matches!(
            Weights::dense_from_row_slice(2, 2, &[1.0, 2.0, 3.0]),
            Err(SNNError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_block_diagonal_matches_dense() {
        let weights = Weights::block_diagonal(vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]),
            DMatrix::from_row_slice(1, 2, &[-1.0, 0.5]),
        ]);
        assert_eq!(weights.shape(), (3, 4));

        let dense = Weights::dense_from_row_slice(
            3,
            4,
            &[1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.5],
        )
        .unwrap();

        let x = [1.0, -1.0, 2.0, 4.0];
        let mut out_sparse = vec![7.0; 3];
        let mut out_dense = vec![0.0; 3];
        weights.mul_into(&x, &mut out_sparse);
        dense.mul_into(&x, &mut out_dense);
        assert_eq!(out_sparse, out_dense);
        assert_eq!(out_sparse, vec![-1.0, -1.0, 0.0]);

        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(weights.get(i, j), dense.get(i, j));
            }
        }
        assert_eq!(weights.get(3, 0), None);
    }

    #[test]
    fn test_block_sparse_out_of_bounds() {
        let block = Block::new(1, 1, DMatrix::identity(2, 2));
        assert!(matches!(
            Weights::block_sparse(2, 3, vec![block]),
            Err(SNNError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_validate_unchecked_blocks() {
        let weights = Weights::BlockSparse {
            nrows: 2,
            ncols: 2,
            blocks: vec![Block::new(1, 1, DMatrix::identity(2, 2))],
        };
        assert!(matches!(weights.validate(), Err(SNNError::DimensionMismatch(_))));

        let weights = Weights::BlockSparse {
            nrows: 2,
            ncols: 2,
            blocks: vec![Block::new(1, 1, DMatrix::identity(1, 1))],
        };
        assert_eq!(weights.validate(), Ok(()));
        assert_eq!(Weights::identity(3).validate(), Ok(()));
    }

    #[test]
    fn test_deserialized_blocks_are_validated() {
        let weights = Weights::block_sparse(2, 2, vec![Block::new(0, 0, DMatrix::identity(2, 2))])
            .unwrap();
        let mut json = serde_json::to_value(&weights).unwrap();
        json["BlockSparse"]["nrows"] = serde_json::json!(1);
        json["BlockSparse"]["ncols"] = serde_json::json!(1);

        let weights: Weights = serde_json::from_value(json).unwrap();
        assert_eq!(weights.shape(), (1, 1));
        assert!(matches!(weights.validate(), Err(SNNError::DimensionMismatch(_))));
    }

    #[test]
    fn test_rand_is_reproducible() {
        let weights_1 = Weights::rand(4, 3, (-0.5, 0.5), 42).unwrap();
        let weights_2 = Weights::rand(4, 3, (-0.5, 0.5), 42).unwrap();
        assert_eq!(weights_1, weights_2);
        assert_eq!(weights_1.shape(), (4, 3));
        for i in 0..4 {
            for j in 0..3 {
                let w = weights_1.get(i, j).unwrap();
                assert!((-0.5..=0.5).contains(&w));
            }
        }

        assert!(matches!(
            Weights::rand(4, 3, (0.5, -0.5), 42),
            Err(SNNError::InvalidParameter(_))
        ));
    }
}
