use crate::error::{Result, VectorIndexError};

/// Exhaustive nearest-neighbor search over a small vector set.
///
/// The action catalog stays in the tens of entries, so a brute-force scan
/// beats any approximate structure on both latency and simplicity. The
/// trait exists so a larger deployment can swap in an ANN backend without
/// touching retrieval code.
pub trait NearestNeighborIndex: Send + Sync {
    /// Dimension every stored and queried vector must have.
    fn dimension(&self) -> usize;

    /// Replaces the entire contents of the index.
    fn rebuild(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;

    /// Returns the position of the stored vector closest to `query`, or
    /// `None` when the index is empty.
    fn nearest(&self, query: &[f32]) -> Result<Option<usize>>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat index ranking by squared L2 distance.
///
/// Ties keep the earliest insertion, so equal-distance candidates resolve
/// in registration order.
#[derive(Clone, Debug)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }
}

impl NearestNeighborIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn rebuild(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        self.vectors = vectors;
        Ok(())
    }

    fn nearest(&self, query: &[f32]) -> Result<Option<usize>> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut best: Option<(usize, f32)> = None;
        for (position, candidate) in self.vectors.iter().enumerate() {
            let distance = squared_l2(query, candidate);
            let better = match best {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if better {
                best = Some((position, distance));
            }
        }

        Ok(best.map(|(position, _)| position))
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
