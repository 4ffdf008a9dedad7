//! Running mean of embedding vectors.

use crate::error::TrainingError;

/// Element-wise running sum plus count.
///
/// Only the sum is kept, so memory stays at one vector no matter how many
/// examples a skill has. Partial accumulators can be merged, which makes the
/// result independent of how examples were split into batches.
#[derive(Debug, Clone)]
pub struct MeanAccumulator {
    sum: Vec<f64>,
    count: usize,
}

impl MeanAccumulator {
    pub fn new(dimension: usize) -> Self {
        Self {
            sum: vec![0.0; dimension],
            count: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.sum.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Add one vector.
    pub fn add(&mut self, values: &[f32]) -> Result<(), TrainingError> {
        if values.len() != self.sum.len() {
            return Err(TrainingError::DimensionMismatch {
                skill: String::new(),
                expected: self.sum.len(),
                actual: values.len(),
            });
        }
        for (acc, v) in self.sum.iter_mut().zip(values) {
            *acc += f64::from(*v);
        }
        self.count += 1;
        Ok(())
    }

    /// Fold in another accumulator's partial sum.
    pub fn merge(&mut self, other: &MeanAccumulator) -> Result<(), TrainingError> {
        if other.sum.len() != self.sum.len() {
            return Err(TrainingError::DimensionMismatch {
                skill: String::new(),
                expected: self.sum.len(),
                actual: other.sum.len(),
            });
        }
        for (acc, v) in self.sum.iter_mut().zip(&other.sum) {
            *acc += v;
        }
        self.count += other.count;
        Ok(())
    }

    /// Arithmetic mean, or None when nothing was added.
    pub fn finish(&self) -> Option<Vec<f32>> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(self.sum.iter().map(|s| (s / n) as f32).collect())
    }
}
