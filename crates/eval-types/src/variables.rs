use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An ordered tuple of continuous reals, discrete integers, and discrete
/// labels. Opaque to the scheduler beyond equality, hashing, and
/// serialization — the numeric semantics belong to the owning interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variables {
    pub continuous: Vec<f64>,
    pub discrete_int: Vec<i64>,
    pub discrete_label: Vec<String>,
}

impl Variables {
    pub fn new(continuous: Vec<f64>, discrete_int: Vec<i64>, discrete_label: Vec<String>) -> Self {
        Self {
            continuous,
            discrete_int,
            discrete_label,
        }
    }

    pub fn len(&self) -> usize {
        self.continuous.len() + self.discrete_int.len() + self.discrete_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Euclidean distance over the continuous components only. Used by
    /// continuation recovery to pick the nearest cached neighbour.
    pub fn continuous_distance(&self, other: &Variables) -> f64 {
        self.continuous
            .iter()
            .zip(other.continuous.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Linear interpolation of the continuous components toward `target`;
    /// discrete components are carried from `self` unchanged, matching the
    /// source continuation algorithm, which only perturbs continuous vars.
    pub fn interpolate(&self, target: &Variables, fraction: f64) -> Variables {
        let continuous = self
            .continuous
            .iter()
            .zip(target.continuous.iter())
            .map(|(src, dst)| src + (dst - src) * fraction)
            .collect();
        Variables {
            continuous,
            discrete_int: self.discrete_int.clone(),
            discrete_label: self.discrete_label.clone(),
        }
    }
}

// Cache/fingerprint equality never admits an epsilon tolerance: two
// Variables match only if every continuous component has the identical bit
// pattern (exact, or matching to the precision produced by a prior
// serialization round-trip). Discrete components compare exactly.
impl PartialEq for Variables {
    fn eq(&self, other: &Self) -> bool {
        self.continuous.len() == other.continuous.len()
            && self
                .continuous
                .iter()
                .zip(other.continuous.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
            && self.discrete_int == other.discrete_int
            && self.discrete_label == other.discrete_label
    }
}
impl Eq for Variables {}

impl Hash for Variables {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.continuous.len().hash(state);
        for c in &self.continuous {
            c.to_bits().hash(state);
        }
        self.discrete_int.hash(state);
        self.discrete_label.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bit_patterns_hash_equal() {
        let a = Variables::new(vec![1.0, 2.5], vec![3], vec!["x".into()]);
        let b = Variables::new(vec![1.0, 2.5], vec![3], vec!["x".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn nan_is_bitwise_comparable() {
        let a = Variables::new(vec![f64::NAN], vec![], vec![]);
        let b = Variables::new(vec![f64::NAN], vec![], vec![]);
        assert_eq!(a, b);
    }

    #[test]
    fn discrete_label_mismatch_breaks_equality() {
        let a = Variables::new(vec![1.0], vec![], vec!["a".into()]);
        let b = Variables::new(vec![1.0], vec![], vec!["b".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn interpolate_halves_the_interval() {
        let src = Variables::new(vec![0.0, 0.0], vec![7], vec![]);
        let dst = Variables::new(vec![2.0, 4.0], vec![9], vec![]);
        let mid = src.interpolate(&dst, 0.5);
        assert_eq!(mid.continuous, vec![1.0, 2.0]);
        assert_eq!(mid.discrete_int, vec![7]);
    }
}
