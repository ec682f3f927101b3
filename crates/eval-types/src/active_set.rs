use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Per-response request bits: bit 0 = value, bit 1 = gradient, bit 2 = Hessian.
pub mod request_bits {
    pub const VALUE: u8 = 0b001;
    pub const GRADIENT: u8 = 0b010;
    pub const HESSIAN: u8 = 0b100;
    pub const ALL: u8 = VALUE | GRADIENT | HESSIAN;
}

/// Two parallel vectors: a per-response request code in `0..=7`, and a
/// derivative-variable list (DVV) indicating with respect to which
/// variables gradients/Hessians are requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveSet {
    pub request_codes: Vec<u8>,
    pub dvv: Vec<usize>,
}

impl ActiveSet {
    pub fn new(request_codes: Vec<u8>, dvv: Vec<usize>) -> Self {
        Self { request_codes, dvv }
    }

    /// A default active set requesting only function values for every
    /// response, with no derivative variables — mirrors the source's
    /// `defaultASV` used when `active_set_vector` control is off.
    pub fn values_only(num_responses: usize) -> Self {
        Self {
            request_codes: vec![request_bits::VALUE; num_responses],
            dvv: Vec::new(),
        }
    }

    /// Validates that this active set's lengths match the response and
    /// variable arities of the owning interface (§3 invariant).
    pub fn validate(&self, num_responses: usize, num_vars: usize) -> Result<(), TypesError> {
        if self.request_codes.len() != num_responses {
            return Err(TypesError::ActiveSetArityMismatch {
                expected: num_responses,
                actual: self.request_codes.len(),
            });
        }
        if self.request_codes.iter().any(|&c| c > request_bits::ALL) {
            return Err(TypesError::InvalidRequestCode);
        }
        if self.dvv.iter().any(|&v| v >= num_vars) {
            return Err(TypesError::DerivativeVariableOutOfRange { num_vars });
        }
        Ok(())
    }

    pub fn wants_value(&self, response_idx: usize) -> bool {
        self.request_codes
            .get(response_idx)
            .is_some_and(|c| c & request_bits::VALUE != 0)
    }

    pub fn wants_gradient(&self, response_idx: usize) -> bool {
        self.request_codes
            .get(response_idx)
            .is_some_and(|c| c & request_bits::GRADIENT != 0)
    }

    pub fn wants_hessian(&self, response_idx: usize) -> bool {
        self.request_codes
            .get(response_idx)
            .is_some_and(|c| c & request_bits::HESSIAN != 0)
    }

    /// True if `self` is a partial duplicate of `other`: same DVV, and
    /// every response's request bits are a subset of `other`'s bits for
    /// that response. A cached `other` response can then be sliced to
    /// answer `self` without a new simulation (§3, §4.1).
    pub fn is_subset_of(&self, other: &ActiveSet) -> bool {
        self.dvv == other.dvv
            && self.request_codes.len() == other.request_codes.len()
            && self
                .request_codes
                .iter()
                .zip(other.request_codes.iter())
                .all(|(mine, theirs)| mine & !theirs == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_catches_arity_mismatch() {
        let s = ActiveSet::values_only(2);
        assert!(s.validate(3, 4).is_err());
    }

    #[test]
    fn subset_check_respects_dvv() {
        let full = ActiveSet::new(vec![request_bits::ALL], vec![0, 1]);
        let value_only_same_dvv = ActiveSet::new(vec![request_bits::VALUE], vec![0, 1]);
        let value_only_diff_dvv = ActiveSet::new(vec![request_bits::VALUE], vec![0]);
        assert!(value_only_same_dvv.is_subset_of(&full));
        assert!(!value_only_diff_dvv.is_subset_of(&full));
    }

    #[test]
    fn gradient_request_not_subset_of_value_only() {
        let grad = ActiveSet::new(vec![request_bits::GRADIENT], vec![0]);
        let value_only = ActiveSet::new(vec![request_bits::VALUE], vec![0]);
        assert!(!grad.is_subset_of(&value_only));
    }
}
