use eval_types::{request_bits, ActiveSet, PairRecord, ResponseData, Variables};

use crate::error::FramingError;
use crate::messages::{pack_pair, pack_response, pack_vars, pack_vars_active_set, MessageClass};

/// Upper bounds on the packed byte counts of the four framing classes,
/// re-computed once per iterator run and again whenever the active-set
/// dimensionality changes (§4.4, §6 `message_lengths`).
#[derive(Debug, Clone, Copy)]
pub struct LengthEstimator {
    num_vars: usize,
    num_responses: usize,
    dvv_len: usize,
    lengths: [usize; 4],
}

impl LengthEstimator {
    /// Builds a worst-case sample (every response requesting value,
    /// gradient, and Hessian, and every variable a non-trivial float) and
    /// measures its packed size for each message class.
    pub fn estimate(num_vars: usize, num_responses: usize, dvv_len: usize) -> Result<Self, FramingError> {
        let vars = Variables::new(
            vec![-1.234_567_89_f64; num_vars],
            Vec::new(),
            Vec::new(),
        );
        let dvv_len = dvv_len.min(num_vars);
        let set = ActiveSet::new(vec![request_bits::ALL; num_responses], (0..dvv_len).collect());
        let response = ResponseData::zeroed(num_responses, num_vars, &set);
        let pair = PairRecord {
            eval_id: i32::MAX,
            interface_id: String::new(),
            vars: vars.clone(),
            active_set: set.clone(),
            response: response.clone(),
        };

        let mut lengths = [0usize; 4];
        lengths[MessageClass::VarsOnly.index()] = pack_vars(u32::MAX, &vars)?.len();
        lengths[MessageClass::VarsActiveSet.index()] = pack_vars_active_set(u32::MAX, &vars, &set)?.len();
        lengths[MessageClass::Response.index()] = pack_response(u32::MAX, &response)?.len();
        lengths[MessageClass::Pair.index()] = pack_pair(u32::MAX, &pair)?.len();

        Ok(Self {
            num_vars,
            num_responses,
            dvv_len,
            lengths,
        })
    }

    pub fn max_len(&self, class: MessageClass) -> usize {
        self.lengths[class.index()]
    }

    pub fn as_message_lengths(&self) -> [usize; 4] {
        self.lengths
    }

    /// True if a previously computed estimate is stale for the given
    /// dimensionality and must be recomputed before the next `synchronize`.
    pub fn needs_reestimate(&self, num_vars: usize, num_responses: usize, dvv_len: usize) -> bool {
        self.num_vars != num_vars || self.num_responses != num_responses || self.dvv_len != dvv_len.min(num_vars)
    }

    /// Checks a packed message against its class's estimated maximum.
    pub fn check_fits(&self, class: MessageClass, packed: &[u8]) -> Result<(), FramingError> {
        let max = self.max_len(class);
        if packed.len() > max {
            return Err(FramingError::OversizeMessage {
                actual: packed.len(),
                max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_bounds_actual_messages() {
        let est = LengthEstimator::estimate(4, 2, 4).unwrap();
        let vars = Variables::new(vec![1.0, 2.0, 3.0, 4.0], vec![], vec![]);
        let packed = pack_vars(1, &vars).unwrap();
        assert!(est.check_fits(MessageClass::VarsOnly, &packed).is_ok());
    }

    #[test]
    fn dimensionality_change_triggers_reestimate() {
        let est = LengthEstimator::estimate(2, 1, 2).unwrap();
        assert!(!est.needs_reestimate(2, 1, 2));
        assert!(est.needs_reestimate(3, 1, 2));
        assert!(est.needs_reestimate(2, 2, 2));
    }
}
