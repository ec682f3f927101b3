use eval_framing::{pack_response, unpack_response};
use eval_types::SimFailure;

use crate::error::SchedulerError;
use crate::local::SimOutcome;

/// Wire encoding for one evaluation's outcome, shared by the scheduler
/// (decoding replies) and the server loop (encoding them): a leading tag
/// byte (0 = success, 1 = failure) followed by the payload. Kept alongside
/// `eval-framing`'s message classes rather than inside that crate, since
/// "success vs. typed failure" is a scheduling-layer concern, not a wire
/// format one (§6 "Simulator boundary").
pub fn encode_outcome(eval_id: u32, outcome: &SimOutcome) -> Vec<u8> {
    match outcome {
        Ok(data) => {
            let mut buf = vec![0u8];
            buf.extend(pack_response(eval_id, data).expect("ResponseData always encodes"));
            buf
        }
        Err(failure) => {
            let mut buf = vec![1u8];
            buf.extend(failure.code.to_le_bytes());
            buf
        }
    }
}

pub fn decode_outcome(bytes: &[u8]) -> Result<SimOutcome, SchedulerError> {
    match bytes.first() {
        Some(0) => {
            let (_, data, _) = unpack_response(&bytes[1..]).map_err(|e| SchedulerError::Transport(e.to_string()))?;
            Ok(Ok(data))
        }
        Some(1) => {
            if bytes.len() < 9 {
                return Err(SchedulerError::Transport("truncated failure outcome".into()));
            }
            let code = i64::from_le_bytes(bytes[1..9].try_into().unwrap());
            Ok(Err(SimFailure::new(code)))
        }
        _ => Err(SchedulerError::Transport("malformed outcome tag byte".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::ResponseData;

    #[test]
    fn success_round_trips() {
        let outcome: SimOutcome = Ok(ResponseData::new(vec![1.0, 2.0], vec![], vec![]));
        let bytes = encode_outcome(3, &outcome);
        let restored = decode_outcome(&bytes).unwrap();
        assert_eq!(restored, outcome);
    }

    #[test]
    fn failure_round_trips() {
        let outcome: SimOutcome = Err(SimFailure::new(-2));
        let bytes = encode_outcome(3, &outcome);
        let restored = decode_outcome(&bytes).unwrap();
        assert_eq!(restored, outcome);
    }
}
