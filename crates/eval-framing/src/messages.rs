use eval_types::{ActiveSet, PairRecord, ResponseData, Variables};
use serde::{de::DeserializeOwned, Serialize};

use crate::envelope::Envelope;
use crate::error::FramingError;

/// The four message classes, each with a pre-computed maximum length used
/// to size receive buffers (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    VarsOnly,
    VarsActiveSet,
    Response,
    Pair,
}

impl MessageClass {
    pub const ALL: [MessageClass; 4] = [
        MessageClass::VarsOnly,
        MessageClass::VarsActiveSet,
        MessageClass::Response,
        MessageClass::Pair,
    ];

    pub fn index(self) -> usize {
        match self {
            MessageClass::VarsOnly => 0,
            MessageClass::VarsActiveSet => 1,
            MessageClass::Response => 2,
            MessageClass::Pair => 3,
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, FramingError> {
    bincode::serialize(value).map_err(|e| FramingError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FramingError> {
    bincode::deserialize(bytes).map_err(|e| FramingError::Decode(e.to_string()))
}

/// Packs a vars-only message tagged with `tag` (typically the eval_id).
pub fn pack_vars(tag: u32, vars: &Variables) -> Result<Vec<u8>, FramingError> {
    Ok(Envelope::new(tag, encode(vars)?).pack())
}

pub fn unpack_vars(bytes: &[u8]) -> Result<(u32, Variables, usize), FramingError> {
    let (env, consumed) = Envelope::unpack(bytes)?;
    Ok((env.tag, decode(&env.payload)?, consumed))
}

/// Packs a vars+active-set message (the request a dispatching server sends).
pub fn pack_vars_active_set(tag: u32, vars: &Variables, set: &ActiveSet) -> Result<Vec<u8>, FramingError> {
    Ok(Envelope::new(tag, encode(&(vars, set))?).pack())
}

pub fn unpack_vars_active_set(bytes: &[u8]) -> Result<(u32, Variables, ActiveSet, usize), FramingError> {
    let (env, consumed) = Envelope::unpack(bytes)?;
    let (vars, set): (Variables, ActiveSet) = decode(&env.payload)?;
    Ok((env.tag, vars, set, consumed))
}

/// Packs a response message (what a server sends back).
pub fn pack_response(tag: u32, response: &ResponseData) -> Result<Vec<u8>, FramingError> {
    Ok(Envelope::new(tag, encode(response)?).pack())
}

pub fn unpack_response(bytes: &[u8]) -> Result<(u32, ResponseData, usize), FramingError> {
    let (env, consumed) = Envelope::unpack(bytes)?;
    Ok((env.tag, decode(&env.payload)?, consumed))
}

/// Packs a full pair record (used by the restart journal and by
/// history-replay style transports).
pub fn pack_pair(tag: u32, pair: &PairRecord) -> Result<Vec<u8>, FramingError> {
    Ok(Envelope::new(tag, encode(pair)?).pack())
}

pub fn unpack_pair(bytes: &[u8]) -> Result<(u32, PairRecord, usize), FramingError> {
    let (env, consumed) = Envelope::unpack(bytes)?;
    Ok((env.tag, decode(&env.payload)?, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::request_bits;

    #[test]
    fn vars_round_trip() {
        let vars = Variables::new(vec![1.0, 2.0], vec![3], vec!["l".into()]);
        let bytes = pack_vars(7, &vars).unwrap();
        let (tag, restored, consumed) = unpack_vars(&bytes).unwrap();
        assert_eq!(tag, 7);
        assert_eq!(consumed, bytes.len());
        assert_eq!(restored, vars);
    }

    #[test]
    fn vars_active_set_round_trip() {
        let vars = Variables::new(vec![1.0], vec![], vec![]);
        let set = ActiveSet::new(vec![request_bits::ALL], vec![0]);
        let bytes = pack_vars_active_set(11, &vars, &set).unwrap();
        let (tag, v2, s2, _) = unpack_vars_active_set(&bytes).unwrap();
        assert_eq!(tag, 11);
        assert_eq!(v2, vars);
        assert_eq!(s2, set);
    }

    #[test]
    fn response_round_trip() {
        let data = ResponseData::new(vec![1.0, 2.0], vec![vec![0.1]], vec![]);
        let bytes = pack_response(3, &data).unwrap();
        let (tag, restored, _) = unpack_response(&bytes).unwrap();
        assert_eq!(tag, 3);
        assert_eq!(restored, data);
    }

    #[test]
    fn pair_record_round_trip() {
        let record = PairRecord {
            eval_id: 5,
            interface_id: "rosenbrock".into(),
            vars: Variables::new(vec![1.0], vec![], vec![]),
            active_set: ActiveSet::values_only(1),
            response: ResponseData::new(vec![9.0], vec![], vec![]),
        };
        let bytes = pack_pair(5, &record).unwrap();
        let (tag, restored, _) = unpack_pair(&bytes).unwrap();
        assert_eq!(tag, 5);
        assert_eq!(restored.eval_id, record.eval_id);
        assert_eq!(restored.response, record.response);
    }
}
