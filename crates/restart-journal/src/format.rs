use std::io::Cursor;

use eval_types::{ActiveSet, EvalId, PairRecord, ResponseData, Variables};

use crate::error::JournalError;

pub const MAGIC: &[u8; 4] = b"DAKR";
pub const VERSION: u32 = 1;

pub fn write_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());
}

pub fn read_header(bytes: &[u8]) -> Result<usize, JournalError> {
    if bytes.len() < 8 {
        return Err(JournalError::Corrupt("truncated header".into()));
    }
    if &bytes[0..4] != MAGIC {
        return Err(JournalError::BadMagic);
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(JournalError::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }
    Ok(8)
}

/// `record := u32 length | eval_id u32 | interface_id cstring | V | S | R`
/// (§6). `V`, `S`, `R` are back-to-back bincode values — bincode encodes
/// its own length prefixes internally, so no further framing is needed
/// between them; `length` only delimits the whole record for skip/seek.
pub fn write_record(buf: &mut Vec<u8>, record: &PairRecord) -> Result<(), JournalError> {
    let mut body = Vec::new();
    body.extend_from_slice(&(record.eval_id as u32).to_le_bytes());
    body.extend_from_slice(record.interface_id.as_bytes());
    body.push(0); // cstring terminator
    bincode::serialize_into(&mut body, &record.vars).map_err(|e| JournalError::Encode(e.to_string()))?;
    bincode::serialize_into(&mut body, &record.active_set).map_err(|e| JournalError::Encode(e.to_string()))?;
    bincode::serialize_into(&mut body, &record.response).map_err(|e| JournalError::Encode(e.to_string()))?;

    let length = body.len() as u32;
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(())
}

/// Reads one record starting at `bytes[0]`, returning it and the number of
/// bytes consumed.
pub fn read_record(bytes: &[u8]) -> Result<(PairRecord, usize), JournalError> {
    if bytes.len() < 4 {
        return Err(JournalError::Corrupt("truncated record length".into()));
    }
    let length = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let total = 4 + length;
    if bytes.len() < total {
        return Err(JournalError::Corrupt("truncated record body".into()));
    }
    let body = &bytes[4..total];

    let nul = body
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| JournalError::Corrupt("interface_id not null-terminated".into()))?;
    let eval_id = i32::from_le_bytes(body[0..4].try_into().unwrap()) as EvalId;
    let interface_id = std::str::from_utf8(&body[4..nul])
        .map_err(|e| JournalError::Corrupt(e.to_string()))?
        .to_string();

    let mut cursor = Cursor::new(&body[nul + 1..]);
    let vars: Variables =
        bincode::deserialize_from(&mut cursor).map_err(|e| JournalError::Decode(e.to_string()))?;
    let active_set: ActiveSet =
        bincode::deserialize_from(&mut cursor).map_err(|e| JournalError::Decode(e.to_string()))?;
    let response: ResponseData =
        bincode::deserialize_from(&mut cursor).map_err(|e| JournalError::Decode(e.to_string()))?;

    Ok((
        PairRecord {
            eval_id,
            interface_id,
            vars,
            active_set,
            response,
        },
        total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_bit_identical_floats() {
        let record = PairRecord {
            eval_id: 7,
            interface_id: "rosenbrock".into(),
            vars: Variables::new(vec![1.0, f64::NAN], vec![3], vec!["x".into()]),
            active_set: ActiveSet::values_only(1),
            response: ResponseData::new(vec![9.875], vec![], vec![]),
        };
        let mut buf = Vec::new();
        write_record(&mut buf, &record).unwrap();
        let (restored, consumed) = read_record(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(restored.eval_id, 7);
        assert_eq!(restored.interface_id, "rosenbrock");
        assert_eq!(restored.vars.continuous[0].to_bits(), 1.0_f64.to_bits());
        assert!(restored.vars.continuous[1].is_nan());
        assert_eq!(restored.response.values, vec![9.875]);
    }

    #[test]
    fn header_round_trips() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        assert_eq!(read_header(&buf).unwrap(), 8);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = [0u8; 8];
        assert!(matches!(read_header(&bytes), Err(JournalError::BadMagic)));
    }
}
