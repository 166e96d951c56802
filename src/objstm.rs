//! Object stream parsing (PDF 1.5+).
//!
//! An object stream (`/Type /ObjStm`) packs multiple objects into one
//! compressed stream. The decoded payload starts with `/N` pairs of
//! integers `(obj_num, rel_offset)`, followed at `/First` by the objects
//! themselves, back to back.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::parser::parse_object;
use std::collections::HashMap;

/// Parse an object stream and extract all contained objects.
///
/// Returns a map from object number to parsed object. Individual objects
/// that fail to parse are skipped with a warning; the rest of the stream is
/// still usable.
pub fn parse_object_stream(stream_obj: &Object) -> Result<HashMap<u32, Object>> {
    let dict = match stream_obj {
        Object::Stream { dict, .. } => dict,
        other => {
            return Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: other.type_name().to_string(),
            });
        },
    };

    if let Some(type_name) = dict.get("Type").and_then(|o| o.as_name()) {
        if type_name != "ObjStm" {
            return Err(Error::Parse {
                offset: 0,
                reason: format!("expected /Type /ObjStm, got /{}", type_name),
            });
        }
    }

    let n = dict
        .get("N")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::Parse {
            offset: 0,
            reason: "object stream missing /N".to_string(),
        })?;
    let first = dict
        .get("First")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::Parse {
            offset: 0,
            reason: "object stream missing /First".to_string(),
        })?;

    if !(0..=1_000_000).contains(&n) {
        return Err(Error::Parse {
            offset: 0,
            reason: format!("implausible object stream /N {}", n),
        });
    }
    if !(0..=10_000_000).contains(&first) {
        return Err(Error::Parse {
            offset: 0,
            reason: format!("implausible object stream /First {}", first),
        });
    }
    let n = n as usize;
    let first = first as usize;

    let decoded = stream_obj.decode_stream_data()?;
    if decoded.len() < first {
        return Err(Error::Parse {
            offset: 0,
            reason: format!(
                "object stream data too short: {} bytes, /First is {}",
                decoded.len(),
                first
            ),
        });
    }

    let pairs = parse_pairs(&decoded[..first], n)?;
    let objects_data = &decoded[first..];
    let mut result = HashMap::with_capacity(n);

    for (obj_num, rel_offset) in pairs {
        if rel_offset >= objects_data.len() {
            log::warn!(
                "object {} offset {} beyond stream body ({} bytes)",
                obj_num,
                rel_offset,
                objects_data.len()
            );
            continue;
        }
        match parse_object(&objects_data[rel_offset..]) {
            Ok((_, obj)) => {
                result.insert(obj_num, obj);
            },
            Err(e) => {
                log::warn!("failed to parse object {} in object stream: {:?}", obj_num, e);
            },
        }
    }

    Ok(result)
}

/// Parse one object out of an already-decoded object stream body.
///
/// `index` is the slot recorded by the xref entry.
pub fn object_at_index(stream_obj: &Object, index: usize) -> Result<Option<(u32, Object)>> {
    let dict = stream_obj.as_dict().ok_or_else(|| Error::InvalidObjectType {
        expected: "Stream".to_string(),
        found: stream_obj.type_name().to_string(),
    })?;

    let n = dict.get("N").and_then(|o| o.as_integer()).unwrap_or(0).max(0) as usize;
    let first = dict
        .get("First")
        .and_then(|o| o.as_integer())
        .unwrap_or(0)
        .max(0) as usize;

    if index >= n {
        return Ok(None);
    }

    let decoded = stream_obj.decode_stream_data()?;
    if decoded.len() < first {
        return Ok(None);
    }

    let pairs = parse_pairs(&decoded[..first], n)?;
    let Some(&(obj_num, rel_offset)) = pairs.get(index) else {
        return Ok(None);
    };

    let objects_data = &decoded[first..];
    if rel_offset >= objects_data.len() {
        return Ok(None);
    }

    match parse_object(&objects_data[rel_offset..]) {
        Ok((_, obj)) => Ok(Some((obj_num, obj))),
        Err(e) => Err(Error::Parse {
            offset: first + rel_offset,
            reason: format!("object stream slot {}: {:?}", index, e),
        }),
    }
}

/// Parse the `(obj_num, rel_offset)` pair section.
fn parse_pairs(data: &[u8], count: usize) -> Result<Vec<(u32, usize)>> {
    let mut pairs = Vec::with_capacity(count);
    let mut rest = data;

    for i in 0..count {
        let (r, obj_num) = read_uint(rest).ok_or_else(|| Error::Parse {
            offset: 0,
            reason: format!("missing object number for pair {}", i),
        })?;
        let (r, rel_offset) = read_uint(r).ok_or_else(|| Error::Parse {
            offset: 0,
            reason: format!("missing offset for pair {}", i),
        })?;
        pairs.push((obj_num as u32, rel_offset as usize));
        rest = r;
    }

    Ok(pairs)
}

/// Read one whitespace-delimited unsigned integer.
fn read_uint(data: &[u8]) -> Option<(&[u8], u64)> {
    let mut i = 0;
    while i < data.len() && crate::lexer::is_whitespace(data[i]) {
        i += 1;
    }
    let start = i;
    while i < data.len() && data[i].is_ascii_digit() {
        i += 1;
    }
    if i == start {
        return None;
    }
    let value = std::str::from_utf8(&data[start..i]).ok()?.parse().ok()?;
    Some((&data[i..], value))
}
