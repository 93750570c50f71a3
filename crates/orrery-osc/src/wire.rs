//! OSC 1.0 wire format
//!
//! Packet = padded address + `,`-led type tag string + arguments, all
//! 4-byte aligned, numbers big-endian. Numeric payload values travel as
//! float32 (`f`), strings as padded `s` strings; the decoder additionally
//! accepts int32 (`i`) from foreign senders.

use bytes::{BufMut, BytesMut};

use orrery_core::{OrreryError, OrreryResult};

use crate::expr::Value;

fn put_padded(buf: &mut BytesMut, s: &[u8]) {
    buf.put_slice(s);
    let pad = 4 - s.len() % 4;
    buf.put_bytes(0, pad);
}

/// Encode one message as an OSC packet
pub fn encode(path: &[u8], args: &[Value]) -> OrreryResult<Vec<u8>> {
    if path.first() != Some(&b'/') {
        return Err(OrreryError::InvalidPacket(
            "address must begin with '/'".to_string(),
        ));
    }

    let mut buf = BytesMut::new();
    put_padded(&mut buf, path);

    let mut tags = Vec::with_capacity(args.len() + 1);
    tags.push(b',');
    for arg in args {
        tags.push(match arg {
            Value::Num(_) => b'f',
            Value::Str(_) => b's',
        });
    }
    put_padded(&mut buf, &tags);

    for arg in args {
        match arg {
            Value::Num(v) => buf.put_f32(*v as f32),
            Value::Str(s) => put_padded(&mut buf, s.as_bytes()),
        }
    }

    Ok(buf.to_vec())
}

fn read_padded(buf: &[u8], pos: &mut usize) -> OrreryResult<Vec<u8>> {
    let start = *pos;
    let nul = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| OrreryError::InvalidPacket("unterminated string".to_string()))?;
    let end = start + (nul / 4 + 1) * 4;
    if end > buf.len() {
        return Err(OrreryError::InvalidPacket("truncated string".to_string()));
    }
    *pos = end;
    Ok(buf[start..start + nul].to_vec())
}

fn read_u32(buf: &[u8], pos: &mut usize) -> OrreryResult<u32> {
    let end = *pos + 4;
    if end > buf.len() {
        return Err(OrreryError::InvalidPacket("truncated argument".to_string()));
    }
    let raw: [u8; 4] = buf[*pos..end]
        .try_into()
        .map_err(|_| OrreryError::InvalidPacket("truncated argument".to_string()))?;
    *pos = end;
    Ok(u32::from_be_bytes(raw))
}

/// Decode one OSC packet into its address and argument values
pub fn decode(buf: &[u8]) -> OrreryResult<(Vec<u8>, Vec<Value>)> {
    let mut pos = 0;
    let path = read_padded(buf, &mut pos)?;
    if path.first() != Some(&b'/') {
        return Err(OrreryError::InvalidPacket(
            "address must begin with '/'".to_string(),
        ));
    }

    let tags = read_padded(buf, &mut pos)?;
    if tags.first() != Some(&b',') {
        return Err(OrreryError::InvalidPacket(
            "type tags must begin with ','".to_string(),
        ));
    }

    let mut args = Vec::with_capacity(tags.len() - 1);
    for &tag in &tags[1..] {
        match tag {
            b'f' => args.push(Value::Num(f32::from_be_bytes(
                read_u32(buf, &mut pos)?.to_be_bytes(),
            ) as f64)),
            b'i' => args.push(Value::Num(read_u32(buf, &mut pos)? as i32 as f64)),
            b's' => {
                let s = read_padded(buf, &mut pos)?;
                args.push(Value::Str(String::from_utf8_lossy(&s).into_owned()));
            }
            other => {
                return Err(OrreryError::InvalidPacket(format!(
                    "unsupported type tag {:?}",
                    other as char
                )))
            }
        }
    }

    Ok((path, args))
}
