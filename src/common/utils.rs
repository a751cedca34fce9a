use crate::error::{Error, Result};
use base64::prelude::*;
use flate2::read::ZlibDecoder;
use serde_json::Value;
use std::io::prelude::*;

pub fn deserialize_binary_stream_to_bytes(data: &str) -> Result<Vec<u8>> {
    let data = BASE64_STANDARD
        .decode(data)
        .map_err(|e| Error::Decode(e.to_string()))?;
    let mut dec = ZlibDecoder::new(&data[..]);
    let mut data = Vec::new();
    dec.read_to_end(&mut data)
        .map_err(|e| Error::Decode(e.to_string()))?;

    Ok(data)
}

/// Decodes a base64, zlib compressed, little endian array of `dtype` elements into plain json numbers.
pub fn deserialize_binary_stream(dtype: &str, data: &str) -> Result<Vec<Value>> {
    match dtype {
        "int32" => decode_chunks::<4>(data, |c| Value::from(i32::from_le_bytes(c))),
        "int64" => decode_chunks::<8>(data, |c| Value::from(i64::from_le_bytes(c))),
        "float32" => decode_floats::<4>(data, |c| f32::from_le_bytes(c) as f64),
        "float64" => decode_floats::<8>(data, f64::from_le_bytes),
        _ => Err(Error::Decode(format!("unsupported dtype '{dtype}'"))),
    }
}

/// NaN and infinities have no json form and are rejected.
fn decode_floats<const N: usize>(data: &str, f: impl Fn([u8; N]) -> f64) -> Result<Vec<Value>> {
    let mut non_finite = None;
    let vals = decode_chunks::<N>(data, |c| {
        let x = f(c);
        if !x.is_finite() {
            non_finite.get_or_insert(x);
        }
        Value::from(x)
    })?;
    match non_finite {
        Some(x) => Err(Error::Decode(format!("non-finite value {x} in stream"))),
        None => Ok(vals),
    }
}

fn decode_chunks<const N: usize>(data: &str, mut f: impl FnMut([u8; N]) -> Value) -> Result<Vec<Value>> {
    let data = deserialize_binary_stream_to_bytes(data)?;

    if data.len() % N != 0 {
        return Err(Error::Decode(format!(
            "received {} bytes, not a multiple of {}",
            data.len(),
            N
        )));
    }

    Ok(data
        .chunks_exact(N)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            f(buf)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn encode(bytes: &[u8]) -> String {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        BASE64_STANDARD.encode(enc.finish().unwrap())
    }

    #[test]
    fn decodes_float32_stream() {
        let bytes: Vec<u8> = [0.5f32, -2.0, 8.25]
            .iter()
            .flat_map(|x| x.to_le_bytes())
            .collect();
        let vals = deserialize_binary_stream("float32", &encode(&bytes)).unwrap();
        assert_eq!(vals, vec![json!(0.5), json!(-2.0), json!(8.25)]);
    }

    #[test]
    fn decodes_int64_stream() {
        let bytes: Vec<u8> = [7i64, -1].iter().flat_map(|x| x.to_le_bytes()).collect();
        let vals = deserialize_binary_stream("int64", &encode(&bytes)).unwrap();
        assert_eq!(vals, vec![json!(7), json!(-1)]);
    }

    #[test]
    fn reports_non_finite_floats_as_decode_errors() {
        for x in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let bytes: Vec<u8> = [1.0f32, x].iter().flat_map(|x| x.to_le_bytes()).collect();
            assert!(matches!(
                deserialize_binary_stream("float32", &encode(&bytes)),
                Err(Error::Decode(_))
            ));
        }
        let bytes = f64::NAN.to_le_bytes();
        assert!(matches!(
            deserialize_binary_stream("float64", &encode(&bytes)),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn rejects_truncated_stream() {
        let data = encode(&[0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            deserialize_binary_stream("float32", &data),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn rejects_unknown_dtype() {
        let data = encode(&[0, 0]);
        assert!(matches!(
            deserialize_binary_stream("float16", &data),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(deserialize_binary_stream_to_bytes("not base64!").is_err());
    }
}
