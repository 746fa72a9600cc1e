//! Canonical JSON bytes: the single serialization-for-hashing implementation.
//!
//! **Exactly one place** produces canonical JSON bytes. Manifest digests,
//! report digests and the persisted report files all route through
//! [`canonical_json_bytes`], so two logically identical documents can never
//! serialize to different bytes.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order) at every level.
//! 2. No extraneous whitespace (compact form: `{"a":1,"b":2}`).
//! 3. Strings are JSON-escaped per RFC 8259 §7; non-ASCII passes through as UTF-8.
//! 4. Integers are written in plain decimal. Finite floats use `serde_json`'s
//!    shortest round-trip form, which is stable across platforms
//!    (`serde_json::Value` cannot hold NaN or Infinity).
//! 5. `null`, `true`, `false` are written literally.
//! 6. Output is always valid UTF-8.

use std::io::Write;

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// This is the single canonical JSON implementation in the workspace.
#[must_use]
pub fn canonical_json_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

/// Canonical JSON as a `String`.
///
/// Convenience wrapper over [`canonical_json_bytes`]; the bytes are always
/// valid UTF-8.
#[must_use]
pub fn canonical_json_string(value: &serde_json::Value) -> String {
    String::from_utf8_lossy(&canonical_json_bytes(value)).into_owned()
}

fn write_value(buf: &mut Vec<u8>, value: &serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => write_number(buf, n),
        Value::String(s) => write_string(buf, s),
        Value::Array(items) => {
            buf.push(b'[');
            write_separated(buf, items.iter(), write_value);
            buf.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            buf.push(b'{');
            write_separated(buf, entries.into_iter(), |buf, (key, item)| {
                write_string(buf, key);
                buf.push(b':');
                write_value(buf, item);
            });
            buf.push(b'}');
        }
    }
}

fn write_separated<T>(
    buf: &mut Vec<u8>,
    items: impl Iterator<Item = T>,
    mut write_item: impl FnMut(&mut Vec<u8>, T),
) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write_item(buf, item);
    }
}

fn write_number(buf: &mut Vec<u8>, n: &serde_json::Number) {
    // Integers first so that e.g. u64::MAX never goes through a float.
    let _ = match (n.as_i64(), n.as_u64()) {
        (Some(i), _) => write!(buf, "{i}"),
        (None, Some(u)) => write!(buf, "{u}"),
        (None, None) => write!(buf, "{n}"),
    };
}

/// RFC 8259 string escaping: the two mandatory escapes, short forms for
/// `\n`, `\r`, `\t`, `\uXXXX` for the remaining C0 controls, and raw UTF-8
/// for everything else.
fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut run_start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escape: Option<&[u8]> = match byte {
            b'"' => Some(b"\\\"".as_slice()),
            b'\\' => Some(b"\\\\".as_slice()),
            b'\n' => Some(b"\\n".as_slice()),
            b'\r' => Some(b"\\r".as_slice()),
            b'\t' => Some(b"\\t".as_slice()),
            0x00..=0x1f => None,
            _ => continue,
        };
        buf.extend_from_slice(&bytes[run_start..i]);
        match escape {
            Some(seq) => buf.extend_from_slice(seq),
            None => {
                let _ = write!(buf, "\\u{byte:04x}");
            }
        }
        run_start = i + 1;
    }
    buf.extend_from_slice(&bytes[run_start..]);
    buf.push(b'"');
}
