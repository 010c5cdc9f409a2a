//! Python-compatible JSON text
//!
//! The principal decodes `subordinate_configuration` with Python's `json`
//! module and compares it against what it rendered last time, so the text
//! must match `json.dumps` defaults byte for byte: `", "` and `": "`
//! separators, keys in insertion order, every non-ASCII character
//! escaped as `\uXXXX` and floats in `repr` form (`1e-07`, `1e+16`,
//! `1000000000000000.0`).

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

use crate::error::{Error, Result};

/// `serde_json` formatter producing `json.dumps` output
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonFormatter;

impl Formatter for PythonFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(&format!("{:e}", value)).as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(&format!("{:e}", value)).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            // DEL is outside Python's printable range
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            if start < idx {
                writer.write_all(fragment[start..idx].as_bytes())?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Lay out shortest round-trip digits the way Python's `float.__repr__` does
///
/// Takes Rust's `{:e}` rendering (`-1.5e-7`). Decimal exponents below -4 or
/// from 16 up use scientific notation with a signed, two-digit minimum
/// exponent; everything else is positional with at least one fractional
/// digit. Only finite values reach the formatter.
fn float_repr(scientific: &str) -> String {
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::from(sign);
    if !(-4..16).contains(&exponent) {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("e{}{:02}", exp_sign, exponent.abs()));
    } else if exponent < 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exponent - 1) as usize));
        out.push_str(&digits);
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            out.push_str(&digits);
            out.push_str(&"0".repeat(int_len - digits.len()));
            out.push_str(".0");
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    }
    out
}

/// Serialize a value the way Python's `json.dumps` does
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PythonFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| Error::Other(format!("non UTF-8 JSON output: {}", e)))
}
