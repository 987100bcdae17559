//! Canonical encoding shared by hashing, signing and address derivation.
//!
//! The byte form matches `json.dumps(value, sort_keys=True)`: sorted keys,
//! `", "` / `": "` separators, ASCII-only output and `repr`-style floats.
//! Nodes on other implementations hash the same records, so every byte here
//! is part of the consensus rules.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};

/// Serialize `value` into its canonical byte form.
///
/// The value is first lowered into a `serde_json::Value`, whose object map is
/// a `BTreeMap`, which gives the sorted key order.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    let mut ser = Serializer::with_formatter(&mut out, CanonicalFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// SHA-256 hex digest of the canonical encoding of `value`.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> String {
    // Ledger records only contain strings, integers and finite floats.
    let bytes = to_canonical_bytes(value).expect("ledger record is not canonically serializable");
    sha256_hex(&bytes)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Whether a hex digest starts with at least `difficulty` `'0'` digits.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// `serde_json` formatter producing the canonical spacing, escaping and
/// float layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.write_f64(writer, f64::from(value))
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        // Quotes, backslashes and control characters never reach this point;
        // serde_json routes them through `write_char_escape`.
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip float text in `repr` layout: positional notation for
/// decimal exponents in `-4..16` (always with a fractional part), otherwise
/// `d.ddde±XX`.
pub fn float_repr(value: f64) -> String {
    let sci = format!("{value:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let split = exponent as usize + 1;
            if digits.len() > split {
                format!("{sign}{}.{}", &digits[..split], &digits[split..])
            } else {
                format!("{sign}{digits}{}.0", "0".repeat(split - digits.len()))
            }
        } else {
            format!("{sign}0.{}{digits}", "0".repeat((-exponent - 1) as usize))
        }
    } else {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        let magnitude = exponent.abs();
        if tail.is_empty() {
            format!("{sign}{head}e{exp_sign}{magnitude:02}")
        } else {
            format!("{sign}{head}.{tail}e{exp_sign}{magnitude:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical_string(value: &serde_json::Value) -> String {
        String::from_utf8(to_canonical_bytes(value).unwrap()).unwrap()
    }

    #[test]
    fn sorts_keys_and_uses_spaced_separators() {
        let value = json!({"b": 1, "a": [1.5, "x"], "c": {"z": 0.00001, "y": 1e16}});
        assert_eq!(
            canonical_string(&value),
            r#"{"a": [1.5, "x"], "b": 1, "c": {"y": 1e+16, "z": 1e-05}}"#
        );
    }

    #[test]
    fn escapes_non_ascii_as_utf16_units() {
        let value = json!("DISKARDDDD DOLLARRRR TO THE MOONNNNNN!🚀");
        assert_eq!(
            canonical_string(&value),
            r#""DISKARDDDD DOLLARRRR TO THE MOONNNNNN!\ud83d\ude80""#
        );
        assert_eq!(canonical_string(&json!("a\u{7f}é\n")), r#""a\u007f\u00e9\n""#);
    }

    #[test]
    fn hashes_match_reference_vectors() {
        assert_eq!(
            canonical_hash("DISKARDDDD DOLLARRRR TO THE MOONNNNNN!🚀"),
            "e218e478076bae2588880701dc5c734d82497d8d04347b693671d26148ba5e9d"
        );
        assert_eq!(
            canonical_hash("abc"),
            "6cc43f858fbb763301637b5af970e2a46b46f461f27e5a0f41e009c59b827b25"
        );
        let payload = json!({
            "sender": "GENESIS COIN BASE",
            "recipient": "the_kings_wallet",
            "amount": 99999999999999u64,
            "fee": 0,
            "timestamp": 1700000000.25,
            "nonce": 0.0,
        });
        assert_eq!(
            canonical_hash(&payload),
            "f169f953a9edc89433dbdd38b3507fcec7426f361eb5a0129463eedef46ad4ae"
        );
    }

    #[test]
    fn float_repr_layout() {
        let cases = [
            (0.1, "0.1"),
            (1e-5, "1e-05"),
            (123.0, "123.0"),
            (1729000000.123456, "1729000000.123456"),
            (1e16, "1e+16"),
            (1234567890123456.0, "1234567890123456.0"),
            (0.0001, "0.0001"),
            (0.0, "0.0"),
            (-0.0, "-0.0"),
            (2.5e-7, "2.5e-07"),
            (f64::MAX, "1.7976931348623157e+308"),
        ];
        for (value, expected) in cases {
            assert_eq!(float_repr(value), expected, "repr of {value:e}");
        }
    }

    #[test]
    fn difficulty_prefix() {
        assert!(meets_difficulty("000abc", 3));
        assert!(!meets_difficulty("00abc", 3));
        assert!(meets_difficulty("abc", 0));
        assert!(!meets_difficulty("00", 3));
    }
}
