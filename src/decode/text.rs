//! Textual frame input
//!
//! Recorded sessions and debug captures store each notification as text,
//! either comma-separated byte tokens (`aa,01,00,c7,...`) or one unbroken
//! digit string (`aa0100c7...`). The form is detected by the presence of a
//! comma.

use tracing::trace;

use crate::{FrameError, Result};

/// Convert a textual frame into bytes.
///
/// Comma-separated tokens are trimmed and may be one or two hex digits; an
/// empty token reads as `00`. An unbroken string must have an even number of
/// digits.
pub fn parse_hex_frame(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    if text.contains(',') {
        trace!("Parsing comma-separated hex frame ({} chars)", text.len());
        text.split(',').enumerate().map(|(position, token)| parse_token(token, position)).collect()
    } else {
        trace!("Parsing unbroken hex frame ({} chars)", text.len());
        if text.len() % 2 != 0 {
            return Err(FrameError::OddHexLength { length: text.len() });
        }
        hex::decode(text).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                let start = index - index % 2;
                let token = text.get(start..start + 2).map_or_else(|| c.to_string(), str::to_owned);
                FrameError::malformed_hex(token, index / 2)
            }
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                FrameError::OddHexLength { length: text.len() }
            }
        })
    }
}

fn parse_token(token: &str, position: usize) -> Result<u8> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(0);
    }
    if token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FrameError::malformed_hex(token, position));
    }
    u8::from_str_radix(token, 16).map_err(|_| FrameError::malformed_hex(token, position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_tokens() {
        assert_eq!(parse_hex_frame("aa,01,00,C7").unwrap(), vec![0xAA, 0x01, 0x00, 0xC7]);
    }

    #[test]
    fn tokens_are_trimmed_and_may_be_short() {
        assert_eq!(parse_hex_frame(" aa , 1,f ,00\n").unwrap(), vec![0xAA, 0x01, 0x0F, 0x00]);
    }

    #[test]
    fn empty_token_reads_as_zero() {
        assert_eq!(parse_hex_frame("aa,,01").unwrap(), vec![0xAA, 0x00, 0x01]);
    }

    #[test]
    fn unbroken_string_is_regrouped_in_pairs() {
        assert_eq!(parse_hex_frame("aa0100c7").unwrap(), vec![0xAA, 0x01, 0x00, 0xC7]);
    }

    #[test]
    fn malformed_token_reports_position() {
        match parse_hex_frame("aa,0g,01") {
            Err(FrameError::MalformedHex { token, position }) => {
                assert_eq!(token, "0g");
                assert_eq!(position, 1);
            }
            other => panic!("expected MalformedHex, got {other:?}"),
        }
    }

    #[test]
    fn signed_token_is_rejected() {
        assert!(matches!(parse_hex_frame("+f,01"), Err(FrameError::MalformedHex { .. })));
    }

    #[test]
    fn over_long_token_is_rejected() {
        assert!(matches!(parse_hex_frame("aa,123"), Err(FrameError::MalformedHex { .. })));
    }

    #[test]
    fn unbroken_odd_length_is_rejected() {
        assert!(matches!(parse_hex_frame("aa0"), Err(FrameError::OddHexLength { length: 3 })));
    }

    #[test]
    fn unbroken_bad_digit_reports_byte_position() {
        match parse_hex_frame("aa01zz") {
            Err(FrameError::MalformedHex { token, position }) => {
                assert_eq!(token, "zz");
                assert_eq!(position, 2);
            }
            other => panic!("expected MalformedHex, got {other:?}"),
        }
    }
}
