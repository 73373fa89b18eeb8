//! Short-code <-> integer conversions (spec section 6).
//!
//! Two distinct encodings live here:
//! - a base-64 positional encoding of an arbitrary-precision integer into
//!   the site's 64-character short-code alphabet (used for numeric story
//!   IDs), grounded on `original_source/src/main.py`'s
//!   `instagram_id_to_url`;
//! - a fixed 24-byte big-endian integer encoding used to round-trip a
//!   short-code through the numeric `/api/v1/statuses/{id}` shape
//!   (Mastodon-style status IDs), which the distilled spec names but the
//!   original does not implement — there is no prior art for it in
//!   `original_source/`, so it is built directly from spec section 6's
//!   description ("round-trip through big-endian 24-byte encoding /
//!   decoding of an integer").

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Encode a non-negative integer as a short-code using the site's 64-char
/// alphabet (most significant digit first). `0` encodes to `"A"`.
pub fn encode_u64(mut n: u64) -> String {
    if n == 0 {
        return (ALPHABET[0] as char).to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let rem = (n % 64) as usize;
        n /= 64;
        digits.push(ALPHABET[rem]);
    }
    digits.reverse();
    String::from_utf8(digits).expect("alphabet is ASCII")
}

/// Inverse of [`encode_u64`]. Returns `None` if `s` contains a character
/// outside the 64-char alphabet, or if it's empty.
pub fn decode_u64(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for c in s.bytes() {
        let digit = ALPHABET.iter().position(|&a| a == c)? as u64;
        n = n.checked_mul(64)?.checked_add(digit)?;
    }
    Some(n)
}

/// Re-encode a purely-digit `post_id` (a numeric story ID) into the
/// short-code alphabet (spec section 6, "Numeric story IDs"). Returns
/// `None` if `digits` does not parse as a `u64` or contains a `_`-suffixed
/// user id component that fails to parse.
pub fn numeric_story_id_to_shortcode(digits: &str) -> Option<String> {
    // Some numeric story IDs carry a trailing `_<user id>` component; only
    // the leading media id is significant (original's `instagram_id_to_url`).
    let media_part = digits.split('_').next().unwrap_or(digits);
    let n: u64 = media_part.parse().ok()?;
    Some(encode_u64(n))
}

/// Encode an integer into a fixed 24-byte big-endian buffer (spec section
/// 6, "Mastodon status ID").
pub fn encode_status_id_bytes(n: u128) -> [u8; 24] {
    let mut buf = [0u8; 24];
    buf[8..24].copy_from_slice(&n.to_be_bytes());
    buf
}

/// Inverse of [`encode_status_id_bytes`].
pub fn decode_status_id_bytes(buf: &[u8; 24]) -> u128 {
    let mut n_bytes = [0u8; 16];
    n_bytes.copy_from_slice(&buf[8..24]);
    u128::from_be_bytes(n_bytes)
}

/// A short-code's numeric Mastodon-status-shaped id, for the
/// `/api/v1/statuses/{id}` route (spec section 6, "Mastodon status ID").
/// Round-trips through the 24-byte encoding spec.md names even though,
/// for a 64-char-alphabet value, that encoding is an identity transform —
/// the 24-byte shape is what a conformant Mastodon client expects to be
/// able to decode, even if this server never needs to decode its own
/// middle step.
pub fn shortcode_to_status_id(short_code: &str) -> Option<u128> {
    let n = decode_u64(short_code)? as u128;
    Some(decode_status_id_bytes(&encode_status_id_bytes(n)))
}

/// Inverse of [`shortcode_to_status_id`].
pub fn status_id_to_shortcode(status_id: u128) -> Option<String> {
    let n = decode_status_id_bytes(&encode_status_id_bytes(status_id));
    u64::try_from(n).ok().map(encode_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_round_trips() {
        assert_eq!(decode_u64(&encode_u64(0)), Some(0));
    }

    #[test]
    fn known_value() {
        // 64 -> "BA" (one full rollover of the base)
        assert_eq!(encode_u64(64), "BA");
        assert_eq!(decode_u64("BA"), Some(64));
    }

    #[test]
    fn leading_zero_digit_does_not_round_trip_verbatim() {
        // "AA" decodes to 0 (A is digit 0), and re-encoding 0 always
        // produces the minimal-length "A" — `encode(decode(s)) == s` only
        // holds for canonical (non-zero-padded) short-codes, which is all
        // the upstream ever issues.
        assert_eq!(decode_u64("AA"), Some(0));
        assert_eq!(encode_u64(decode_u64("AA").unwrap()), "A");
    }

    #[test]
    fn rejects_invalid_alphabet() {
        assert_eq!(decode_u64("!!!"), None);
        assert_eq!(decode_u64(""), None);
    }

    #[test]
    fn strips_trailing_user_id_component() {
        assert_eq!(
            numeric_story_id_to_shortcode("64_12345"),
            Some("BA".to_string())
        );
    }

    #[test]
    fn status_id_round_trips() {
        let buf = encode_status_id_bytes(123456789);
        assert_eq!(decode_status_id_bytes(&buf), 123456789);
    }

    #[test]
    fn shortcode_and_status_id_round_trip_each_other() {
        let status_id = shortcode_to_status_id("BA").unwrap();
        assert_eq!(status_id_to_shortcode(status_id).as_deref(), Some("BA"));
    }

    proptest::proptest! {
        #[test]
        fn encode_decode_round_trips(n in 0u64..u64::MAX) {
            proptest::prop_assert_eq!(decode_u64(&encode_u64(n)), Some(n));
        }

        #[test]
        fn status_id_round_trips_prop(n in 0u128..u128::MAX) {
            proptest::prop_assert_eq!(decode_status_id_bytes(&encode_status_id_bytes(n)), n);
        }
    }
}
