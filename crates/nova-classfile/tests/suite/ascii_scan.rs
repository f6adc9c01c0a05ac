use std::borrow::Cow;

use nova_classfile::{decode_modified_utf8, is_ascii_only, is_ascii_only_scalar, is_ascii_span};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 256;

/// Lengths covering the empty span, every sub-word tail and a few multi-word spans.
const LENGTHS: &[usize] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 15, 16, 17, 23, 24, 31, 64, 65];

#[test]
fn single_high_byte_at_every_offset() {
    for &len in LENGTHS {
        let clean: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
        assert!(is_ascii_span(&clean), "len {len}");
        assert!(is_ascii_only(&clean, 0, len).unwrap());

        for at in 0..len {
            for high in [0x80u8, 0xC3, 0xFF] {
                let mut dirty = clean.clone();
                dirty[at] = high;
                assert_eq!(
                    is_ascii_span(&dirty),
                    is_ascii_only_scalar(&dirty),
                    "len {len}, high byte {high:#x} at {at}"
                );
                assert!(!is_ascii_span(&dirty));
            }
        }
    }
}

#[test]
fn spans_inside_a_larger_buffer_ignore_outside_bytes() {
    let mut buffer = vec![0xFFu8; 3];
    buffer.extend_from_slice(b"java/lang/Object");
    buffer.extend_from_slice(&[0x80, 0x80]);

    assert!(is_ascii_only(&buffer, 3, 16).unwrap());
    assert!(!is_ascii_only(&buffer, 2, 16).unwrap());
    assert!(!is_ascii_only(&buffer, 3, 17).unwrap());
    assert!(is_ascii_only(&buffer, 5, 0).unwrap());
    assert!(is_ascii_only(&buffer, buffer.len(), 0).unwrap());
    assert!(is_ascii_only(&buffer, buffer.len(), 1).is_err());
}

#[test]
fn decode_borrows_only_ascii() {
    assert!(matches!(decode_modified_utf8(b""), Ok(Cow::Borrowed(""))));
    assert!(matches!(
        decode_modified_utf8(b"com/example/Foo$Bar"),
        Ok(Cow::Borrowed("com/example/Foo$Bar"))
    ));
    let decoded = decode_modified_utf8("caf\u{e9}".as_bytes()).unwrap();
    assert!(matches!(decoded, Cow::Owned(_)));
    assert_eq!(decoded, "caf\u{e9}");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn word_scan_matches_scalar_scan(bytes in prop::collection::vec(any::<u8>(), 0..80)) {
        prop_assert_eq!(is_ascii_span(&bytes), is_ascii_only_scalar(&bytes));
    }

    #[test]
    fn word_scan_matches_scalar_scan_on_subspans(
        bytes in prop::collection::vec(0u8..0x80, 0..80),
        high in 0x80u8..=0xFF,
        at in any::<prop::sample::Index>(),
        start in any::<prop::sample::Index>(),
        len in any::<prop::sample::Index>(),
    ) {
        let mut bytes = bytes;
        if !bytes.is_empty() {
            let at = at.index(bytes.len());
            bytes[at] = high;
        }
        let start = start.index(bytes.len() + 1);
        let len = len.index(bytes.len() - start + 1);

        let expected = is_ascii_only_scalar(&bytes[start..start + len]);
        prop_assert_eq!(is_ascii_only(&bytes, start, len).unwrap(), expected);
    }

    #[test]
    fn ascii_input_decodes_to_itself(text in "[ -~]{0,48}") {
        let decoded = decode_modified_utf8(text.as_bytes()).unwrap();
        prop_assert!(matches!(decoded, Cow::Borrowed(_)));
        prop_assert_eq!(decoded.as_ref(), text.as_str());
    }
}
