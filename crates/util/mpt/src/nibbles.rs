//! Nibble paths and their hex-prefix encoding.

use crate::error::TrieError;

pub(crate) fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

pub(crate) fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Hex-prefix encodes a nibble path, flagging leaves and odd lengths in the
/// first nibble.
pub(crate) fn encode_path(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let flag: u8 = if is_leaf { 2 } else { 0 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);

    let rest = if nibbles.len() % 2 == 1 {
        out.push(((flag | 1) << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag << 4);
        nibbles
    };
    for pair in rest.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }

    out
}

/// Returns the nibble path and whether it belongs to a leaf.
pub(crate) fn decode_path(encoded: &[u8]) -> Result<(Vec<u8>, bool), TrieError> {
    let (&first, rest) = encoded
        .split_first()
        .ok_or(TrieError::MalformedNode("empty path"))?;

    let flag = first >> 4;
    if flag > 3 {
        return Err(TrieError::MalformedNode("bad path flag"));
    }

    let mut nibbles = Vec::with_capacity(encoded.len() * 2);
    if flag & 1 == 1 {
        nibbles.push(first & 0x0f);
    }
    nibbles.extend(to_nibbles(rest));

    Ok((nibbles, flag & 2 != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefix() {
        assert_eq!(encode_path(&[1, 2, 3, 4, 5], false), vec![0x11, 0x23, 0x45]);
        assert_eq!(encode_path(&[0, 1, 2, 3, 4, 5], false), vec![0x00, 0x01, 0x23, 0x45]);
        assert_eq!(encode_path(&[0x0f, 1, 0x0c, 0x0b, 8], true), vec![0x3f, 0x1c, 0xb8]);
        assert_eq!(encode_path(&[], true), vec![0x20]);

        let (path, leaf) = decode_path(&[0x3f, 0x1c, 0xb8]).unwrap();
        assert_eq!(path, vec![0x0f, 1, 0x0c, 0x0b, 8]);
        assert!(leaf);
    }

    #[test]
    fn test_bad_flag() {
        assert!(decode_path(&[0x40]).is_err());
        assert!(decode_path(&[]).is_err());
    }
}
