use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};

/// 20-byte buf, used for account addresses.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, BorshSerialize, BorshDeserialize,
)]
pub struct Buf20(pub [u8; 20]);
impl_buf_common!(Buf20, 20);

/// 32-byte buf, useful for hashes, state roots and storage keys.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, BorshSerialize, BorshDeserialize,
)]
pub struct Buf32(pub [u8; 32]);
impl_buf_common!(Buf32, 32);

/// 65-byte buf, holds a compact recoverable ECDSA signature followed by the
/// recovery id.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Arbitrary, BorshSerialize, BorshDeserialize,
)]
pub struct Buf65(pub [u8; 65]);
impl_buf_common!(Buf65, 65);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf32_hex_roundtrip_through_serde() {
        let mut raw = [0u8; 32];
        raw[0] = 0xab;
        raw[31] = 0x01;
        let buf = Buf32::from(raw);

        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode(raw)));

        let back: Buf32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn test_parse_accepts_prefix() {
        let s = format!("0x{}", "11".repeat(20));
        let addr: Buf20 = s.parse().unwrap();
        assert_eq!(addr, Buf20::from([0x11; 20]));
    }

    #[test]
    fn test_try_from_wrong_length() {
        let res = Buf32::try_from(&[0u8; 31][..]);
        assert!(res.is_err());
    }

    #[test]
    fn test_zero() {
        assert!(Buf65::zero().is_zero());
        assert!(!Buf20::from([1; 20]).is_zero());
    }
}
