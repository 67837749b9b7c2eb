//! Integer hash strategies and directory-index masking.
//!
//! Every strategy is a pure, total function over `i32`. The directory only
//! ever sees the low `n` bits of a hash, so strategies are interchangeable
//! without touching any other component.

use std::fmt;

use serde::Deserialize;

/// A deterministic integer mixing function used to place keys.
pub trait KeyHash: Send + Sync {
    /// Hashes a key.
    fn hash(&self, key: i32) -> i32;

    /// Returns the `depth` least-significant bits of the key's hash.
    fn bucket_index(&self, key: i32, depth: u32) -> usize {
        low_bits(self.hash(key), depth)
    }
}

/// Masks `value` down to its `depth` least-significant bits.
#[inline]
pub fn low_bits(value: i32, depth: u32) -> usize {
    let mask = if depth >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << depth) - 1
    };
    (value as u32 & mask) as usize
}

/// Built-in hash strategies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    /// The key itself.
    #[default]
    Identity,
    /// Wang's shift-multiply mix with the odd constant `0x27d4eb2d`.
    ShiftMult,
    /// Multiply, xor-shift and add with `357913941`.
    MulXorShift,
    /// Jenkins' six-shift integer hash, top bit cleared.
    Jenkins,
    /// Xor-shift with `0xdeadbeef`, top bit cleared.
    XorShiftAdd,
    /// Five rounds of add/xor with shifted copies, top bit cleared.
    AddShiftMix,
}

impl HashKind {
    /// Every built-in strategy, in declaration order.
    pub const ALL: [HashKind; 6] = [
        HashKind::Identity,
        HashKind::ShiftMult,
        HashKind::MulXorShift,
        HashKind::Jenkins,
        HashKind::XorShiftAdd,
        HashKind::AddShiftMix,
    ];

    /// Returns the configuration name of the strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            HashKind::Identity => "identity",
            HashKind::ShiftMult => "shift-mult",
            HashKind::MulXorShift => "mul-xor-shift",
            HashKind::Jenkins => "jenkins",
            HashKind::XorShiftAdd => "xor-shift-add",
            HashKind::AddShiftMix => "add-shift-mix",
        }
    }

    /// Parses a strategy name (case-insensitive).
    pub fn from_name(value: &str) -> Option<Self> {
        let value = value.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl KeyHash for HashKind {
    fn hash(&self, key: i32) -> i32 {
        match self {
            HashKind::Identity => key,
            HashKind::ShiftMult => shift_mult(key),
            HashKind::MulXorShift => mul_xor_shift(key),
            HashKind::Jenkins => jenkins(key),
            HashKind::XorShiftAdd => xor_shift_add(key),
            HashKind::AddShiftMix => add_shift_mix(key),
        }
    }
}

fn shift_mult(mut key: i32) -> i32 {
    const C2: i32 = 0x27d4_eb2d;
    key = (key ^ 61) ^ (key >> 16);
    key = key.wrapping_add(key << 3);
    key ^= key >> 4;
    key = key.wrapping_mul(C2);
    key ^ (key >> 15)
}

fn mul_xor_shift(mut k: i32) -> i32 {
    const C: i32 = 357_913_941;
    k = k.wrapping_mul(C);
    k ^= k << 24;
    k = k.wrapping_add(!C);
    k ^= k >> 31;
    k ^ (k << 31)
}

fn jenkins(key: i32) -> i32 {
    let mut a = key as u32;
    a = a.wrapping_add(0x7ed5_5d16).wrapping_add(a << 12);
    a = (a ^ 0xc761_c23c) ^ (a >> 19);
    a = a.wrapping_add(0x1656_67b1).wrapping_add(a << 5);
    a = a.wrapping_add(0xd3a2_646c) ^ (a << 9);
    a = a.wrapping_add(0xfd70_46c5).wrapping_add(a << 3);
    a = (a ^ 0xb55a_4f09) ^ (a >> 16);
    (a & 0x7FFF_FFFF) as i32
}

fn xor_shift_add(key: i32) -> i32 {
    let mut a = key as u32;
    a ^= a >> 4;
    a = (a ^ 0xdead_beef).wrapping_add(a << 5);
    a ^= a >> 11;
    (a & 0x7FFF_FFFF) as i32
}

fn add_shift_mix(key: i32) -> i32 {
    let mut a = key as u32;
    a = a.wrapping_add(0x479a_b41d).wrapping_add(a << 8);
    a = (a ^ 0xe4aa_10ce) ^ (a >> 5);
    a = a.wrapping_add(0x9942_f0a6).wrapping_sub(a << 14);
    a = (a ^ 0x5aed_d67d) ^ (a >> 3);
    a = a.wrapping_add(0x17be_a992).wrapping_add(a << 7);
    (a & 0x7FFF_FFFF) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_bits_masks_twos_complement() {
        assert_eq!(low_bits(0b1011, 0), 0);
        assert_eq!(low_bits(0b1011, 2), 0b11);
        assert_eq!(low_bits(-1, 3), 0b111);
        assert_eq!(low_bits(i32::MIN, 31), 0);
        assert_eq!(low_bits(-1, 32), u32::MAX as usize);
    }

    #[test]
    fn identity_bucket_is_key_bits() {
        let hash = HashKind::Identity;
        assert_eq!(hash.bucket_index(5, 1), 1);
        assert_eq!(hash.bucket_index(6, 2), 2);
        assert_eq!(hash.bucket_index(i32::MAX, 4), 15);
    }

    #[test]
    fn strategies_are_deterministic_and_total() {
        for kind in HashKind::ALL {
            for key in [i32::MIN, -1, 0, 1, 42, i32::MAX] {
                assert_eq!(kind.hash(key), kind.hash(key), "{kind} not stable");
            }
        }
    }

    #[test]
    fn masked_strategies_are_non_negative() {
        for kind in [
            HashKind::Jenkins,
            HashKind::XorShiftAdd,
            HashKind::AddShiftMix,
        ] {
            for key in [i32::MIN, -12345, 0, 99, i32::MAX] {
                assert!(kind.hash(key) >= 0, "{kind} produced negative hash");
            }
        }
    }

    #[test]
    fn mixing_strategies_spread_sequential_keys() {
        for kind in &HashKind::ALL[1..] {
            let buckets: std::collections::HashSet<usize> =
                (0..64).map(|k| kind.bucket_index(k * 8, 3)).collect();
            assert!(buckets.len() > 1, "{kind} maps multiples of 8 to one bucket");
        }
    }

    #[test]
    fn names_round_trip() {
        for kind in HashKind::ALL {
            assert_eq!(HashKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(HashKind::from_name("JENKINS"), Some(HashKind::Jenkins));
        assert_eq!(HashKind::from_name("md5"), None);
    }
}
