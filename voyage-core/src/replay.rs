//! Replay codes: short, shareable names for battle seeds.
//!
//! Format is `<MODE>-<WORD><NN>`, e.g. `PV-KRAKEN42` or `PP-GALLEON07`.
//! Decoding a code always yields the same seed, and encoding that seed gives
//! the code back.
use serde::{Deserialize, Serialize};

/// Kind of battle a replay code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    /// Player against a generated NPC.
    Skirmish,
    /// Player against player.
    Duel,
}

impl ReplayMode {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Skirmish => "PV",
            Self::Duel => "PP",
        }
    }

    const fn domain_tag(self) -> u8 {
        match self {
            Self::Skirmish => b'E',
            Self::Duel => b'P',
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_uppercase().as_str() {
            "PV" => Some(Self::Skirmish),
            "PP" => Some(Self::Duel),
            _ => None,
        }
    }
}

pub const WORD_LIST: [&str; 64] = [
    "KRAKEN", "GALLEON", "FRIGATE", "SLOOP", "BRIG", "CORSAIR", "CUTLASS", "ANCHOR", "BOWSPRT",
    "RIGGING", "HULL", "KEEL", "RUDDER", "TILLER", "MAST", "CANVAS", "BROADSD", "CANNON", "POWDER",
    "GRAPPLE", "BOARDER", "PLANK", "BILGE", "LANTERN", "COMPASS", "SEXTANT", "CHART", "ATLAS",
    "HARBOR", "LAGOON", "REEF", "SHOAL", "TEMPEST", "SQUALL", "GALE", "TRADES", "DOLDRUM",
    "MONSOON", "TIDE", "CURRENT", "CORAL", "PEARL", "DOUBLON", "GUINEA", "SPICE", "SILK",
    "INDIGO", "COCOA", "SUGAR", "RUM", "BOSUN", "QUARTER", "MUTINY", "PARLEY", "LETTERS",
    "PRIZE", "BOUNTY", "ARMADA", "CONVOY", "ESCORT", "LOOKOUT", "CROWS", "ENSIGN", "ADMIRAL",
];

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

const WORD_BITS: u16 = 0x003F;

fn pack(word_index: u16, number: u8) -> u16 {
    (word_index & WORD_BITS) | (u16::from(number % 100) << 6)
}

fn unpack(packed: u16) -> (usize, u8) {
    let number = u8::try_from((packed >> 6) % 100).unwrap_or(0);
    (usize::from(packed & WORD_BITS), number)
}

fn compose_seed(mode: ReplayMode, word_index: u16, number: u8) -> u64 {
    let packed = pack(word_index, number);
    let [low, high] = packed.to_le_bytes();
    let hash = fnv1a64(&[b'V', b'O', b'Y', b'-', mode.domain_tag(), low, high, 0x5A]);
    (hash & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render the replay code for a seed. Only the low 16 bits of the seed are
/// reflected in the code; use seeds produced by [`decode`] or
/// [`code_from_entropy`] for exact round trips.
#[must_use]
pub fn encode(mode: ReplayMode, seed: u64) -> String {
    let (word_index, number) = unpack(u16::try_from(seed & 0xFFFF).unwrap_or(0));
    let word = WORD_LIST.get(word_index).copied().unwrap_or(WORD_LIST[0]);
    format!("{}-{word}{number:02}", mode.prefix())
}

/// Parse a replay code into its mode and seed. Case-insensitive.
#[must_use]
pub fn decode(code: &str) -> Option<(ReplayMode, u64)> {
    let (prefix, rest) = code.trim().split_once('-')?;
    let mode = ReplayMode::from_prefix(prefix)?;
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, number_part) = rest.split_at(rest.len() - 2);
    let number: u8 = number_part.parse().ok()?;
    let word = word_part.to_ascii_uppercase();
    let index = WORD_LIST.iter().position(|candidate| *candidate == word)?;
    let index = u16::try_from(index).ok()?;
    Some((mode, compose_seed(mode, index, number)))
}

/// Pick a fresh replay code from arbitrary entropy.
#[must_use]
pub fn code_from_entropy(mode: ReplayMode, entropy: u64) -> String {
    let word_index = u16::try_from(entropy % 64).unwrap_or(0);
    let number = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode(mode, compose_seed(mode, word_index, number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_is_stable() {
        let (mode, seed) = decode("PV-KRAKEN42").unwrap();
        assert_eq!(mode, ReplayMode::Skirmish);
        assert_eq!(encode(mode, seed), "PV-KRAKEN42");
        assert_eq!(decode("pv-kraken42"), Some((mode, seed)));
    }

    #[test]
    fn modes_produce_different_seeds() {
        let (_, skirmish) = decode("PV-GALLEON07").unwrap();
        let (duel_mode, duel) = decode("PP-GALLEON07").unwrap();
        assert_eq!(duel_mode, ReplayMode::Duel);
        assert_ne!(skirmish, duel);
        assert_eq!(skirmish & 0xFFFF, duel & 0xFFFF);
    }

    #[test]
    fn generated_codes_decode() {
        for entropy in [0_u64, 1, 63, 64, 0xDEAD_BEEF, u64::MAX] {
            let code = code_from_entropy(ReplayMode::Duel, entropy);
            let (mode, seed) = decode(&code).unwrap();
            assert_eq!(mode, ReplayMode::Duel);
            assert_eq!(encode(mode, seed), code);
        }
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for code in ["", "PV", "XX-KRAKEN42", "PV-KRAKEN", "PV-WHALE42", "PV-KRAKENab"] {
            assert_eq!(decode(code), None, "{code}");
        }
    }

    #[test]
    fn word_list_fits_the_packing() {
        assert_eq!(WORD_LIST.len(), usize::from(WORD_BITS) + 1);
        for word in WORD_LIST {
            assert!(word.chars().all(|c| c.is_ascii_uppercase()), "{word}");
        }
    }
}
