use std::fmt;

/// Sharp spellings used for display names, indexed by pitch class.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// An immutable subset of the 12 chromatic pitch classes.
///
/// Stored as a 12-bit mask where bit `i` marks pitch class `i` (C = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PitchClassSet {
    bits: u16,
}

impl PitchClassSet {
    pub const EMPTY: PitchClassSet = PitchClassSet { bits: 0 };

    const MASK: u16 = 0x0FFF;

    /// Build from a mask; bits above 11 are ignored.
    pub const fn from_bits(bits: u16) -> Self {
        Self {
            bits: bits & Self::MASK,
        }
    }

    /// Parse the dataset's 12-character form, where character `i` is `'1'`
    /// when pitch class `i` is present.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        if s.len() != 12 {
            return None;
        }
        let mut bits = 0u16;
        for (pc, ch) in s.chars().enumerate() {
            match ch {
                '1' => bits |= 1 << pc,
                '0' => {}
                _ => return None,
            }
        }
        Some(Self { bits })
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        pitch_class < 12 && self.bits & (1 << pitch_class) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in ascending pitch-class order.
    pub fn members(&self) -> impl Iterator<Item = u8> + '_ {
        (0..12u8).filter(move |&pc| self.contains(pc))
    }

    /// Member at position `index` in ascending order.
    pub fn nth(&self, index: usize) -> Option<u8> {
        self.members().nth(index)
    }

    /// Canonical display name: sharp note names joined by spaces, e.g. `"C E G"`.
    pub fn display_name(&self) -> String {
        if self.is_empty() {
            return "∅".to_string();
        }
        self.members()
            .map(|pc| NOTE_NAMES[pc as usize])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for PitchClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl FromIterator<u8> for PitchClassSet {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let bits = iter
            .into_iter()
            .filter(|&pc| pc < 12)
            .fold(0u16, |acc, pc| acc | (1 << pc));
        Self { bits }
    }
}
