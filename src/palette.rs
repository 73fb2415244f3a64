use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A color that can appear as a stimulus word or as its ink
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ColorName {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
    Pink,
    Brown,
}

impl ColorName {
    pub const ALL: [ColorName; 8] = [
        ColorName::Red,
        ColorName::Green,
        ColorName::Blue,
        ColorName::Yellow,
        ColorName::Purple,
        ColorName::Orange,
        ColorName::Pink,
        ColorName::Brown,
    ];
}

/// Response keys run '1'..='9', so no palette can be longer than this
pub const MAX_PALETTE_SIZE: usize = 9;

/// The five-color palette used by a default session
pub fn default_palette() -> Vec<ColorName> {
    vec![
        ColorName::Red,
        ColorName::Blue,
        ColorName::Green,
        ColorName::Yellow,
        ColorName::Purple,
    ]
}

/// Map a response key ('1'..='9') to the palette entry it selects
pub fn color_for_key(palette: &[ColorName], key: char) -> Option<ColorName> {
    let slot = key.to_digit(10)? as usize;
    if slot == 0 {
        return None;
    }
    palette.get(slot - 1).copied()
}
