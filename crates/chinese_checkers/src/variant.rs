//! Rule variants.

use serde::{Deserialize, Serialize};

/// Ruleset selecting which base a piece may not leave and how a player wins.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Variant {
    /// Travel from the home base into the opposite base; once there, stay.
    #[default]
    #[serde(alias = "Rozgrywka klasyczna")]
    #[strum(to_string = "Rozgrywka klasyczna", serialize = "classic")]
    Classic,

    /// Pieces start scattered and must gather in their own home base.
    #[serde(alias = "Order Out Of Chaos", alias = "chaos")]
    #[strum(
        to_string = "Order Out Of Chaos",
        serialize = "order_out_of_chaos",
        serialize = "chaos"
    )]
    OrderOutOfChaos,
}

impl Variant {
    /// Whether the variant's goal is the player's own home base.
    pub fn targets_home(self) -> bool {
        matches!(self, Variant::OrderOutOfChaos)
    }
}
