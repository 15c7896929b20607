//! Evolution outcome from accumulated care quality.

use serde::{Deserialize, Serialize};

/// Fewer mistakes than this grades [`Tier::Good`]
pub const GOOD_BELOW: u32 = 3;

/// More mistakes than this grades [`Tier::Bad`]
pub const BAD_ABOVE: u32 = 8;

/// Outcome label fixed at the child → adult transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Well cared for
    Good,
    /// Somewhere in between
    Neutral,
    /// Neglected
    Bad,
}

impl Tier {
    /// Status line shown when the pet evolves into this tier
    #[must_use]
    pub const fn evolution_message(self) -> &'static str {
        match self {
            Self::Good => "evolved: good",
            Self::Neutral => "evolved: neutral",
            Self::Bad => "evolved: bad",
        }
    }
}

/// Grade a care-mistake count.
///
/// `< 3` is good, `> 8` is bad, everything else neutral.
#[must_use]
pub const fn resolve(care_mistakes: u32) -> Tier {
    if care_mistakes < GOOD_BELOW {
        Tier::Good
    } else if care_mistakes > BAD_ABOVE {
        Tier::Bad
    } else {
        Tier::Neutral
    }
}
