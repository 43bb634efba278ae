//! ## minne-core::strategy
//! **Block-placement strategies**
//!
//! The four classic placement policies over the free list: first-fit,
//! best-fit, worst-fit and next-fit with a roaming resume cursor. Searches
//! never mutate the directory; committing the chosen block is the heap's
//! job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::Arena;
use crate::block;

/// Policy used to choose which free block satisfies a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// First free block large enough, scanning from the arena start.
    #[default]
    FirstFit,
    /// Smallest free block large enough; ties go to the lowest address.
    BestFit,
    /// Largest free block large enough; ties go to the lowest address.
    WorstFit,
    /// First-fit resuming at the cursor left by the previous placement,
    /// wrapping around at the end of the list.
    NextFit,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FirstFit => "first-fit",
            Strategy::BestFit => "best-fit",
            Strategy::WorstFit => "worst-fit",
            Strategy::NextFit => "next-fit",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placement strategy: {0}")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    /// Accepts the long, short and one-letter spellings, case-insensitively:
    /// `first-fit|first|f`, `best-fit|best|b`, `worst-fit|worst|w`,
    /// `next-fit|next|n`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first-fit" | "first" | "f" => Ok(Strategy::FirstFit),
            "best-fit" | "best" | "b" => Ok(Strategy::BestFit),
            "worst-fit" | "worst" | "w" => Ok(Strategy::WorstFit),
            "next-fit" | "next" | "n" => Ok(Strategy::NextFit),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Locates a free block with `payload_size >= size` under `strategy`.
///
/// `cursor` is the next-fit resume offset (`None` meaning the first block);
/// the other strategies ignore it. Returns the chosen block's offset.
pub(crate) fn locate(
    arena: &Arena,
    strategy: Strategy,
    size: u32,
    cursor: Option<u32>,
) -> Option<u32> {
    match strategy {
        Strategy::FirstFit => first_fit(arena, size),
        Strategy::BestFit => best_fit(arena, size),
        Strategy::WorstFit => worst_fit(arena, size),
        Strategy::NextFit => next_fit(arena, size, cursor),
    }
}

fn first_fit(arena: &Arena, size: u32) -> Option<u32> {
    block::free_blocks(arena)
        .find(|(_, header)| header.payload_size >= size)
        .map(|(offset, _)| offset)
}

fn best_fit(arena: &Arena, size: u32) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (offset, header) in block::free_blocks(arena) {
        if header.payload_size < size {
            continue;
        }
        // Strict comparison keeps the earliest block on ties.
        if best.is_none_or(|(_, payload)| header.payload_size < payload) {
            best = Some((offset, header.payload_size));
        }
    }
    best.map(|(offset, _)| offset)
}

fn worst_fit(arena: &Arena, size: u32) -> Option<u32> {
    let mut worst: Option<(u32, u32)> = None;
    for (offset, header) in block::free_blocks(arena) {
        if header.payload_size < size {
            continue;
        }
        if worst.is_none_or(|(_, payload)| header.payload_size > payload) {
            worst = Some((offset, header.payload_size));
        }
    }
    worst.map(|(offset, _)| offset)
}

fn next_fit(arena: &Arena, size: u32, cursor: Option<u32>) -> Option<u32> {
    let start = cursor.unwrap_or(block::FIRST);

    let fits = |(_, header): &(u32, block::BlockHeader)| header.is_free && header.payload_size >= size;

    // From the cursor to the end of the list, then wrap and retry the
    // blocks before the cursor.
    block::blocks_from(arena, start)
        .find(fits)
        .or_else(|| {
            block::blocks(arena)
                .take_while(|(offset, _)| *offset < start)
                .find(fits)
        })
        .map(|(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_spellings() {
        for spelling in ["first-fit", "FIRST", "f"] {
            assert_eq!(spelling.parse::<Strategy>().unwrap(), Strategy::FirstFit);
        }
        assert_eq!("best".parse::<Strategy>().unwrap(), Strategy::BestFit);
        assert_eq!("W".parse::<Strategy>().unwrap(), Strategy::WorstFit);
        assert_eq!("next-fit".parse::<Strategy>().unwrap(), Strategy::NextFit);
        assert!("fittest".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for strategy in [
            Strategy::FirstFit,
            Strategy::BestFit,
            Strategy::WorstFit,
            Strategy::NextFit,
        ] {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }
}
