//! Custom actions for the player ledger.
//!
//! Every balance mutation in the economy is one of these actions. The ledger actor handles one
//! at a time, so a reservation's check and its debit can never interleave with another
//! reservation for the same player.

use crate::model::{ItemKind, QualityTier, ToolRecord};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum PlayerAction {
    /// Checks the craft cap, the ingredients and the inventory room, then debits the
    /// ingredients, takes a craft slot and holds `output_items` of room until the craft settles.
    ReserveCraft {
        ingredients: BTreeMap<ItemKind, u64>,
        output_items: u64,
        max_active: u32,
    },
    /// Credits a finished craft and frees its slot and its held room.
    CompleteCraft(CraftCredit),
    /// Frees a slot and its held room without output. Consumed ingredients stay consumed.
    ReleaseCraftSlot {
        release: SlotRelease,
        reserved_output: u64,
    },
    /// Credits a harvest yield and wears the tool that was used.
    CreditHarvest {
        kind: ItemKind,
        amount: u32,
        tool_used: Option<ItemKind>,
        wear: u32,
    },
    /// Adds counted items and tools, e.g. a starting kit.
    Grant {
        items: BTreeMap<ItemKind, u64>,
        tools: Vec<ToolRecord>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CraftCredit {
    pub output: ItemKind,
    /// Room held by the matching `ReserveCraft`.
    pub reserved_output: u64,
    /// Rolled output. Anything above `reserved_output` is only credited while room is free.
    pub quantity: u64,
    pub quality: QualityTier,
    /// Durability of each produced tool; `None` credits a plain count.
    pub tool_durability: Option<u32>,
    pub experience: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRelease {
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestCredit {
    /// Balance of the harvested kind after crediting.
    pub balance: u64,
    /// Remaining durability of the worn tool, `Some(0)` when it broke.
    pub tool_durability: Option<u32>,
}

/// Results from PlayerActions - variants match 1:1 with PlayerAction
#[derive(Debug, Clone)]
pub enum PlayerActionResult {
    ReserveCraft(()),
    /// Items actually credited.
    CompleteCraft(u64),
    ReleaseCraftSlot(()),
    CreditHarvest(HarvestCredit),
    Grant(()),
}
