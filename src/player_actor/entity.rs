//! [`ActorEntity`] implementation for [`PlayerLedger`].
//!
//! The ledger's context is the [`PersistenceHandle`]; every action that changes what is
//! persisted queues the new record before replying.

use super::actions::{CraftCredit, HarvestCredit, PlayerAction, PlayerActionResult, SlotRelease};
use super::error::PlayerError;
use crate::model::{ItemKind, PlayerCreate, PlayerId, PlayerLedger, PlayerRecord, PlayerUpdate, ToolRecord};
use crate::persistence::PersistenceHandle;
use actor_framework::ActorEntity;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[async_trait]
impl ActorEntity for PlayerLedger {
    type Id = PlayerId;
    type Create = PlayerCreate;
    type Update = PlayerUpdate;
    type Action = PlayerAction;
    type ActionResult = PlayerActionResult;
    type Context = PersistenceHandle;
    type Error = PlayerError;

    fn from_create_params(id: PlayerId, params: PlayerCreate) -> Result<Self, PlayerError> {
        let record = params
            .record
            .map(|record| PlayerRecord {
                player_id: id,
                ..record
            })
            .unwrap_or_else(|| PlayerRecord::empty(id));
        Ok(PlayerLedger::from_record(
            record,
            params.inventory_capacity,
            params.position,
        ))
    }

    /// # Fields Updated
    /// - `position`: last position reported by the movement collaborator
    /// - `equipped_tool`: must name a tool the player owns
    async fn on_update(
        &mut self,
        update: PlayerUpdate,
        _persistence: &PersistenceHandle,
    ) -> Result<(), PlayerError> {
        if let Some(Some(tool)) = &update.equipped_tool {
            if !self.owns_tool(tool) {
                return Err(PlayerError::ToolNotOwned(tool.clone()));
            }
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(tool) = update.equipped_tool {
            self.equipped_tool = tool;
        }
        Ok(())
    }

    /// Writes the final record on disconnect.
    async fn on_delete(&self, persistence: &PersistenceHandle) -> Result<(), PlayerError> {
        persistence.save(self.to_record());
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: PlayerAction,
        persistence: &PersistenceHandle,
    ) -> Result<PlayerActionResult, PlayerError> {
        let result = match action {
            PlayerAction::ReserveCraft {
                ingredients,
                output_items,
                max_active,
            } => self
                .reserve_craft(&ingredients, output_items, max_active)
                .map(PlayerActionResult::ReserveCraft)?,
            PlayerAction::CompleteCraft(credit) => {
                PlayerActionResult::CompleteCraft(self.complete_craft(credit))
            }
            PlayerAction::ReleaseCraftSlot {
                release,
                reserved_output,
            } => PlayerActionResult::ReleaseCraftSlot(self.release_slot(release, reserved_output)),
            PlayerAction::CreditHarvest {
                kind,
                amount,
                tool_used,
                wear,
            } => PlayerActionResult::CreditHarvest(self.credit_harvest(&kind, amount, tool_used, wear)),
            PlayerAction::Grant { items, tools } => {
                for (kind, amount) in &items {
                    self.credit(kind, *amount);
                }
                self.tools.extend(tools);
                PlayerActionResult::Grant(())
            }
        };
        persistence.save(self.to_record());
        Ok(result)
    }
}

impl PlayerLedger {
    fn reserve_craft(
        &mut self,
        ingredients: &BTreeMap<ItemKind, u64>,
        output_items: u64,
        max_active: u32,
    ) -> Result<(), PlayerError> {
        if self.active_crafts >= max_active {
            return Err(PlayerError::TooManyActiveCrafts { limit: max_active });
        }
        let missing = self.missing_for(ingredients);
        if !missing.is_empty() {
            return Err(PlayerError::MissingIngredients(missing));
        }
        if !self.has_room_for(output_items) {
            return Err(PlayerError::InventoryFull {
                required: self.committed_items().saturating_add(output_items),
                capacity: self.inventory_capacity,
            });
        }

        self.debit_all(ingredients);
        self.active_crafts += 1;
        self.pending_output += output_items;
        self.stats.crafts_started += 1;
        debug!(
            player = %self.id,
            active = self.active_crafts,
            pending = self.pending_output,
            "Ingredients reserved"
        );
        Ok(())
    }

    /// Credits the reserved base in full and as much of the bonus as still fits.
    fn complete_craft(&mut self, credit: CraftCredit) -> u64 {
        self.pending_output = self.pending_output.saturating_sub(credit.reserved_output);
        let base = credit.quantity.min(credit.reserved_output);
        let bonus = (credit.quantity - base).min(self.free_room().saturating_sub(base));
        let quantity = base + bonus;
        if bonus < credit.quantity - base {
            debug!(
                player = %self.id,
                dropped = credit.quantity - base - bonus,
                "Bonus output exceeds free room"
            );
        }

        match credit.tool_durability {
            Some(durability) => {
                let tool = ToolRecord {
                    kind: credit.output.clone(),
                    durability,
                    max_durability: durability,
                    quality: credit.quality,
                };
                self.tools
                    .extend(std::iter::repeat(tool).take(quantity as usize));
            }
            None => self.credit(&credit.output, quantity),
        }
        self.active_crafts = self.active_crafts.saturating_sub(1);
        self.stats.crafts_completed += 1;
        self.stats.items_crafted += quantity;
        self.stats.experience += credit.experience;
        quantity
    }

    fn release_slot(&mut self, release: SlotRelease, reserved_output: u64) {
        self.active_crafts = self.active_crafts.saturating_sub(1);
        self.pending_output = self.pending_output.saturating_sub(reserved_output);
        match release {
            SlotRelease::Failed => self.stats.crafts_failed += 1,
            SlotRelease::Cancelled => self.stats.crafts_cancelled += 1,
        }
    }

    fn credit_harvest(
        &mut self,
        kind: &ItemKind,
        amount: u32,
        tool_used: Option<ItemKind>,
        wear: u32,
    ) -> HarvestCredit {
        self.credit(kind, amount as u64);
        self.stats.harvests += 1;
        self.stats.resources_harvested += amount as u64;

        let tool_durability = tool_used.and_then(|tool| self.wear_tool(&tool, wear));
        HarvestCredit {
            balance: self.balance(kind),
            tool_durability,
        }
    }

    /// Wears the most-used tool of `kind`. A tool reaching zero is removed, and unequipped if it
    /// was the last of its kind.
    fn wear_tool(&mut self, kind: &ItemKind, wear: u32) -> Option<u32> {
        let index = self
            .tools
            .iter()
            .enumerate()
            .filter(|(_, t)| &t.kind == kind)
            .min_by_key(|(_, t)| t.durability)
            .map(|(i, _)| i)?;

        let tool = &mut self.tools[index];
        tool.durability = tool.durability.saturating_sub(wear);
        let remaining = tool.durability;
        if remaining == 0 {
            self.tools.remove(index);
            self.stats.tools_broken += 1;
            info!(player = %self.id, tool = %kind, "Tool broke");
            if !self.owns_tool(kind) && self.equipped_tool.as_ref() == Some(kind) {
                self.equipped_tool = None;
            }
        }
        Some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QualityTier;
    use crate::persistence::PersistenceCommand;
    use glam::Vec3;
    use tokio::sync::mpsc;

    fn ledger(balances: &[(&str, u64)]) -> PlayerLedger {
        let mut record = PlayerRecord::empty(PlayerId(1));
        record.balances = balances.iter().map(|(k, v)| (ItemKind::from(*k), *v)).collect();
        PlayerLedger::from_create_params(
            PlayerId(1),
            PlayerCreate {
                record: Some(record),
                inventory_capacity: 20,
                position: Vec3::ZERO,
            },
        )
        .unwrap()
    }

    fn persistence() -> (PersistenceHandle, mpsc::UnboundedReceiver<PersistenceCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (PersistenceHandle::new(sender), receiver)
    }

    fn reserve(kelp: u64, output_items: u64) -> PlayerAction {
        PlayerAction::ReserveCraft {
            ingredients: BTreeMap::from([(ItemKind::from("kelp"), kelp)]),
            output_items,
            max_active: 2,
        }
    }

    fn pry_bar(durability: u32) -> ToolRecord {
        ToolRecord {
            kind: "pry_bar".into(),
            durability,
            max_durability: 50,
            quality: QualityTier::Common,
        }
    }

    #[tokio::test]
    async fn test_reserve_debits_and_persists() {
        let (persistence, mut saved) = persistence();
        let mut player = ledger(&[("kelp", 5)]);
        player.handle_action(reserve(3, 1), &persistence).await.unwrap();
        assert_eq!(player.balance(&"kelp".into()), 2);
        assert_eq!(player.active_crafts, 1);
        match saved.try_recv() {
            Ok(PersistenceCommand::Save(record)) => assert_eq!(record.balances[&ItemKind::from("kelp")], 2),
            other => panic!("expected a save, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_reserve_sees_debited_balance() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[("kelp", 3)]);
        player.handle_action(reserve(3, 1), &persistence).await.unwrap();
        let err = player.handle_action(reserve(3, 1), &persistence).await.unwrap_err();
        assert!(matches!(err, PlayerError::MissingIngredients(ref m) if m[0].available == 0));
        assert_eq!(player.active_crafts, 1);
    }

    #[tokio::test]
    async fn test_reserve_checks_cap_and_capacity() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[("kelp", 15)]);

        let err = player.handle_action(reserve(3, 10), &persistence).await.unwrap_err();
        assert_eq!(err, PlayerError::InventoryFull { required: 25, capacity: 20 });
        assert_eq!(player.balance(&"kelp".into()), 15);

        player.handle_action(reserve(3, 1), &persistence).await.unwrap();
        player.handle_action(reserve(3, 1), &persistence).await.unwrap();
        let err = player.handle_action(reserve(3, 1), &persistence).await.unwrap_err();
        assert_eq!(err, PlayerError::TooManyActiveCrafts { limit: 2 });
        assert_eq!(player.balance(&"kelp".into()), 9);
    }

    #[tokio::test]
    async fn test_reserved_output_blocks_later_reserves() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[("kelp", 12)]);
        player.handle_action(reserve(1, 8), &persistence).await.unwrap();
        assert_eq!(player.pending_output, 8);

        let err = player.handle_action(reserve(1, 8), &persistence).await.unwrap_err();
        assert_eq!(err, PlayerError::InventoryFull { required: 26, capacity: 20 });
        assert_eq!(player.balance(&"kelp".into()), 11);

        player
            .handle_action(
                PlayerAction::ReleaseCraftSlot {
                    release: SlotRelease::Cancelled,
                    reserved_output: 8,
                },
                &persistence,
            )
            .await
            .unwrap();
        assert_eq!(player.pending_output, 0);
        assert_eq!(player.active_crafts, 0);
        player.handle_action(reserve(1, 8), &persistence).await.unwrap();
    }

    #[tokio::test]
    async fn test_bonus_is_clamped_to_free_room() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[("kelp", 12)]);
        player.handle_action(reserve(1, 8), &persistence).await.unwrap();

        let result = player
            .handle_action(
                PlayerAction::CompleteCraft(CraftCredit {
                    output: "rope".into(),
                    reserved_output: 8,
                    quantity: 12,
                    quality: QualityTier::Perfect,
                    tool_durability: None,
                    experience: 10,
                }),
                &persistence,
            )
            .await
            .unwrap();
        // 11 kelp + 8 base leaves room for one bonus item.
        assert!(matches!(result, PlayerActionResult::CompleteCraft(9)));
        assert_eq!(player.balance(&"rope".into()), 9);
        assert_eq!(player.total_items(), 20);
        assert_eq!(player.pending_output, 0);
        assert_eq!(player.stats.items_crafted, 9);
    }

    #[tokio::test]
    async fn test_tool_credit_creates_records() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[]);
        player.active_crafts = 1;
        player
            .handle_action(
                PlayerAction::CompleteCraft(CraftCredit {
                    output: "pry_bar".into(),
                    reserved_output: 2,
                    quantity: 2,
                    quality: QualityTier::Excellent,
                    tool_durability: Some(75),
                    experience: 45,
                }),
                &persistence,
            )
            .await
            .unwrap();
        assert_eq!(player.tools.len(), 2);
        assert!(player.tools.iter().all(|t| t.max_durability == 75 && t.quality == QualityTier::Excellent));
        assert_eq!(player.balance(&"pry_bar".into()), 0);
        assert_eq!(player.active_crafts, 0);
        assert_eq!(player.stats.experience, 45);
    }

    #[tokio::test]
    async fn test_harvest_wear_breaks_and_unequips() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[]);
        player.tools.push(pry_bar(1));
        player.equipped_tool = Some("pry_bar".into());

        let result = player
            .handle_action(
                PlayerAction::CreditHarvest {
                    kind: "pearl".into(),
                    amount: 1,
                    tool_used: Some("pry_bar".into()),
                    wear: 1,
                },
                &persistence,
            )
            .await
            .unwrap();
        assert!(matches!(
            result,
            PlayerActionResult::CreditHarvest(HarvestCredit { balance: 1, tool_durability: Some(0) })
        ));
        assert!(player.tools.is_empty());
        assert_eq!(player.equipped_tool, None);
        assert_eq!(player.stats.tools_broken, 1);
    }

    #[tokio::test]
    async fn test_equip_requires_owned_tool() {
        let (persistence, _saved) = persistence();
        let mut player = ledger(&[]);
        let equip = PlayerUpdate {
            position: None,
            equipped_tool: Some(Some("pry_bar".into())),
        };
        let err = player.on_update(equip.clone(), &persistence).await.unwrap_err();
        assert_eq!(err, PlayerError::ToolNotOwned("pry_bar".into()));

        player.tools.push(pry_bar(10));
        player.on_update(equip, &persistence).await.unwrap();
        assert_eq!(player.equipped_tool, Some("pry_bar".into()));
    }
}
