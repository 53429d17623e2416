//! [`ActorEntity`] implementation for [`ResourceNode`].

use super::actions::{NodeAction, NodeActionResult};
use super::error::HarvestError;
use crate::config::ResourceCatalog;
use crate::model::{HarvestAttempt, NodeCreate, NodeId, NodeState, ResourceNode, YieldDescriptor};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

#[async_trait]
impl ActorEntity for ResourceNode {
    type Id = NodeId;
    type Create = NodeCreate;
    type Update = ();
    type Action = NodeAction;
    type ActionResult = NodeActionResult;
    type Context = Arc<ResourceCatalog>;
    type Error = HarvestError;

    fn from_create_params(id: NodeId, params: NodeCreate) -> Result<Self, HarvestError> {
        Ok(Self {
            id,
            kind: params.kind,
            rarity: params.rarity,
            region: params.region,
            position: params.position,
            state: NodeState::Available,
            spawned_at: Instant::now(),
            last_harvest: None,
            respawn_delay: params.respawn_delay,
        })
    }

    /// Only types present in the catalog can be registered.
    async fn on_create(&mut self, catalog: &Arc<ResourceCatalog>) -> Result<(), HarvestError> {
        match catalog.get(&self.kind) {
            Some(_) => Ok(()),
            None => Err(HarvestError::UnknownResourceType(self.kind.clone())),
        }
    }

    async fn on_update(&mut self, _: (), _: &Arc<ResourceCatalog>) -> Result<(), HarvestError> {
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: NodeAction,
        catalog: &Arc<ResourceCatalog>,
    ) -> Result<NodeActionResult, HarvestError> {
        match action {
            NodeAction::Harvest(attempt) => self.harvest(attempt, catalog).map(NodeActionResult::Harvest),
            NodeAction::Respawn => {
                if self.state == NodeState::Available {
                    debug!(node = %self.id, "Respawn on available node ignored");
                    return Ok(NodeActionResult::Respawn(false));
                }
                self.state = NodeState::Available;
                self.last_harvest = None;
                Ok(NodeActionResult::Respawn(true))
            }
        }
    }
}

impl ResourceNode {
    fn harvest(
        &mut self,
        attempt: HarvestAttempt,
        catalog: &ResourceCatalog,
    ) -> Result<YieldDescriptor, HarvestError> {
        if self.state != NodeState::Available {
            return Err(HarvestError::NodeNotReady(self.id));
        }

        let distance = attempt.player_position.distance(self.position);
        if distance > attempt.interaction_range {
            return Err(HarvestError::TooFar {
                distance,
                range: attempt.interaction_range,
            });
        }

        let config = catalog
            .get(&self.kind)
            .ok_or_else(|| HarvestError::UnknownResourceType(self.kind.clone()))?;
        if let Some(required) = &config.required_tool {
            if attempt.equipped_tool.as_ref() != Some(required) {
                return Err(HarvestError::WrongTool {
                    required: required.clone(),
                    equipped: attempt.equipped_tool,
                });
            }
        }

        let bonus = attempt
            .equipped_tool
            .as_ref()
            .and_then(|tool| config.tool_bonus.get(tool))
            .copied()
            .unwrap_or(0);
        let tool_used = attempt
            .equipped_tool
            .filter(|_| config.required_tool.is_some() || bonus > 0);

        self.state = NodeState::Depleted;
        self.last_harvest = Some(Instant::now());

        Ok(YieldDescriptor {
            node_id: self.id,
            region: self.region,
            kind: self.kind.clone(),
            amount: config.harvest_yield + bonus,
            respawn_delay: self.respawn_delay,
            tool_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::model::{PlayerId, Rarity, RegionId};
    use glam::Vec3;
    use std::time::Duration;

    fn catalog() -> Arc<ResourceCatalog> {
        Arc::new(EconomyConfig::default().catalog())
    }

    fn node(kind: &str) -> ResourceNode {
        ResourceNode::from_create_params(
            NodeId(1),
            NodeCreate {
                kind: kind.into(),
                rarity: Rarity::Common,
                region: RegionId(1),
                position: Vec3::new(0.0, -20.0, 0.0),
                respawn_delay: Duration::from_secs(30),
            },
        )
        .unwrap()
    }

    fn attempt(x: f32, tool: Option<&str>) -> HarvestAttempt {
        HarvestAttempt {
            player: PlayerId(1),
            player_position: Vec3::new(x, -20.0, 0.0),
            equipped_tool: tool.map(Into::into),
            interaction_range: 10.0,
        }
    }

    #[tokio::test]
    async fn test_harvest_depletes_once() {
        let catalog = catalog();
        let mut kelp = node("kelp");
        let result = kelp.handle_action(NodeAction::Harvest(attempt(3.0, None)), &catalog).await;
        match result {
            Ok(NodeActionResult::Harvest(descriptor)) => {
                assert_eq!(descriptor.amount, 3);
                assert_eq!(descriptor.tool_used, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(kelp.state, NodeState::Depleted);
        assert!(kelp.last_harvest.is_some());

        let again = kelp.handle_action(NodeAction::Harvest(attempt(3.0, None)), &catalog).await;
        assert_eq!(again.unwrap_err(), HarvestError::NodeNotReady(NodeId(1)));
    }

    #[tokio::test]
    async fn test_too_far_leaves_node_available() {
        let catalog = catalog();
        let mut kelp = node("kelp");
        let err = kelp
            .handle_action(NodeAction::Harvest(attempt(11.0, None)), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::TooFar { distance, .. } if (distance - 11.0).abs() < 1e-4));
        assert!(kelp.is_available());
    }

    #[tokio::test]
    async fn test_state_checked_before_distance() {
        let catalog = catalog();
        let mut kelp = node("kelp");
        kelp.state = NodeState::Depleted;
        let err = kelp
            .handle_action(NodeAction::Harvest(attempt(50.0, None)), &catalog)
            .await
            .unwrap_err();
        assert_eq!(err, HarvestError::NodeNotReady(NodeId(1)));
    }

    #[tokio::test]
    async fn test_required_tool() {
        let catalog = catalog();
        let mut pearl = node("pearl");
        let err = pearl
            .handle_action(NodeAction::Harvest(attempt(1.0, Some("rope"))), &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::WrongTool { ref required, .. } if required.as_str() == "pry_bar"));
        assert!(pearl.is_available());

        let ok = pearl
            .handle_action(NodeAction::Harvest(attempt(1.0, Some("pry_bar"))), &catalog)
            .await
            .unwrap();
        assert!(matches!(ok, NodeActionResult::Harvest(d) if d.tool_used == Some("pry_bar".into())));
    }

    #[tokio::test]
    async fn test_tool_bonus_adds_yield() {
        let catalog = catalog();
        let mut coral = node("coral");
        let result = coral
            .handle_action(NodeAction::Harvest(attempt(0.0, Some("pry_bar"))), &catalog)
            .await
            .unwrap();
        assert!(matches!(result, NodeActionResult::Harvest(d) if d.amount == 3));
    }

    #[tokio::test]
    async fn test_respawn_restores_and_clears_harvest_marker() {
        let catalog = catalog();
        let mut kelp = node("kelp");
        assert!(matches!(
            kelp.handle_action(NodeAction::Respawn, &catalog).await,
            Ok(NodeActionResult::Respawn(false))
        ));
        kelp.handle_action(NodeAction::Harvest(attempt(0.0, None)), &catalog)
            .await
            .unwrap();
        assert!(matches!(
            kelp.handle_action(NodeAction::Respawn, &catalog).await,
            Ok(NodeActionResult::Respawn(true))
        ));
        assert!(kelp.is_available());
        assert!(kelp.last_harvest.is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_rejected_on_create() {
        let mut driftwood = node("driftwood");
        let err = driftwood.on_create(&catalog()).await.unwrap_err();
        assert_eq!(err, HarvestError::UnknownResourceType("driftwood".into()));
    }
}
