use crate::model::{HarvestAttempt, NodeCreate, NodeId, RegionId, ResourceNode, YieldDescriptor};
use crate::node_actor::{HarvestError, NodeAction, NodeActionResult};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the node registry actor.
#[derive(Clone)]
pub struct NodeClient {
    inner: ResourceClient<ResourceNode>,
}

impl NodeClient {
    pub fn new(inner: ResourceClient<ResourceNode>) -> Self {
        Self { inner }
    }

    /// A missing node is reported as [`HarvestError::NodeNotFound`] rather than a plumbing error.
    fn map_node_error(id: NodeId, e: FrameworkError) -> HarvestError {
        if e.is_not_found() {
            HarvestError::NodeNotFound(id)
        } else {
            Self::map_error(e)
        }
    }

    #[instrument(skip(self, node), fields(kind = %node.kind, region = %node.region))]
    pub async fn register(&self, node: NodeCreate) -> Result<NodeId, HarvestError> {
        debug!("Sending request");
        self.inner.create(node).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, attempt), fields(player = %attempt.player))]
    pub async fn harvest(
        &self,
        id: NodeId,
        attempt: HarvestAttempt,
    ) -> Result<YieldDescriptor, HarvestError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, NodeAction::Harvest(attempt))
            .await
        {
            Ok(NodeActionResult::Harvest(descriptor)) => Ok(descriptor),
            Ok(other) => Err(HarvestError::ActorCommunicationError(format!(
                "unexpected result {other:?}"
            ))),
            Err(e) => Err(Self::map_node_error(id, e)),
        }
    }

    /// Returns whether the node changed state.
    #[instrument(skip(self))]
    pub async fn respawn(&self, id: NodeId) -> Result<bool, HarvestError> {
        debug!("Sending request");
        match self.inner.perform_action(id, NodeAction::Respawn).await {
            Ok(NodeActionResult::Respawn(changed)) => Ok(changed),
            Ok(other) => Err(HarvestError::ActorCommunicationError(format!(
                "unexpected result {other:?}"
            ))),
            Err(e) => Err(Self::map_node_error(id, e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: NodeId) -> Result<(), HarvestError> {
        debug!("Sending request");
        self.inner
            .delete(id)
            .await
            .map_err(|e| Self::map_node_error(id, e))
    }

    #[instrument(skip(self))]
    pub async fn in_region(&self, region: RegionId) -> Result<Vec<ResourceNode>, HarvestError> {
        let mut nodes: Vec<_> = self
            .list()
            .await?
            .into_iter()
            .filter(|node| node.region == region)
            .collect();
        nodes.sort_by_key(|node| node.id);
        Ok(nodes)
    }
}

#[async_trait]
impl ActorClient<ResourceNode> for NodeClient {
    type Error = HarvestError;

    fn inner(&self) -> &ResourceClient<ResourceNode> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<HarvestError>() {
            Ok(typed) => typed,
            Err(other) => HarvestError::ActorCommunicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_framework::mock::MockClient;
    use glam::Vec3;
    use crate::model::PlayerId;

    fn attempt() -> HarvestAttempt {
        HarvestAttempt {
            player: PlayerId(1),
            player_position: Vec3::ZERO,
            equipped_tool: None,
            interaction_range: 10.0,
        }
    }

    #[tokio::test]
    async fn test_harvest_recovers_typed_entity_error() {
        let mut mock = MockClient::<ResourceNode>::new();
        mock.expect_action(NodeId(4))
            .return_err(FrameworkError::EntityError(Box::new(HarvestError::NodeNotReady(NodeId(4)))));
        mock.expect_action(NodeId(5))
            .return_err(FrameworkError::NotFound("node_5".into()));
        mock.expect_action(NodeId(6)).return_err(FrameworkError::ActorClosed);

        let client = NodeClient::new(mock.client());
        assert_eq!(
            client.harvest(NodeId(4), attempt()).await.unwrap_err(),
            HarvestError::NodeNotReady(NodeId(4))
        );
        assert_eq!(
            client.harvest(NodeId(5), attempt()).await.unwrap_err(),
            HarvestError::NodeNotFound(NodeId(5))
        );
        assert!(matches!(
            client.harvest(NodeId(6), attempt()).await.unwrap_err(),
            HarvestError::ActorCommunicationError(_)
        ));
        mock.verify();
    }

    #[tokio::test]
    async fn test_remove_missing_node_is_not_found() {
        let mut mock = MockClient::<ResourceNode>::new();
        mock.expect_delete(NodeId(2))
            .return_err(FrameworkError::NotFound("node_2".into()));

        let client = NodeClient::new(mock.client());
        assert_eq!(client.remove(NodeId(2)).await, Err(HarvestError::NodeNotFound(NodeId(2))));
        mock.verify();
    }
}
