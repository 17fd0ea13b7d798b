//! ECS error types.

use crate::entity::Entity;

/// Errors returned by entity and component operations.
///
/// Every variant carries the entity handle and, where relevant, the component
/// type name so the caller can tell which system and which data went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The handle does not name a live entity (never allocated, removed, or
    /// a stale generation of a recycled index).
    #[error("{entity} is not a live entity")]
    EntityNotFound {
        /// The offending handle.
        entity: Entity,
    },

    /// `add_component` was called for a type the entity already holds.
    #[error("component '{component}' is already attached to {entity}")]
    ComponentAlreadyAttached {
        /// Component type name.
        component: &'static str,
        /// The entity that already holds it.
        entity: Entity,
    },

    /// The component type was never registered, or the entity lacks it.
    #[error("component '{component}' is not attached to {entity}")]
    ComponentNotAttached {
        /// Component type name.
        component: &'static str,
        /// The entity that was queried.
        entity: Entity,
    },
}

impl EcsError {
    /// Returns the entity this error refers to.
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self {
            Self::EntityNotFound { entity }
            | Self::ComponentAlreadyAttached { entity, .. }
            | Self::ComponentNotAttached { entity, .. } => *entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let e = Entity::new(3, 1);
        let err = EcsError::ComponentAlreadyAttached {
            component: "Position",
            entity: e,
        };
        let msg = err.to_string();
        assert!(msg.contains("Position"));
        assert!(msg.contains("3v1"));
        assert_eq!(err.entity(), e);
    }
}
