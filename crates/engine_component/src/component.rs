//! Core [`Component`] trait and associated metadata.
//!
//! Components are plain, identity-free data. The trait only exists to give
//! every type a stable human-readable name for diagnostics and a
//! [`ComponentTypeId`] for the type-keyed store registry.

use std::any::TypeId;

/// A unique identifier for a component type.
///
/// Wraps the compiler-assigned [`TypeId`], so two distinct Rust types never
/// share an ID even if they report the same [`Component::type_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(TypeId);

impl ComponentTypeId {
    /// Returns the [`ComponentTypeId`] for the component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// Metadata about a component type, used by type-erased storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentMeta {
    /// The unique type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component (e.g. `"Position"`).
    pub name: &'static str,
}

/// The core component trait.
///
/// All data stored in the ECS must implement this trait.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component type.
    ///
    /// Defaults to the fully-qualified Rust type path.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId
    where
        Self: Sized,
    {
        ComponentTypeId::of::<Self>()
    }

    /// Returns the [`ComponentMeta`] descriptor for this component type.
    fn meta() -> ComponentMeta
    where
        Self: Sized,
    {
        ComponentMeta {
            type_id: Self::component_type_id(),
            name: Self::type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Health {
        current: f32,
        max: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Velocity;

    impl Component for Velocity {}

    #[test]
    fn test_component_type_id_is_stable() {
        assert_eq!(Health::component_type_id(), Health::component_type_id());
        assert_eq!(Health::component_type_id(), ComponentTypeId::of::<Health>());
    }

    #[test]
    fn test_component_type_id_differs_between_types() {
        assert_ne!(Health::component_type_id(), Velocity::component_type_id());
    }

    #[test]
    fn test_default_type_name_is_type_path() {
        assert!(Velocity::type_name().ends_with("Velocity"));
    }

    #[test]
    fn test_component_meta() {
        let meta = Health::meta();
        assert_eq!(meta.name, "Health");
        assert_eq!(meta.type_id, ComponentTypeId::of::<Health>());
    }
}
