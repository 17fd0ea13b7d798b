//! The [`System`] trait.

use crate::context::SystemContext;

/// A unit of per-phase logic.
///
/// Systems own no world data; they read and write components through the
/// worlds reachable from the [`SystemContext`]. Returning an error aborts the
/// rest of the phase.
pub trait System {
    /// Name used for registration and diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Run once for the phase the system was registered into.
    ///
    /// # Errors
    ///
    /// Any error is propagated out of the pipeline call unchanged.
    fn run(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()>;
}

/// A [`System`] backed by a closure. Built with [`system_fn`].
pub struct FnSystem<F> {
    name: String,
    f: F,
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut SystemContext<'_>) -> anyhow::Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        (self.f)(ctx)
    }
}

impl<F> std::fmt::Debug for FnSystem<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSystem").field("name", &self.name).finish()
    }
}

/// Wrap a closure as a named [`System`].
///
/// ```rust
/// use engine_system::{Phase, SystemsPipeline, system_fn};
///
/// let mut pipeline = SystemsPipeline::default();
/// pipeline.register(
///     system_fn("spawn", |ctx| {
///         ctx.world().new_entity();
///         Ok(())
///     }),
///     Phase::Init,
/// );
/// pipeline.init().unwrap();
/// assert_eq!(pipeline.world().entity_count(), 1);
/// ```
pub fn system_fn<F>(name: impl Into<String>, f: F) -> FnSystem<F>
where
    F: FnMut(&mut SystemContext<'_>) -> anyhow::Result<()>,
{
    FnSystem {
        name: name.into(),
        f,
    }
}
