//! Pipeline error types.

use crate::phase::{LifecycleState, Phase};

/// Errors returned by [`SystemsPipeline`](crate::SystemsPipeline) phase calls.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The phase may not run in the pipeline's current lifecycle state.
    #[error("phase '{phase}' cannot run while the pipeline is {state}")]
    OutOfOrder {
        /// The phase that was requested.
        phase: Phase,
        /// The state the pipeline was in.
        state: LifecycleState,
    },

    /// A system returned an error; the rest of the phase was skipped.
    #[error("system '{system}' failed during {phase}: {source}")]
    SystemFailed {
        /// Name of the failing system.
        system: String,
        /// The phase being run.
        phase: Phase,
        /// The system's error.
        #[source]
        source: anyhow::Error,
    },
}
