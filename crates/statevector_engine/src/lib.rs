// =============================================================================
// Linear System Circuits - State Vector Engine
// =============================================================================
// Table of Contents:
//   1. Module Declarations
//   2. Prelude Module
// =============================================================================
// Purpose: Dense state-vector simulation layer: a small gate library, a
//          validated circuit IR, the gate application engine, measurement
//          sampling, and sync/async executors behind a uniform backend trait.
// =============================================================================

pub mod async_runtime;
pub mod circuit_program;
pub mod configuration;
pub mod error;
pub mod execution;
pub mod gate_library;
pub mod measurement;
pub mod state_backend;
pub mod state_vector_engine;

pub mod prelude {
    pub use crate::async_runtime::*;
    pub use crate::circuit_program::*;
    pub use crate::configuration::*;
    pub use crate::error::*;
    pub use crate::execution::*;
    pub use crate::gate_library::*;
    pub use crate::measurement::*;
    pub use crate::state_backend::*;
    pub use crate::state_vector_engine::*;
}
