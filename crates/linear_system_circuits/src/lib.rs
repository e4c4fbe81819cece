// =============================================================================
// Linear System Circuits - Algorithm Layer
// =============================================================================
// Table of Contents:
//   1. Module Declarations
//   2. Prelude Module
// =============================================================================
// Purpose: Composes the textbook 2x2 linear-system circuit on top of the
//          state vector engine and turns its exact and sampled results into
//          a solution vector and post-selection statistics.
// =============================================================================

pub mod composer;
pub mod error;
pub mod hermitian;
pub mod state_preparation;
pub mod statistics;

pub mod prelude {
    pub use crate::composer::*;
    pub use crate::error::*;
    pub use crate::hermitian::*;
    pub use crate::state_preparation::*;
    pub use crate::statistics::*;
}
