//! Wires the rollup services together for an embedding process.

mod context;
mod logging;

pub use context::{AppContext, Collaborators};
pub use logging::init_logging;
