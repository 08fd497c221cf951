//! Collection of generic internal data types that are used widely across the
//! rollup services.

#[macro_use]
mod macros;

pub mod batch;
pub mod buf;
pub mod crypto;
pub mod errors;
pub mod hash;
pub mod tx;
pub mod witness;

pub mod prelude;
