//! Domain model of the Lezo civil registry: citizens, regions, kin edges,
//! roles, the repository traits every backend implements, and the kinship
//! inference engine that runs on top of them.
//!
//! No HTTP or database code lives here. [`memory::InMemoryRegistry`] is the
//! reference backend used by the tests of every crate.

// Repository traits spell out `impl Future + Send` and implementors use
// `async fn`; the advisory lint does not apply.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod citizen;
pub mod error;
pub mod kinship;
pub mod memory;
pub mod region;
pub mod relationship;
pub mod store;

pub use error::{Error, Result};
pub use region::Region;
