//! "Core" refers to the objects that make up a renderable context, created in
//! dependency order and destroyed in reverse by their `Drop` impls.

pub mod context;
pub mod device;
pub mod instance;
pub mod queue;
pub mod surface;
