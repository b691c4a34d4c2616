//! Transformations whose registration isn't purely directive-local: the
//! accelerator wrap (§4.D.3) and block-delimited transformations (§4.D.4).

pub mod accelerator;
pub mod block;

pub use accelerator::Accelerator;
pub use block::BlockTransform;
