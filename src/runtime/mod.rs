//! Runtime kernel and host adapters.

pub mod kernel;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_host;

pub use kernel::Kernel;
#[cfg(feature = "tokio-runtime")]
pub use tokio_host::{Completed, TokioHost};
