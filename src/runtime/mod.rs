//! # Runtime Module
//!
//! Process runtime: initialization, the controller watch loops and the
//! error policy deciding when failed passes are retried.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use error_policy::*;
pub use initialization::*;
pub use watch_loop::*;
