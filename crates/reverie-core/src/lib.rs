pub mod constants;
pub mod engine;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod moods;
pub mod session;
pub mod transport;

pub use constants::*;
pub use engine::*;
pub use error::*;
pub use graph::*;
pub use lifecycle::*;
pub use moods::*;
pub use session::*;
pub use transport::*;
