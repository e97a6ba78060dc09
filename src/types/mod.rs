//! Type definitions

pub mod center;
pub mod messages;
pub mod nearest;
pub mod waiting_time;

pub use center::*;
pub use messages::*;
pub use nearest::*;
pub use waiting_time::*;
