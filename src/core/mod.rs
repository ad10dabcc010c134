//! 核心层：错误类型、时钟、调用超时、优雅关闭

pub mod clock;
pub mod deadline;
pub mod error;
pub mod shutdown;

pub use clock::{Clock, FixedClock, SystemClock};
pub use deadline::within;
pub use error::MenuError;
pub use shutdown::{ShutdownManager, ShutdownReason};
