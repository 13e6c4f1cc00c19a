pub mod config;
pub mod error;
pub mod ticker;
pub mod ticks;
pub mod timer;
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::TickerConfig;
pub use error::Error;
pub use ticker::ManagedTicker;
pub use ticks::{Ticks, TryRecvError};
pub use utils::shutdown::Shutdown;
