pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod records;
pub mod transaction;
pub mod types;
pub mod units;

pub use config::*;
pub use constants::*;
pub use error::EcoCredError;
pub use event::*;
pub use records::*;
pub use transaction::*;
pub use types::*;
