//! Domain models for the inventory analysis engine

mod alert;
mod estimate;
mod expiry;
mod product;
mod run;
mod stock;
mod upload;

pub use alert::*;
pub use estimate::*;
pub use expiry::*;
pub use product::*;
pub use run::*;
pub use stock::*;
pub use upload::*;
