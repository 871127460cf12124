pub mod stop;
pub mod store;
pub mod trip;

pub use stop::Stop;
pub use store::{MemoryCatalog, StopStore, TripStore};
pub use trip::{Trip, TripCategory, TripStatus};
