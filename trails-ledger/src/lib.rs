pub mod ledger;
pub mod reservation;
pub mod store;

pub use ledger::{Ledger, LedgerError};
pub use reservation::{Reservation, ReservationStatus};
pub use store::{MemoryReservationStore, ReservationStore, StoreError};
