use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trails_shared::Fare;
use uuid::Uuid;

/// Wizard progression. Strictly forward; the ordering of the variants is the
/// ordering of the steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStep {
    Empty,
    SearchEntered,
    TripSelected,
    SeatsChosen,
    Priced,
    Committed,
}

/// The route query that opens a wizard session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub passengers: u32,
}

/// Per-visitor in-progress booking state. Lives only in the session
/// collaborator, keyed by the visitor's token subject; once committed into a
/// reservation it is cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    step: DraftStep,
    pub search: Option<SearchQuery>,
    pub trip_id: Option<Uuid>,
    pub pickup_stop: Option<String>,
    pub dropoff_stop: Option<String>,
    pub seats: Vec<String>,
    pub total_fare: Option<Fare>,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

impl Draft {
    pub fn new() -> Self {
        Self {
            step: DraftStep::Empty,
            search: None,
            trip_id: None,
            pickup_stop: None,
            dropoff_stop: None,
            seats: Vec::new(),
            total_fare: None,
        }
    }

    pub fn step(&self) -> DraftStep {
        self.step
    }

    /// The earliest step the visitor still has to complete. The web layer
    /// redirects here instead of erroring hard on out-of-order requests.
    pub fn resume_step(&self) -> DraftStep {
        match self.step {
            DraftStep::Empty => DraftStep::SearchEntered,
            DraftStep::SearchEntered => DraftStep::TripSelected,
            DraftStep::TripSelected => DraftStep::SeatsChosen,
            DraftStep::SeatsChosen => DraftStep::Priced,
            DraftStep::Priced | DraftStep::Committed => DraftStep::Committed,
        }
    }

    fn guard(&self, reached: DraftStep) -> Result<(), DraftError> {
        if self.step == DraftStep::Committed {
            return Err(DraftError::AlreadyCommitted);
        }
        if self.step < reached {
            return Err(DraftError::OutOfOrder {
                required: self.resume_step(),
            });
        }
        Ok(())
    }

    /// Step 1: record the search. Allowed at any point before commit;
    /// re-searching restarts the wizard, so later fields are reset.
    pub fn enter_search(&mut self, search: SearchQuery) -> Result<(), DraftError> {
        if self.step == DraftStep::Committed {
            return Err(DraftError::AlreadyCommitted);
        }
        if search.origin.trim().is_empty() || search.destination.trim().is_empty() {
            return Err(DraftError::MissingField("origin and destination"));
        }
        if search.passengers == 0 {
            return Err(DraftError::MissingField("passenger count"));
        }

        self.search = Some(search);
        self.trip_id = None;
        self.pickup_stop = None;
        self.dropoff_stop = None;
        self.seats.clear();
        self.total_fare = None;
        self.step = DraftStep::SearchEntered;
        Ok(())
    }

    /// Step 2: pick a trip from the results, with optional boarding points.
    pub fn select_trip(
        &mut self,
        trip_id: Uuid,
        pickup_stop: Option<String>,
        dropoff_stop: Option<String>,
    ) -> Result<(), DraftError> {
        self.guard(DraftStep::SearchEntered)?;

        self.trip_id = Some(trip_id);
        self.pickup_stop = pickup_stop;
        self.dropoff_stop = dropoff_stop;
        self.seats.clear();
        self.total_fare = None;
        self.step = DraftStep::TripSelected;
        Ok(())
    }

    /// Step 3: pick seats on the selected trip. Re-picking is allowed up to
    /// the moment of commit (a seat conflict forces the visitor back here).
    pub fn choose_seats(&mut self, seats: Vec<String>) -> Result<(), DraftError> {
        self.guard(DraftStep::TripSelected)?;

        if seats.is_empty() {
            return Err(DraftError::NoSeatsSelected);
        }

        self.seats = seats;
        self.total_fare = None;
        self.step = DraftStep::SeatsChosen;
        Ok(())
    }

    /// Step 4: attach the computed total. Requires a non-empty seat
    /// selection; on failure the step does not advance.
    pub fn price(&mut self, total: Fare) -> Result<(), DraftError> {
        self.guard(DraftStep::SeatsChosen)?;

        if self.seats.is_empty() {
            return Err(DraftError::NoSeatsSelected);
        }

        self.total_fare = Some(total);
        self.step = DraftStep::Priced;
        Ok(())
    }

    /// Terminal transition, taken once the ledger holds the reservation.
    pub fn mark_committed(&mut self) -> Result<(), DraftError> {
        if self.step != DraftStep::Priced {
            return Err(DraftError::OutOfOrder {
                required: self.resume_step(),
            });
        }
        self.step = DraftStep::Committed;
        Ok(())
    }

    /// Send the visitor back to seat selection after a commit-time conflict.
    pub fn rewind_to_seats(&mut self) {
        self.seats.clear();
        self.total_fare = None;
        self.step = DraftStep::TripSelected;
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No seats selected")]
    NoSeatsSelected,

    #[error("Wizard step out of order, resume at {required:?}")]
    OutOfOrder { required: DraftStep },

    #[error("Draft already committed")]
    AlreadyCommitted,
}
