//! Record store contract consumed by the report facade.

use chrono::NaiveDateTime;

use crate::event::AttendanceEvent;
use crate::holder::CardHolder;
use crate::types::CardId;

/// Read access to the event log and the holder registry.
///
/// The facade only ever reads through this trait; it never writes.
pub trait RecordStore {
    /// Error raised when the store cannot be read.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Events of `card_id` with `start <= timestamp <= end`, ordered by
    /// timestamp then insertion id. An empty range yields an empty vector.
    fn fetch(
        &self,
        card_id: &CardId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceEvent>, Self::Error>;

    /// Looks up one holder.
    fn get_holder(&self, card_id: &CardId) -> Result<Option<CardHolder>, Self::Error>;

    /// Every registered holder, in report order.
    fn list_holders(&self) -> Result<Vec<CardHolder>, Self::Error>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    type Error = T::Error;

    fn fetch(
        &self,
        card_id: &CardId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceEvent>, Self::Error> {
        (**self).fetch(card_id, start, end)
    }

    fn get_holder(&self, card_id: &CardId) -> Result<Option<CardHolder>, Self::Error> {
        (**self).get_holder(card_id)
    }

    fn list_holders(&self) -> Result<Vec<CardHolder>, Self::Error> {
        (**self).list_holders()
    }
}
