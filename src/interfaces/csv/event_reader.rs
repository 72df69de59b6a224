use crate::error::{LibraryError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum EventOp {
    Register,
    Approve,
    Unblock,
    AddBook,
    Order,
    Return,
    Sweep,
}

/// One dated row of a lending replay.
///
/// Columns: `op, date, user, book, title, name, email, amount` — unused
/// columns are left empty per row. The replay pins the engine clock to
/// `date` before applying the row.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LendingEvent {
    pub op: EventOp,
    pub date: NaiveDate,
    pub user: Option<u32>,
    pub book: Option<u32>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub amount: Option<Decimal>,
}

impl LendingEvent {
    /// Midnight UTC on the event's date.
    pub fn instant(&self) -> DateTime<Utc> {
        self.date.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Reads lending events from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<LendingEvent>`,
/// handling whitespace trimming and flexible record lengths automatically.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events, so
    /// large replays stream without loading the whole file.
    pub fn events(self) -> impl Iterator<Item = Result<LendingEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LibraryError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, date, user, book, title, name, email, amount\n\
                    register, 2024-01-01, , , , Alice Doe, alice@example.com, \n\
                    order, 2024-01-02, 1, 1, , , , \n\
                    return, 2024-01-20, 1, 1, , , , 350";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<Result<LendingEvent>> = reader.events().collect();

        assert_eq!(events.len(), 3);

        let register = events[0].as_ref().unwrap();
        assert_eq!(register.op, EventOp::Register);
        assert_eq!(register.name.as_deref(), Some("Alice Doe"));
        assert_eq!(register.user, None);

        let order = events[1].as_ref().unwrap();
        assert_eq!(order.op, EventOp::Order);
        assert_eq!(order.user, Some(1));
        assert_eq!(order.book, Some(1));

        let ret = events[2].as_ref().unwrap();
        assert_eq!(ret.amount, Some(dec!(350)));
    }

    #[test]
    fn test_reader_malformed_op() {
        let data = "op, date, user, book, title, name, email, amount\n\
                    renew, 2024-01-01, 1, 1, , , , ";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<Result<LendingEvent>> = reader.events().collect();

        assert!(events[0].is_err());
    }

    #[test]
    fn test_event_instant_is_midnight_utc() {
        let data = "op, date, user, book, title, name, email, amount\n\
                    sweep, 2024-01-11, , , , , , ";
        let reader = EventReader::new(data.as_bytes());
        let event = reader.events().next().unwrap().unwrap();
        assert_eq!(event.instant().to_rfc3339(), "2024-01-11T00:00:00+00:00");
    }
}
