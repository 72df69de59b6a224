use crate::application::engine::StandingSummary;
use crate::error::Result;
use std::io::Write;

/// Writes the final per-user standings as CSV.
pub struct StandingWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StandingWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_standings(&mut self, standings: Vec<StandingSummary>) -> Result<()> {
        for row in standings {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
