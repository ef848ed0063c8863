//! Writes transfer events to the output sink, one line each.

use crate::types::events::TransferEvent;
use std::io::{self, Stdout, Write};

/// Line-oriented event writer.
pub struct Emitter<W: Write> {
    out: W,
}

impl Emitter<Stdout> {
    /// Emitter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes one event and flushes so the line is visible immediately.
    ///
    /// # Errors
    ///
    /// Propagates the sink's I/O error.
    pub fn emit(&mut self, event: &TransferEvent) -> io::Result<()> {
        writeln!(self.out, "{event}")?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
