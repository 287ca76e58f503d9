use std::iter::FusedIterator;

use crate::compiler::RowFactory;
use crate::errors::GenerationError;
use crate::provider::{Row, ValueSource};

/// Finite, forward-only stream of generated rows.
///
/// Rows are produced one at a time on `next`; the first error ends the stream.
#[derive(Debug)]
pub struct RowStream<S> {
    factory: RowFactory<S>,
    remaining: u64,
    emitted: u64,
    failed: bool,
}

/// Stream exactly `num_rows` rows from `factory`.
pub fn stream<S: ValueSource>(factory: RowFactory<S>, num_rows: u64) -> RowStream<S> {
    RowStream {
        factory,
        remaining: num_rows,
        emitted: 0,
        failed: false,
    }
}

impl<S: ValueSource> RowStream<S> {
    pub fn header(&self) -> Vec<String> {
        self.factory.header()
    }

    pub fn rows_emitted(&self) -> u64 {
        self.emitted
    }
}

impl<S: ValueSource> Iterator for RowStream<S> {
    type Item = Result<Row, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match self.factory.next_row() {
            Ok(row) => {
                self.emitted += 1;
                Some(Ok(row))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        match usize::try_from(self.remaining) {
            Ok(remaining) => (0, Some(remaining)),
            Err(_) => (0, None),
        }
    }
}

impl<S: ValueSource> FusedIterator for RowStream<S> {}
