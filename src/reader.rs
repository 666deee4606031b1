use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::Result;
use crate::models::SourceRow;

/// Options passed through to the delimited-text decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub skip_lines: usize,
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            skip_lines: 1,
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// A decoded row together with the physical line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedRow {
    pub line: u64,
    pub row: SourceRow,
}

/// Lazy, single-pass sequence of source rows with the leading lines already
/// consumed. A decode error ends the stream.
pub struct RowStream<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    header: Option<SourceRow>,
    skipped: usize,
    done: bool,
}

pub fn open_path(path: &Path, options: &ReaderOptions) -> Result<RowStream<BufReader<File>>> {
    let file = File::open(path)?;
    debug!(path = %path.display(), "opened source file");
    RowStream::new(BufReader::new(file), options)
}

impl<R: Read> RowStream<R> {
    /// Wrap `rdr` and discard the first `skip_lines` rows. The last discarded
    /// row is kept as the header.
    pub fn new(rdr: R, options: &ReaderOptions) -> Result<Self> {
        let mut records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(options.delimiter)
            .quote(options.quote)
            .from_reader(rdr)
            .into_records();

        let mut header = None;
        let mut skipped = 0;
        while skipped < options.skip_lines {
            match records.next() {
                Some(record) => {
                    header = Some(record?.iter().map(str::to_string).collect());
                    skipped += 1;
                }
                None => break,
            }
        }
        debug!(skipped, requested = options.skip_lines, "skipped leading lines");

        Ok(Self {
            records,
            header,
            skipped,
            done: false,
        })
    }

    /// The last line consumed while skipping, if any.
    pub fn header(&self) -> Option<&SourceRow> {
        self.header.as_ref()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = Result<NumberedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.records.next()? {
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                let row: SourceRow = record.iter().map(str::to_string).collect();
                trace!(line, columns = row.len(), "read row");
                Some(Ok(NumberedRow { line, row }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
