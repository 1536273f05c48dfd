/// In-memory catalog of the instrument master
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::types::{FieldValue, Instrument, InstrumentMatch};

/// Snapshot of the instrument dump, in file row order.
///
/// Row order is the tie-break order for chain queries, so the catalog is
/// never reordered or mutated; a reload builds a fresh snapshot and callers
/// swap the whole value.
pub struct InstrumentCatalog {
    instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    /// Parse the raw dump text.
    ///
    /// Double quotes are stripped up front (values carry no literal commas
    /// or quotes after that), the first line names the columns, and every
    /// following line maps positionally onto those names. Short rows leave
    /// trailing fields absent; blank trailing lines become degenerate
    /// records rather than errors.
    pub fn parse(text: &str) -> Self {
        let stripped = text.replace('"', "");
        let mut lines = stripped.split('\n');

        let headers: Vec<String> = match lines.next() {
            Some(header_line) => header_line
                .trim()
                .split(',')
                .map(|h| h.trim().to_string())
                .collect(),
            None => Vec::new(),
        };

        let mut instruments = Vec::new();
        for line in lines {
            let fields: Vec<&str> = line.trim().split(',').collect();
            let mut instrument = Instrument::default();
            for (i, header) in headers.iter().enumerate() {
                if let Some(raw) = fields.get(i) {
                    instrument.set_field(header, raw);
                }
            }
            instruments.push(instrument);
        }

        InstrumentCatalog { instruments }
    }

    /// Read and parse the dump from disk.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::parse(&text);
        info!(rows = catalog.len(), "Instrument catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Exact-match lookup over the catalog.
    ///
    /// A row matches when every criterion with a non-empty value equals the
    /// row's coerced field value; empty-valued criteria are wildcards. Zero
    /// matches is `None`; a single match keeps its single-record shape;
    /// multiple matches come back in file order.
    pub fn find(&self, criteria: &[(&str, FieldValue)]) -> Option<InstrumentMatch> {
        let active: Vec<&(&str, FieldValue)> =
            criteria.iter().filter(|(_, v)| !v.is_empty()).collect();

        let mut matches: Vec<&Instrument> = self
            .instruments
            .iter()
            .filter(|inst| {
                active
                    .iter()
                    .all(|(key, want)| inst.field(key).map_or(false, |have| have == *want))
            })
            .collect();

        match matches.len() {
            0 => None,
            1 => Some(InstrumentMatch::One(matches.remove(0).clone())),
            _ => Some(InstrumentMatch::Many(
                matches.into_iter().cloned().collect(),
            )),
        }
    }
}
