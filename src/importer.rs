use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::Result;
use crate::headers::HeaderIndex;
use crate::lookup::LookupProvider;
use crate::mapping::{build_mapping_model, FieldSelections, MappingModel, SessionInput};
use crate::materializer::Materializer;
use crate::models::{LayoutMode, TRANSACTION_SCHEMA};
use crate::reader::{open_path, ReaderOptions, RowStream};
use crate::resolver::{resolve_mapping, ResolvedMapping};
use crate::sink::{drain_into, ImportSink};

/// Everything needed to present the mapping choices for one source file.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    pub headers: HeaderIndex,
    pub model: MappingModel,
    pub defaults: FieldSelections,
}

impl SessionSetup {
    pub fn new<R: Read>(stream: &RowStream<R>, mode: LayoutMode) -> Self {
        let headers = stream.header().map(|h| HeaderIndex::from_row(h)).unwrap_or_default();
        let model = build_mapping_model(TRANSACTION_SCHEMA, mode);
        let defaults = model.defaults(&headers);
        debug!(
            skipped = stream.skipped(),
            headers = headers.len(),
            defaults = defaults.len(),
            %mode,
            "session prepared"
        );
        Self {
            headers,
            model,
            defaults,
        }
    }

    /// Merge the user's selections over the defaults and validate them.
    pub fn resolve<L: LookupProvider + ?Sized>(&self, input: SessionInput, lookups: &L) -> Result<ResolvedMapping> {
        let input = input.with_defaults(self.defaults.clone());
        resolve_mapping(&self.model, &input.field_selections, lookups)
    }
}

/// Read only the leading lines of `path` and build the mapping model.
pub fn inspect(path: &Path, options: &ReaderOptions, mode: LayoutMode) -> Result<SessionSetup> {
    let stream = open_path(path, options)?;
    Ok(SessionSetup::new(&stream, mode))
}

/// Resolve `input` against `path`, then stream every row through the
/// materializer into `sink`. Nothing past the leading lines is read unless
/// the mapping validates.
pub fn import_file<L, S>(
    path: &Path,
    options: &ReaderOptions,
    input: SessionInput,
    lookups: &L,
    sink: &mut S,
) -> Result<usize>
where
    L: LookupProvider + ?Sized,
    S: ImportSink + ?Sized,
{
    let stream = open_path(path, options)?;
    import_stream(stream, input, lookups, sink)
}

pub fn import_stream<R, L, S>(stream: RowStream<R>, input: SessionInput, lookups: &L, sink: &mut S) -> Result<usize>
where
    R: Read,
    L: LookupProvider + ?Sized,
    S: ImportSink + ?Sized,
{
    let setup = SessionSetup::new(&stream, input.layout_mode);
    let mapping = setup.resolve(input, lookups)?;
    let accepted = drain_into(Materializer::new(stream, &mapping), sink)?;
    info!("{accepted} records have been imported");
    Ok(accepted)
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
