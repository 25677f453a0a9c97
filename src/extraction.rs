/*!
A save file is laid out as:

 - an uncompressed header
 - a sequence of zlib chunks, each behind a 48 byte chunk header

Once inflated, the chunks form one body stream. It opens with four bytes we
have no use for, then either a single section of records (older saves) or a
list of level sections followed by the persistent level. Every section is made
of a record header pass, a body pass and a list of collected items.

Decoding never holds the inflated body in memory: chunks are inflated as the
reader runs out of bytes, and finished records are handed to the sink in
batches.
*/

use crate::{
    catalog::{Catalog, PassOptions},
    chunk::{ChunkSource, ChunkStream, CompressedChunks},
    events::{CancelToken, DecodeEvent, EventSink},
    extension::ClassExtensionRegistry,
    header::{check_version, read_header},
    models::{ObjectReference, SaveHeader},
    property::PropertyDecoder,
    reader::SaveReader,
    SaveError,
};

/// Name given to the implicit last level of a level partitioned save
pub const PERSISTENT_LEVEL: &str = "Level Persistent_Level";

/// Bytes at the head of the inflated body that precede the records
const BODY_PADDING: usize = 4;

/// Finished records are handed off after this many
pub const DEFAULT_FLUSH_BATCH: usize = 5000;

/// Progress is reported after this many records
pub const DEFAULT_PROGRESS_STRIDE: usize = 2500;

/// What a successful decode went through. The records themselves were
/// handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Level names in decode order, empty for single section saves
    pub levels: Vec<String>,

    /// Record bodies decoded across all sections
    pub records: usize,

    /// Collected items reported
    pub collectables: usize,
}

/// Customize how a save is decoded
#[derive(Debug, Clone)]
pub struct SaveExtractorBuilder {
    flush_batch: usize,
    progress_stride: usize,
    separator: Option<char>,
    registry: ClassExtensionRegistry,
    cancel: Option<CancelToken>,
}

impl Default for SaveExtractorBuilder {
    fn default() -> Self {
        SaveExtractorBuilder::new()
    }
}

impl SaveExtractorBuilder {
    pub fn new() -> Self {
        SaveExtractorBuilder {
            flush_batch: DEFAULT_FLUSH_BATCH,
            progress_stride: DEFAULT_PROGRESS_STRIDE,
            separator: Some(','),
            registry: ClassExtensionRegistry::default(),
            cancel: None,
        }
    }

    /// Number of records decoded between hand-offs to the sink
    pub fn with_flush_batch(mut self, flush_batch: usize) -> Self {
        self.flush_batch = flush_batch.max(1);
        self
    }

    /// Number of records decoded between progress events
    pub fn with_progress_stride(mut self, progress_stride: usize) -> Self {
        self.progress_stride = progress_stride.max(1);
        self
    }

    /// Digit group separator of the counts in progress events
    pub fn with_thousands_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    /// Class specific layouts to decode after the property list
    pub fn with_registry(mut self, registry: ClassExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Checked between records; once cancelled the decode stops with
    /// [`SaveErrorKind::Cancelled`](crate::SaveErrorKind::Cancelled)
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self) -> SaveExtractor {
        SaveExtractor {
            flush_batch: self.flush_batch,
            progress_stride: self.progress_stride,
            separator: self.separator,
            registry: self.registry,
            cancel: self.cancel,
        }
    }
}

/// Decodes saves into a stream of events
#[derive(Debug, Clone)]
pub struct SaveExtractor {
    flush_batch: usize,
    progress_stride: usize,
    separator: Option<char>,
    registry: ClassExtensionRegistry,
    cancel: Option<CancelToken>,
}

impl Default for SaveExtractor {
    fn default() -> Self {
        SaveExtractor::builder().build()
    }
}

impl SaveExtractor {
    pub fn builder() -> SaveExtractorBuilder {
        SaveExtractorBuilder::new()
    }

    /// Parse only the uncompressed header
    pub fn extract_header(data: &[u8]) -> Result<SaveHeader, SaveError> {
        read_header(data)
    }

    /// Decode an entire save, reporting everything to `sink`.
    ///
    /// Fatal errors are reported to the sink as an alert before they are
    /// returned.
    pub fn decode<S: EventSink>(&self, data: &[u8], mut sink: S) -> Result<DecodeSummary, SaveError> {
        match self.decode_events(data, &mut sink) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::debug!(error = %e, "save decode failed");
                if let Some(alert) = e.kind().alert() {
                    sink.emit(DecodeEvent::Alert(alert));
                }
                Err(e)
            }
        }
    }

    fn decode_events(&self, data: &[u8], sink: &mut dyn EventSink) -> Result<DecodeSummary, SaveError> {
        let header = read_header(data)?;
        tracing::debug!(
            header_version = header.header_version,
            save_version = header.save_version,
            build_version = header.build_version,
            "decoded save header"
        );

        sink.emit(DecodeEvent::Header(header.clone()));
        check_version(&header)?;

        let body = data.get(header.header_size as usize..).unwrap_or_default();
        let mut stream = ChunkStream::new(CompressedChunks::new(body));
        stream.skip_bytes(BODY_PADDING)?;

        if let Some(first) = stream.source().first_header() {
            sink.emit(DecodeEvent::FileTag(first.file_tag));
            sink.emit(DecodeEvent::MaxChunkSize(first.max_chunk_size));
        }

        let mut decoder = PropertyDecoder::new(&mut stream, &header, sink);
        let summary = if header.has_levels() {
            self.read_levels(&mut decoder)?
        } else {
            self.read_single_section(&mut decoder)?
        };

        decoder.emit(DecodeEvent::Complete);
        Ok(summary)
    }

    fn pass_options(&self, report_progress: bool) -> PassOptions<'_> {
        PassOptions {
            registry: &self.registry,
            cancel: self.cancel.as_ref(),
            flush_batch: self.flush_batch,
            progress_stride: self.progress_stride,
            separator: self.separator,
            report_progress,
        }
    }

    fn read_single_section<R: SaveReader>(
        &self,
        decoder: &mut PropertyDecoder<'_, R>,
    ) -> Result<DecodeSummary, SaveError> {
        let options = self.pass_options(true);
        let mut catalog = Catalog::new();
        catalog.read_identities(decoder, &options)?;
        let records = catalog.read_bodies(decoder, &options)?;

        let collectables = read_collectables(decoder)?;
        let summary = DecodeSummary {
            levels: Vec::new(),
            records,
            collectables: collectables.len(),
        };

        decoder.emit(DecodeEvent::Collectables(collectables));
        Ok(summary)
    }

    fn read_levels<R: SaveReader>(
        &self,
        decoder: &mut PropertyDecoder<'_, R>,
    ) -> Result<DecodeSummary, SaveError> {
        let level_count = decoder.read_count()?;
        let mut levels = Vec::new();
        let mut collectables = Vec::new();
        let mut records = 0;

        for i in 0..=level_count {
            let level_name = if i == level_count {
                String::from(PERSISTENT_LEVEL)
            } else {
                decoder.reader().read_string()?
            };

            tracing::debug!(level = level_name.as_str(), "decoding level");
            let options = self.pass_options(level_name == PERSISTENT_LEVEL);
            let mut catalog = Catalog::new();

            // byte length of the header section
            decoder.reader().skip_bytes(4)?;
            catalog.read_identities(decoder, &options)?;
            collectables.extend(read_collectables(decoder)?);

            // byte length of the body section
            decoder.reader().skip_bytes(4)?;
            records += catalog.read_bodies(decoder, &options)?;

            // repeated after the bodies
            read_collectables(decoder)?;

            levels.push(level_name);
        }

        let summary = DecodeSummary {
            levels: levels.clone(),
            records,
            collectables: collectables.len(),
        };

        decoder.emit(DecodeEvent::Collectables(collectables));
        decoder.emit(DecodeEvent::Levels(levels));
        Ok(summary)
    }
}

fn read_collectables<R: SaveReader>(
    decoder: &mut PropertyDecoder<'_, R>,
) -> Result<Vec<ObjectReference>, SaveError> {
    let count = decoder.read_count()?;
    let mut out = Vec::new();
    for _ in 0..count {
        out.push(decoder.read_object_reference()?);
    }
    Ok(out)
}
