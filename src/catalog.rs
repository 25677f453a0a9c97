//! The two passes over a section of records.
//!
//! The identity pass reads every record header so that bodies can be
//! matched up by position. The body pass then decodes each body in the same
//! order and hands finished records to the sink in batches.

use crate::{
    events::{CancelToken, CrossReference, DecodeEvent, Diagnostic, Progress, ProgressKey},
    extension::{self, ClassExtensionRegistry, GAME_STATE_CLASS},
    models::{Record, RecordKind, Transform},
    property::PropertyDecoder,
    reader::SaveReader,
    SaveError, SaveErrorKind, VariantContext,
};
use std::collections::HashMap;

/// Trailing bytes that a record body may leave unread without them being
/// kept as residual data
pub const TRAILING_SLACK: i64 = 4;

/// Knobs shared by both passes
#[derive(Debug, Clone, Copy)]
pub(crate) struct PassOptions<'a> {
    pub registry: &'a ClassExtensionRegistry,
    pub cancel: Option<&'a CancelToken>,
    pub flush_batch: usize,
    pub progress_stride: usize,
    pub separator: Option<char>,

    /// Only one section of a save reports progress
    pub report_progress: bool,
}

impl PassOptions<'_> {
    fn check_cancelled(&self) -> Result<(), SaveError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(SaveErrorKind::Cancelled.into()),
            _ => Ok(()),
        }
    }

    /// The start of a pass is reported separately, before its first record
    fn is_progress_tick(&self, i: usize) -> bool {
        self.report_progress && i > 0 && i % self.progress_stride.max(1) == 0
    }

    fn report_start<R: SaveReader>(
        &self,
        decoder: &mut PropertyDecoder<'_, R>,
        key: ProgressKey,
        count: usize,
    ) {
        if self.report_progress {
            decoder.emit(DecodeEvent::Progress(Progress::new(key, 0, count, self.separator)));
        }
    }
}

/// Records of a single section, in the order their headers were read.
///
/// Records are owned by slot; the path index only points into the slots.
/// Once a body has been decoded the record leaves the catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    slots: Vec<Option<Record>>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of record headers read
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A record whose body has not been decoded yet
    pub fn get(&self, path_name: &str) -> Option<&Record> {
        let slot = *self.index.get(path_name)?;
        self.slots.get(slot)?.as_ref()
    }

    fn insert(&mut self, record: Record) {
        let slot = self.slots.len();
        if let Some(previous) = self.index.insert(record.path_name.clone(), slot) {
            tracing::warn!(
                path_name = record.path_name.as_str(),
                previous,
                slot,
                "duplicate path name, later record wins"
            );
        }
        self.slots.push(Some(record));
    }

    fn take(&mut self, slot: usize) -> Option<Record> {
        self.slots.get_mut(slot)?.take()
    }

    /// Read a count followed by that many record headers
    pub(crate) fn read_identities<R: SaveReader>(
        &mut self,
        decoder: &mut PropertyDecoder<'_, R>,
        options: &PassOptions<'_>,
    ) -> Result<(), SaveError> {
        let count = decoder.read_count()?;
        tracing::debug!(count, "reading record headers");
        options.report_start(decoder, ProgressKey::Objects, count);

        for i in 0..count {
            options.check_cancelled()?;

            let word = decoder.reader().read_i32()?;
            let Some(kind) = RecordKind::from_word(word) else {
                return Err(decoder.unknown(VariantContext::RecordKind, &word.to_string(), ""));
            };

            let record = match kind {
                RecordKind::Object => read_object_header(decoder)?,
                RecordKind::Actor => {
                    let record = read_actor_header(decoder)?;
                    if record.class_name == GAME_STATE_CLASS {
                        decoder.emit(DecodeEvent::CrossReference(CrossReference::GameState(
                            record.path_name.clone(),
                        )));
                    }
                    record
                }
            };

            self.insert(record);

            if options.is_progress_tick(i) {
                decoder.emit(DecodeEvent::Progress(Progress::new(
                    ProgressKey::Objects,
                    i,
                    count,
                    options.separator,
                )));
            }
        }

        Ok(())
    }

    /// Read a count followed by that many record bodies, flushing finished
    /// records to the sink every `flush_batch` records and once at the end.
    /// Returns the number of bodies decoded.
    pub(crate) fn read_bodies<R: SaveReader>(
        &mut self,
        decoder: &mut PropertyDecoder<'_, R>,
        options: &PassOptions<'_>,
    ) -> Result<usize, SaveError> {
        let count = decoder.read_count()?;
        tracing::debug!(count, headers = self.len(), "reading record bodies");
        options.report_start(decoder, ProgressKey::Entities, count);

        let mut batch = HashMap::new();
        for i in 0..count {
            options.check_cancelled()?;

            let mut record = self
                .take(i)
                .ok_or_else(|| SaveError::from(SaveErrorKind::MissingIdentity { index: i }))?;

            read_body(decoder, &mut record, options.registry)?;
            batch.insert(record.path_name.clone(), record);

            if i % options.flush_batch.max(1) == 0 {
                decoder.emit(DecodeEvent::Records(std::mem::take(&mut batch)));
            }

            if options.is_progress_tick(i) {
                decoder.emit(DecodeEvent::Progress(Progress::new(
                    ProgressKey::Entities,
                    i,
                    count,
                    options.separator,
                )));
            }
        }

        if !batch.is_empty() {
            decoder.emit(DecodeEvent::Records(batch));
        }

        Ok(count)
    }
}

fn read_object_header<R: SaveReader>(decoder: &mut PropertyDecoder<'_, R>) -> Result<Record, SaveError> {
    let class_name = decoder.reader().read_string()?;
    let reference = decoder.read_object_reference()?;
    let mut record = Record::new(RecordKind::Object, class_name, reference);
    record.outer_path_name = Some(decoder.reader().read_string()?);
    Ok(record)
}

fn read_actor_header<R: SaveReader>(decoder: &mut PropertyDecoder<'_, R>) -> Result<Record, SaveError> {
    let class_name = decoder.reader().read_string()?;
    let reference = decoder.read_object_reference()?;
    let mut record = Record::new(RecordKind::Actor, class_name, reference);

    let reader = decoder.reader();
    record.needs_transform = non_zero(reader.read_i32()?);

    let mut transform = Transform {
        rotation: [
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
            reader.read_f32()?,
        ],
        translation: [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?],
        scale3d: None,
    };

    let scale3d = [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?];
    if scale3d != [1.0, 1.0, 1.0] {
        transform.scale3d = Some(scale3d);
    }

    if transform.sanitize() {
        tracing::warn!(
            path_name = record.path_name.as_str(),
            "actor translation out of bounds, moved to fallback position"
        );
    }

    record.transform = Some(transform);
    record.was_placed_in_level = non_zero(reader.read_i32()?);
    Ok(record)
}

fn non_zero(x: i32) -> Option<i32> {
    if x == 0 {
        None
    } else {
        Some(x)
    }
}

/// Decode the body of `record`: its declared length, the actor's entity
/// header, the property list, class specific data and any residual bytes
pub(crate) fn read_body<R: SaveReader>(
    decoder: &mut PropertyDecoder<'_, R>,
    record: &mut Record,
    registry: &ClassExtensionRegistry,
) -> Result<(), SaveError> {
    let length = decoder.reader().read_i32()?;
    let start = decoder.reader().bytes_read();
    let end = start + u64::from(length.max(0) as u32);

    if record.is_actor() {
        record.entity = Some(decoder.read_object_reference()?);
        let count = decoder.read_count()?;
        if count > 0 {
            let mut children = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                children.push(decoder.read_object_reference()?);
            }
            record.children = Some(children);
        }
    }

    if decoder.reader().bytes_read() == end {
        record.should_be_nulled = true;
        return Ok(());
    }

    let properties = decoder.read_properties(Some(&record.class_name))?;
    record.properties = properties;

    if let Some(kind) = registry.lookup(&record.class_name) {
        extension::read_extension(kind, decoder, record, end)?;
    }

    reconcile(decoder, record, end)
}

/// Account for the difference between the declared and consumed body length
fn reconcile<R: SaveReader>(
    decoder: &mut PropertyDecoder<'_, R>,
    record: &mut Record,
    end: u64,
) -> Result<(), SaveError> {
    let remaining = extension::remaining(decoder, end);
    if remaining > TRAILING_SLACK && record.missing.is_none() {
        tracing::warn!(
            path_name = record.path_name.as_str(),
            class_name = record.class_name.as_str(),
            remaining,
            "keeping undecoded trailing bytes"
        );
        record.missing = Some(decoder.reader().read_raw(remaining as usize)?);
    } else if remaining > 0 {
        decoder.reader().skip_bytes(remaining as usize)?;
    } else if remaining < 0 {
        let overrun = remaining.unsigned_abs();
        tracing::warn!(
            path_name = record.path_name.as_str(),
            class_name = record.class_name.as_str(),
            overrun,
            "record body read past its declared length"
        );
        decoder.emit(DecodeEvent::Diagnostic(Diagnostic::RecordOverrun {
            path_name: record.path_name.clone(),
            class_name: record.class_name.clone(),
            overrun,
        }));
    }

    Ok(())
}
