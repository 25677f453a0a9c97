//! Decoding of the tagged property lists that make up the body of every
//! record.
//!
//! A property list is a sequence of `name, type tag, length, index, payload`
//! entries terminated by an entry named `None`. Payloads may themselves hold
//! property lists (structs, arrays of structs, map entries), so decoding is
//! recursive.

mod collections;
mod structs;
mod text;

pub use text::TEXT_NONE_CULTURE_BUILD;

use crate::{
    events::{DecodeEvent, Diagnostic, EventSink},
    models::{ByteKind, ByteValue, ObjectReference, Property, PropertyType, PropertyValue, SaveHeader},
    reader::SaveReader,
    SaveError, SaveErrorKind, VariantContext,
};

/// Name of the entry that terminates a property list
pub const NONE: &str = "None";

/// Recursive decoder for property lists and the values they reference.
///
/// Any tag the decoder does not recognize is reported to the sink as a
/// diagnostic before the error is returned.
pub struct PropertyDecoder<'a, R> {
    reader: &'a mut R,
    header: &'a SaveHeader,
    sink: &'a mut dyn EventSink,
}

impl<'a, R: SaveReader> PropertyDecoder<'a, R> {
    pub fn new(reader: &'a mut R, header: &'a SaveHeader, sink: &'a mut dyn EventSink) -> Self {
        PropertyDecoder {
            reader,
            header,
            sink,
        }
    }

    pub fn reader(&mut self) -> &mut R {
        self.reader
    }

    pub fn header(&self) -> &SaveHeader {
        self.header
    }

    pub(crate) fn emit(&mut self, event: DecodeEvent) {
        self.sink.emit(event)
    }

    /// Read properties until the terminating `None` entry, which is consumed
    /// but not returned. `parent` is the class or struct name that owns the
    /// list; a few layouts depend on it.
    pub fn read_properties(&mut self, parent: Option<&str>) -> Result<Vec<Property>, SaveError> {
        let mut out = Vec::new();
        while let Some(property) = self.read_property(parent)? {
            out.push(property);
        }
        Ok(out)
    }

    /// Read a single property, or `None` at the end of the list
    pub fn read_property(&mut self, parent: Option<&str>) -> Result<Option<Property>, SaveError> {
        let name = self.reader.read_string()?;
        if name == NONE {
            return Ok(None);
        }

        let tag = self.reader.read_string()?;

        // serialized length, only needed when writing
        self.reader.skip_bytes(4)?;

        let index = match self.reader.read_i32()? {
            0 => None,
            x => Some(x),
        };

        let Some(kind) = PropertyType::from_tag(&tag) else {
            return Err(self.unknown(VariantContext::PropertyType, &tag, &name));
        };

        let value = match kind {
            PropertyType::Bool => {
                let value = self.reader.read_u8()?;
                let extra = self.read_flagged_extension()?;
                PropertyValue::Bool { value, extra }
            }
            PropertyType::Int8 => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Int8(self.reader.read_i8()?)
            }
            PropertyType::Int | PropertyType::UInt32 => {
                let extra = self.read_flagged_extension()?;
                let value = self.reader.read_i32()?;
                PropertyValue::Int { value, extra }
            }
            PropertyType::Int64 | PropertyType::UInt64 => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Long(self.reader.read_long()?)
            }
            PropertyType::Float => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Float(self.reader.read_f32()?)
            }
            PropertyType::Double => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Double(self.reader.read_f64()?)
            }
            PropertyType::Str | PropertyType::Name => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Str(self.reader.read_string()?)
            }
            PropertyType::Object | PropertyType::Interface => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Object(self.read_object_reference()?)
            }
            PropertyType::Enum => {
                let enum_type = self.reader.read_string()?;
                self.reader.skip_bytes(1)?;
                let value = self.reader.read_string()?;
                PropertyValue::Enum { enum_type, value }
            }
            PropertyType::Byte => {
                let enum_name = self.reader.read_string()?;
                self.reader.skip_bytes(1)?;
                let value = if enum_name == NONE {
                    ByteKind::Raw(self.reader.read_u8()?)
                } else {
                    ByteKind::Named(self.reader.read_string()?)
                };
                PropertyValue::Byte(ByteValue { enum_name, value })
            }
            PropertyType::Text => {
                self.reader.skip_bytes(1)?;
                PropertyValue::Text(self.read_text(&name)?)
            }
            PropertyType::Array => PropertyValue::Array(self.read_array(&name)?),
            PropertyType::Map => PropertyValue::Map(self.read_map(&name, parent)?),
            PropertyType::Struct => PropertyValue::Struct(self.read_struct(&name)?),
            PropertyType::Set => PropertyValue::Set(self.read_set(&name, parent)?),
        };

        Ok(Some(Property {
            name,
            kind,
            index,
            value,
        }))
    }

    /// A level name followed by a path name
    pub fn read_object_reference(&mut self) -> Result<ObjectReference, SaveError> {
        let level_name = self.reader.read_string()?;
        let path_name = self.reader.read_string()?;
        Ok(ObjectReference::new(level_name, path_name))
    }

    /// A count word. Negative counts are treated as empty.
    pub(crate) fn read_count(&mut self) -> Result<usize, SaveError> {
        Ok(self.reader.read_i32()?.max(0) as usize)
    }

    /// A flag byte that, when set, is followed by 16 bytes we do not model
    fn read_flagged_extension(&mut self) -> Result<Option<Vec<u8>>, SaveError> {
        if self.reader.read_u8()? == 1 {
            Ok(Some(self.reader.read_raw(16)?))
        } else {
            Ok(None)
        }
    }

    /// Decode a nested property list in place of a layout we do not know.
    /// If the nested list does not decode either, the failure is attributed
    /// to the unknown layout.
    pub(crate) fn read_fallback(
        &mut self,
        parent: Option<&str>,
        context: VariantContext,
        tag: &str,
        property: &str,
    ) -> Result<Vec<Property>, SaveError> {
        self.read_properties(parent)
            .map_err(|_| self.unknown(context, tag, property))
    }

    /// Report an unrecognized tag and build the matching error
    pub(crate) fn unknown(&mut self, context: VariantContext, tag: &str, property: &str) -> SaveError {
        let offset = self.reader.bytes_read();
        tracing::warn!(%context, tag, property, offset, "unrecognized save variant");

        self.emit(DecodeEvent::Diagnostic(Diagnostic::UnknownVariant {
            context,
            tag: String::from(tag),
            property: String::from(property),
            offset,
        }));

        SaveError::from(SaveErrorKind::UnknownVariant {
            context,
            tag: String::from(tag),
            property: String::from(property),
            offset,
        })
    }
}
