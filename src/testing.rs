//! Little endian writer for building save fixtures in tests

use crate::{
    events::DecodeEvent,
    models::{Property, SaveHeader},
    property::PropertyDecoder,
    reader::{ByteCursor, LongValue, SaveReader},
    SaveError,
};

#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn u8(&mut self, x: u8) -> &mut Self {
        self.data.push(x);
        self
    }

    pub fn i8(&mut self, x: i8) -> &mut Self {
        self.data.push(x as u8);
        self
    }

    pub fn i32(&mut self, x: i32) -> &mut Self {
        self.data.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn f32(&mut self, x: f32) -> &mut Self {
        self.data.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn f64(&mut self, x: f64) -> &mut Self {
        self.data.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn raw(&mut self, x: &[u8]) -> &mut Self {
        self.data.extend_from_slice(x);
        self
    }

    /// Nul terminated, as the game writes them
    pub fn string(&mut self, x: &str) -> &mut Self {
        if x.is_empty() {
            return self.i32(0);
        }

        self.i32(x.len() as i32 + 1);
        self.data.extend_from_slice(x.as_bytes());
        self.data.push(0);
        self
    }

    pub fn object_ref(&mut self, level: &str, path: &str) -> &mut Self {
        self.string(level).string(path)
    }

    /// Name, type tag, serialized length and index of a property
    pub fn property(&mut self, name: &str, tag: &str) -> &mut Self {
        self.string(name).string(tag).i32(0).i32(0)
    }

    pub fn none(&mut self) -> &mut Self {
        self.string("None")
    }
}

/// A header for a save with the given save and build versions
pub(crate) fn header(save_version: i32, build_version: i32) -> SaveHeader {
    SaveHeader {
        header_version: 8,
        save_version,
        build_version,
        map_name: String::from("Persistent_Level"),
        map_options: String::new(),
        session_name: String::from("Test"),
        play_duration_seconds: 0,
        save_date_time: LongValue::Word(0),
        session_visibility: 0,
        editor_object_version: Some(40),
        mod_metadata: Some(String::new()),
        is_modded_save: Some(0),
        header_size: 0,
    }
}

/// Decode a property list from a recent save, returning the emitted events
/// and the number of bytes consumed
pub(crate) fn decode_properties(
    data: &[u8],
    parent: Option<&str>,
) -> (Result<Vec<Property>, SaveError>, Vec<DecodeEvent>, u64) {
    decode_properties_with(&header(42, 211839), data, parent)
}

pub(crate) fn decode_properties_with(
    header: &SaveHeader,
    data: &[u8],
    parent: Option<&str>,
) -> (Result<Vec<Property>, SaveError>, Vec<DecodeEvent>, u64) {
    let mut cursor = ByteCursor::new(data);
    let mut events = Vec::new();
    let result = PropertyDecoder::new(&mut cursor, header, &mut events).read_properties(parent);
    (result, events, cursor.bytes_read())
}
