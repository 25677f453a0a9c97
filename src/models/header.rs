use crate::reader::LongValue;
use serde::Serialize;

/// The uncompressed header at the start of every save
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHeader {
    pub header_version: i32,
    pub save_version: i32,
    pub build_version: i32,
    pub map_name: String,
    pub map_options: String,
    pub session_name: String,
    pub play_duration_seconds: i32,
    pub save_date_time: LongValue,
    pub session_visibility: u8,

    /// Only written from header version 7
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_object_version: Option<i32>,

    /// Only written from header version 8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_metadata: Option<String>,

    /// Only written from header version 8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_modded_save: Option<i32>,

    /// Byte length of the header
    pub header_size: u64,
}

impl SaveHeader {
    /// Saves from this version on split their records per level
    pub fn has_levels(&self) -> bool {
        self.save_version >= crate::header::LEVELS_SAVE_VERSION
    }
}
