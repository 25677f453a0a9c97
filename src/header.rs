use crate::{
    models::SaveHeader,
    reader::{ByteCursor, SaveReader},
    SaveError, SaveErrorKind, VersionError,
};

/// Oldest save version whose body this crate can decode
pub const MIN_SAVE_VERSION: i32 = 21;

/// First save version that partitions records by level
pub const LEVELS_SAVE_VERSION: i32 = 29;

/// Highest header version that is still treated as a save header
pub const MAX_HEADER_VERSION: i32 = 99;

/// First header version to write the editor object version
const EDITOR_OBJECT_HEADER_VERSION: i32 = 7;

/// First header version to write mod metadata
const MOD_METADATA_HEADER_VERSION: i32 = 8;

/// Decode the header at the start of `data`.
///
/// Only structural problems are reported here; see [`check_version`] for
/// whether the body can be decoded.
pub fn read_header(data: &[u8]) -> Result<SaveHeader, SaveError> {
    let mut cursor = ByteCursor::new(data);
    read_header_from(&mut cursor)
}

pub(crate) fn read_header_from<R: SaveReader>(reader: &mut R) -> Result<SaveHeader, SaveError> {
    let start = reader.bytes_read();
    let header_version = reader.read_i32()?;
    if header_version > MAX_HEADER_VERSION {
        return Err(SaveErrorKind::from(VersionError::UnknownHeader { header_version }).into());
    }

    let save_version = reader.read_i32()?;
    let build_version = reader.read_i32()?;
    let map_name = reader.read_string()?;
    let map_options = reader.read_string()?;
    let session_name = reader.read_string()?;
    let play_duration_seconds = reader.read_i32()?;
    let save_date_time = reader.read_long()?;
    let session_visibility = reader.read_u8()?;

    let editor_object_version = if header_version >= EDITOR_OBJECT_HEADER_VERSION {
        Some(reader.read_i32()?)
    } else {
        None
    };

    let (mod_metadata, is_modded_save) = if header_version >= MOD_METADATA_HEADER_VERSION {
        (Some(reader.read_string()?), Some(reader.read_i32()?))
    } else {
        (None, None)
    };

    Ok(SaveHeader {
        header_version,
        save_version,
        build_version,
        map_name,
        map_options,
        session_name,
        play_duration_seconds,
        save_date_time,
        session_visibility,
        editor_object_version,
        mod_metadata,
        is_modded_save,
        header_size: reader.bytes_read() - start,
    })
}

/// Reject saves whose body layout predates what this crate understands
pub fn check_version(header: &SaveHeader) -> Result<(), SaveError> {
    if header.save_version < MIN_SAVE_VERSION {
        return Err(SaveErrorKind::from(VersionError::SaveTooOld {
            save_version: header.save_version,
        })
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ByteWriter;

    fn header_bytes(header_version: i32, save_version: i32) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.i32(header_version)
            .i32(save_version)
            .i32(152331)
            .string("Persistent_Level")
            .string("?startloc=Grass Fields?sessionName=Base?Visibility=SV_FriendsOnly")
            .string("Base")
            .i32(3600)
            .i32(0x1234)
            .i32(0x08d8)
            .u8(1);
        if header_version >= 7 {
            w.i32(40);
        }
        if header_version >= 8 {
            w.string("{\"Mods\":[]}").i32(1);
        }
        w.into_inner()
    }

    #[test]
    fn version_six_has_no_gated_fields() {
        let data = header_bytes(6, 25);
        let header = read_header(&data).unwrap();
        assert_eq!(header.header_version, 6);
        assert_eq!(header.save_version, 25);
        assert_eq!(header.session_name, "Base");
        assert_eq!(header.play_duration_seconds, 3600);
        assert_eq!(header.editor_object_version, None);
        assert_eq!(header.mod_metadata, None);
        assert_eq!(header.is_modded_save, None);
        assert_eq!(header.header_size, data.len() as u64);
        assert!(!header.has_levels());
    }

    #[test]
    fn version_seven_has_editor_object_version() {
        let data = header_bytes(7, 25);
        let header = read_header(&data).unwrap();
        assert_eq!(header.editor_object_version, Some(40));
        assert_eq!(header.mod_metadata, None);
        assert_eq!(header.header_size, data.len() as u64);
    }

    #[test]
    fn version_eight_has_mod_metadata() {
        let data = header_bytes(8, 30);
        let header = read_header(&data).unwrap();
        assert_eq!(header.editor_object_version, Some(40));
        assert_eq!(header.mod_metadata.as_deref(), Some("{\"Mods\":[]}"));
        assert_eq!(header.is_modded_save, Some(1));
        assert_eq!(header.save_date_time.as_i64(), (0x08d8 << 32) | 0x1234);
        assert_eq!(header.header_size, data.len() as u64);
        assert!(header.has_levels());
        check_version(&header).unwrap();
    }

    #[test]
    fn old_saves_are_rejected() {
        let data = header_bytes(6, 20);
        let header = read_header(&data).unwrap();
        let err = check_version(&header).unwrap_err();
        assert!(matches!(
            err.kind(),
            SaveErrorKind::UnsupportedVersion(VersionError::SaveTooOld { save_version: 20 })
        ));
    }

    #[test]
    fn unknown_header_versions_are_rejected() {
        let data = header_bytes(100, 30);
        let err = read_header(&data).unwrap_err();
        assert!(matches!(
            err.kind(),
            SaveErrorKind::UnsupportedVersion(VersionError::UnknownHeader {
                header_version: 100
            })
        ));
    }
}
