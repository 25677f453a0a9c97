use crate::deflate::InflationError;
use crate::events::AlertKey;
use std::fmt;

/// A save decoding error
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct SaveError(#[from] Box<SaveErrorKind>);

impl SaveError {
    pub(crate) fn new(kind: SaveErrorKind) -> SaveError {
        SaveError(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &SaveErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    pub fn into_kind(self) -> SaveErrorKind {
        *self.0
    }

    pub(crate) fn truncated(needed: usize, available: usize) -> SaveError {
        SaveError::new(SaveErrorKind::TruncatedStream { needed, available })
    }
}

impl From<SaveErrorKind> for SaveError {
    fn from(err: SaveErrorKind) -> Self {
        SaveError::new(err)
    }
}

impl From<InflationError> for SaveError {
    fn from(value: InflationError) -> Self {
        SaveError::from(SaveErrorKind::Decompression {
            msg: value.to_string(),
        })
    }
}

/// Specific type of error
#[derive(thiserror::Error, Debug)]
pub enum SaveErrorKind {
    #[error("save data ended early: needed {needed} bytes but only {available} remain")]
    TruncatedStream { needed: usize, available: usize },

    #[error("unable to inflate save chunk: {msg}")]
    Decompression { msg: String },

    #[error(transparent)]
    UnsupportedVersion(#[from] VersionError),

    #[error("unknown {context} `{tag}` in property `{property}` (offset {offset})")]
    UnknownVariant {
        context: VariantContext,
        tag: String,
        property: String,
        offset: u64,
    },

    #[error("unknown player identity provider: {provider}")]
    UnknownIdentityProvider { provider: u8 },

    #[error("record body {index} has no matching catalog entry")]
    MissingIdentity { index: usize },

    #[error("decoding was cancelled")]
    Cancelled,
}

impl SaveErrorKind {
    /// The user facing alert that precedes this error, if the error aborts
    /// the decode in a way the user should be told about
    pub fn alert(&self) -> Option<AlertKey> {
        match self {
            SaveErrorKind::TruncatedStream { .. } => Some(AlertKey::TruncatedSave),
            SaveErrorKind::Decompression { .. } => Some(AlertKey::InflateFailed),
            SaveErrorKind::UnsupportedVersion(VersionError::SaveTooOld { .. }) => {
                Some(AlertKey::SaveVersionTooOld)
            }
            SaveErrorKind::UnsupportedVersion(VersionError::UnknownHeader { .. }) => {
                Some(AlertKey::UnsupportedSaveFile)
            }
            SaveErrorKind::UnknownVariant { .. }
            | SaveErrorKind::UnknownIdentityProvider { .. }
            | SaveErrorKind::MissingIdentity { .. }
            | SaveErrorKind::Cancelled => None,
        }
    }
}

/// Header versions that this crate refuses to decode
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionError {
    #[error("save version {save_version} predates the oldest supported version")]
    SaveTooOld { save_version: i32 },

    #[error("unrecognized save header version {header_version}")]
    UnknownHeader { header_version: i32 },
}

/// The dispatch point where an unrecognized tag was encountered
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum VariantContext {
    PropertyType,
    ArrayElement,
    StructType,
    MapKey,
    MapValue,
    SetElement,
    TextHistory,
    FormatArgument,
    LuaStruct,
    RecordKind,
}

impl fmt::Display for VariantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantContext::PropertyType => "property type",
            VariantContext::ArrayElement => "array element type",
            VariantContext::StructType => "struct type",
            VariantContext::MapKey => "map key type",
            VariantContext::MapValue => "map value type",
            VariantContext::SetElement => "set element type",
            VariantContext::TextHistory => "text history type",
            VariantContext::FormatArgument => "format argument type",
            VariantContext::LuaStruct => "lua processor struct",
            VariantContext::RecordKind => "record kind",
        };
        f.write_str(name)
    }
}
