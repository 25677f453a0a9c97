use super::PropertyDecoder;
use crate::{
    models::{FormatArgument, FormatArgumentValue, FormatText, TextHistory, TextValue},
    reader::SaveReader,
    SaveError, VariantContext,
};

/// First build to write a culture invariant flag on texts without history
pub const TEXT_NONE_CULTURE_BUILD: i32 = 140822;

const HISTORY_BASE: u8 = 0;
const HISTORY_NAMED_FORMAT: u8 = 1;
const HISTORY_ARGUMENT_FORMAT: u8 = 3;
const HISTORY_TRANSFORM: u8 = 10;
const HISTORY_NONE: u8 = 255;

const ARGUMENT_TEXT: u8 = 4;

impl<R: SaveReader> PropertyDecoder<'_, R> {
    /// A localizable text, recursing into the texts it is derived from
    pub(crate) fn read_text(&mut self, property: &str) -> Result<TextValue, SaveError> {
        let flags = self.reader.read_i32()?;
        let history_type = self.reader.read_u8()?;

        let history = match history_type {
            HISTORY_BASE => TextHistory::Base {
                namespace: self.reader.read_string()?,
                key: self.reader.read_string()?,
                value: self.reader.read_string()?,
            },
            HISTORY_NAMED_FORMAT | HISTORY_ARGUMENT_FORMAT => {
                let source = Box::new(self.read_text(property)?);
                let count = self.read_count()?;
                let mut arguments = Vec::new();
                for _ in 0..count {
                    let name = self.reader.read_string()?;
                    let value = match self.reader.read_u8()? {
                        ARGUMENT_TEXT => FormatArgumentValue::Text(self.read_text(property)?),
                        x => {
                            return Err(self.unknown(
                                VariantContext::FormatArgument,
                                &x.to_string(),
                                property,
                            ))
                        }
                    };
                    arguments.push(FormatArgument { name, value });
                }

                let format = FormatText { source, arguments };
                if history_type == HISTORY_NAMED_FORMAT {
                    TextHistory::NamedFormat(format)
                } else {
                    TextHistory::ArgumentFormat(format)
                }
            }
            HISTORY_TRANSFORM => TextHistory::Transform {
                source: Box::new(self.read_text(property)?),
                transform_type: self.reader.read_u8()?,
            },
            HISTORY_NONE => {
                if self.header.build_version >= TEXT_NONE_CULTURE_BUILD {
                    let has_culture_invariant = self.reader.read_i32()?;
                    let value = if has_culture_invariant == 1 {
                        Some(self.reader.read_string()?)
                    } else {
                        None
                    };

                    TextHistory::None {
                        has_culture_invariant: Some(has_culture_invariant),
                        value,
                    }
                } else {
                    TextHistory::None {
                        has_culture_invariant: None,
                        value: None,
                    }
                }
            }
            x => {
                return Err(self.unknown(VariantContext::TextHistory, &x.to_string(), property))
            }
        };

        Ok(TextValue { flags, history })
    }
}
