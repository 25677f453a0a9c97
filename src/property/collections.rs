use super::PropertyDecoder;
use crate::{
    header::LEVELS_SAVE_VERSION,
    models::{
        ArrayValue, ArrayValues, MapEntry, MapEntryValue, MapKey, MapMode, MapValue, PropertyType,
        SetValue, SetValues,
    },
    reader::SaveReader,
    SaveError, VariantContext,
};

/// Byte array holding the map's fog of war as four byte texels of which
/// only the third byte is kept
const FOG_OF_WAR: &str = "mFogOfWarRawData";

/// Owner of maps whose struct values are three conveyor indices
const BALANCER_DATA: &str = "LBBalancerData";

/// Owner of sets whose struct elements are foliage locations
const FOLIAGE_REMOVAL: &str = "/Script/FactoryGame.FGFoliageRemoval";

/// Map mode words that announce a longer preamble
const MAP_MODE_NAMED: i32 = 2;
const MAP_MODE_EXTENDED: i32 = 3;

impl<R: SaveReader> PropertyDecoder<'_, R> {
    pub(crate) fn read_array(&mut self, property: &str) -> Result<ArrayValue, SaveError> {
        let element_tag = self.reader.read_string()?;
        self.reader.skip_bytes(1)?;
        let count = self.read_count()?;

        let Some(element_type) = PropertyType::from_tag(&element_tag) else {
            return Err(self.unknown(VariantContext::ArrayElement, &element_tag, property));
        };

        let mut structure = None;
        let values = match element_type {
            PropertyType::Byte if property == FOG_OF_WAR => {
                let mut out = Vec::new();
                // a partial trailing texel is still read whole
                for _ in 0..count.div_ceil(4) {
                    self.reader.skip_bytes(2)?;
                    out.push(self.reader.read_u8()?);
                    self.reader.skip_bytes(1)?;
                }
                ArrayValues::Byte(out)
            }

            // One byte per element, booleans included
            PropertyType::Byte | PropertyType::Bool => ArrayValues::Byte(self.reader.read_raw(count)?),
            PropertyType::Int => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_i32()?);
                }
                ArrayValues::Int(out)
            }
            PropertyType::Int64 => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_long()?);
                }
                ArrayValues::Long(out)
            }
            PropertyType::Float => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_f32()?);
                }
                ArrayValues::Float(out)
            }
            PropertyType::Double => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_f64()?);
                }
                ArrayValues::Double(out)
            }
            PropertyType::Str | PropertyType::Name | PropertyType::Enum => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_string()?);
                }
                ArrayValues::Str(out)
            }
            PropertyType::Text => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_text(property)?);
                }
                ArrayValues::Text(out)
            }
            PropertyType::Object | PropertyType::Interface => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_object_reference()?);
                }
                ArrayValues::Object(out)
            }
            PropertyType::Struct => {
                let info = self.read_array_struct_info()?;
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_struct_element(&info.sub_type, property)?);
                }
                structure = Some(info);
                ArrayValues::Struct(out)
            }
            _ => return Err(self.unknown(VariantContext::ArrayElement, &element_tag, property)),
        };

        Ok(ArrayValue {
            element_type,
            structure,
            values,
        })
    }

    pub(crate) fn read_map(&mut self, property: &str, parent: Option<&str>) -> Result<MapValue, SaveError> {
        let key_tag = self.reader.read_string()?;
        let value_tag = self.reader.read_string()?;
        self.reader.skip_bytes(1)?;

        let mode = match self.reader.read_i32()? {
            MAP_MODE_NAMED => MapMode::Named {
                unk2: self.reader.read_string()?,
                unk3: self.reader.read_string()?,
            },
            MAP_MODE_EXTENDED => MapMode::Extended {
                unk1: self.reader.read_array()?,
                unk2: self.reader.read_string()?,
                unk3: self.reader.read_string()?,
            },
            x => MapMode::Plain(x),
        };

        let count = self.read_count()?;

        let Some(key_type) = PropertyType::from_tag(&key_tag) else {
            return Err(self.unknown(VariantContext::MapKey, &key_tag, property));
        };

        let Some(value_type) = PropertyType::from_tag(&value_tag) else {
            return Err(self.unknown(VariantContext::MapValue, &value_tag, property));
        };

        let mut entries = Vec::new();
        for _ in 0..count {
            let key = match key_type {
                PropertyType::Int => MapKey::Int(self.reader.read_i32()?),
                PropertyType::Int64 => MapKey::Long(self.reader.read_long()?),
                PropertyType::Name | PropertyType::Str => MapKey::Str(self.reader.read_string()?),
                PropertyType::Object => MapKey::Object(self.read_object_reference()?),
                PropertyType::Enum => MapKey::Enum {
                    name: self.reader.read_string()?,
                },
                PropertyType::Struct => MapKey::Struct(self.read_properties(None)?),
                _ => return Err(self.unknown(VariantContext::MapKey, &key_tag, property)),
            };

            let value = match value_type {
                PropertyType::Byte if key_type == PropertyType::Str => {
                    MapEntryValue::Str(self.reader.read_string()?)
                }
                PropertyType::Byte | PropertyType::Bool => MapEntryValue::Byte(self.reader.read_u8()?),
                PropertyType::Int => MapEntryValue::Int(self.reader.read_i32()?),
                PropertyType::Int64 => MapEntryValue::Long(self.reader.read_long()?),
                PropertyType::Float => MapEntryValue::Float(self.reader.read_f32()?),
                PropertyType::Double => MapEntryValue::Double(self.reader.read_f64()?),
                PropertyType::Str | PropertyType::Name => MapEntryValue::Str(self.reader.read_string()?),
                PropertyType::Object => MapEntryValue::Object(self.read_object_reference()?),
                PropertyType::Struct if parent == Some(BALANCER_DATA) => MapEntryValue::Balancer {
                    normal_index: self.reader.read_i32()?,
                    overflow_index: self.reader.read_i32()?,
                    filter_index: self.reader.read_i32()?,
                },
                PropertyType::Struct => MapEntryValue::Struct(self.read_properties(None)?),
                _ => return Err(self.unknown(VariantContext::MapValue, &value_tag, property)),
            };

            entries.push(MapEntry { key, value });
        }

        Ok(MapValue {
            key_type,
            value_type,
            mode,
            entries,
        })
    }

    pub(crate) fn read_set(&mut self, property: &str, parent: Option<&str>) -> Result<SetValue, SaveError> {
        let element_tag = self.reader.read_string()?;
        self.reader.skip_bytes(5)?;
        let count = self.read_count()?;

        let Some(element_type) = PropertyType::from_tag(&element_tag) else {
            return Err(self.unknown(VariantContext::SetElement, &element_tag, property));
        };

        let values = match element_type {
            PropertyType::Object => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_object_reference()?);
                }
                SetValues::Object(out)
            }
            PropertyType::Struct
                if self.header.save_version >= LEVELS_SAVE_VERSION
                    && parent == Some(FOLIAGE_REMOVAL) =>
            {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_vector3()?);
                }
                SetValues::Vector(out)
            }
            PropertyType::Struct => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.read_network_trace()?);
                }
                SetValues::NetworkTrace(out)
            }
            PropertyType::Name => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_string()?);
                }
                SetValues::Name(out)
            }
            PropertyType::Int => {
                let mut out = Vec::new();
                for _ in 0..count {
                    out.push(self.reader.read_i32()?);
                }
                SetValues::Int(out)
            }
            _ => return Err(self.unknown(VariantContext::SetElement, &element_tag, property)),
        };

        Ok(SetValue {
            element_type,
            values,
        })
    }
}
