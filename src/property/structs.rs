use super::PropertyDecoder;
use crate::{
    models::{
        ArrayStructInfo, Color, GpuBufferPixel, LinearColor, LuaProcessorState, LuaReference,
        LuaStruct, LuaStructData, NetworkTrace, Property, PropertyValue, StructData, StructType,
        StructValue, Vector2, Vector3, Vector4,
    },
    reader::SaveReader,
    SaveError, VariantContext,
};

/// Bytes between a struct's type name and its payload
const STRUCT_PREAMBLE: usize = 17;

/// Opaque trailer of a serialized GPU buffer
const GPU_BUFFER_TRAILER: usize = 45;

const LUA_VECTOR: &str = "/Script/CoreUObject.Vector";
const LUA_LINEAR_COLOR: &str = "/Script/CoreUObject.LinearColor";
const LUA_INVENTORY_STACK: &str = "/Script/FactoryGame.InventoryStack";
const LUA_ITEM_AMOUNT: &str = "/Script/FactoryGame.ItemAmount";
const LUA_TRACK_GRAPH: &str = "/Script/FicsItNetworks.FINTrackGraph";
const LUA_GPU_BUFFER: &str = "/Script/FicsItNetworks.FINGPUT1Buffer";

/// Lua structs that carry no payload
const LUA_EMPTY: [&str; 2] = [
    "/Script/FicsItNetworks.FINInternetCardHttpRequestFuture",
    "/Script/FactoryGame.InventoryItem",
];

impl<R: SaveReader> PropertyDecoder<'_, R> {
    /// The payload of a struct property, dispatched on its type name
    pub(crate) fn read_struct(&mut self, property: &str) -> Result<StructValue, SaveError> {
        let type_name = self.reader.read_string()?;
        self.reader.skip_bytes(STRUCT_PREAMBLE)?;

        let struct_type = StructType::from_name(&type_name);
        let data = match &struct_type {
            StructType::Color => StructData::Color(self.read_color()?),
            StructType::LinearColor => StructData::LinearColor(self.read_linear_color()?),
            StructType::Vector | StructType::Rotator => StructData::Vector(self.read_vector3()?),
            StructType::Vector2D => StructData::Vector2D(Vector2 {
                x: self.reader.read_f32()?,
                y: self.reader.read_f32()?,
            }),
            StructType::Quat | StructType::Vector4 => StructData::Vector4(Vector4 {
                a: self.reader.read_f32()?,
                b: self.reader.read_f32()?,
                c: self.reader.read_f32()?,
                d: self.reader.read_f32()?,
            }),
            StructType::Box => StructData::Box {
                min: self.read_vector3()?,
                max: self.read_vector3()?,
                is_valid: self.reader.read_u8()?,
            },
            StructType::RailroadTrackPosition => StructData::RailroadTrackPosition {
                track: self.read_object_reference()?,
                offset: self.reader.read_f32()?,
                forward: self.reader.read_f32()?,
            },
            StructType::TimerHandle => StructData::TimerHandle {
                handle: self.reader.read_string()?,
            },
            StructType::Guid => StructData::Guid {
                guid: self.reader.read_array()?,
            },
            StructType::InventoryItem => StructData::InventoryItem {
                unk1: self.reader.read_i32()?,
                item_name: self.reader.read_string()?,
                reference: self.read_object_reference()?,
                property: self.read_property(None)?.map(Box::new),
            },
            StructType::FluidBox => StructData::FluidBox {
                value: self.reader.read_f32()?,
            },
            StructType::SlateBrush => StructData::SlateBrush {
                unk1: self.reader.read_string()?,
            },
            StructType::DateTime => StructData::DateTime {
                date_time: self.reader.read_long()?,
            },
            StructType::FrameRange => StructData::FrameRange {
                begin: self.reader.read_long()?,
                end: self.reader.read_long()?,
            },
            StructType::NetworkTrace => StructData::NetworkTrace(self.read_network_trace()?),
            StructType::LuaProcessorStateStorage => {
                StructData::LuaProcessorState(self.read_lua_state(property)?)
            }
            StructType::GpuBufferPixel => StructData::GpuBufferPixel(self.read_gpu_pixel()?),
            StructType::Other(name) => {
                let properties = match self.read_struct_properties(name) {
                    Ok(x) => x,
                    Err(_) => {
                        return Err(self.unknown(VariantContext::StructType, name, property))
                    }
                };
                StructData::Properties(properties)
            }
        };

        Ok(StructValue { struct_type, data })
    }

    /// Property list of a struct without a named layout. An inventory item
    /// that ends without a property has already consumed the terminator of
    /// the enclosing list, so the list stops right after it.
    fn read_struct_properties(&mut self, struct_name: &str) -> Result<Vec<Property>, SaveError> {
        let mut out = Vec::new();
        while let Some(property) = self.read_property(Some(struct_name))? {
            let consumed_terminator = matches!(
                &property.value,
                PropertyValue::Struct(StructValue {
                    data: StructData::InventoryItem { property: None, .. },
                    ..
                })
            );

            out.push(property);
            if consumed_terminator {
                break;
            }
        }
        Ok(out)
    }

    /// The preamble written once ahead of every element of a struct array
    pub(crate) fn read_array_struct_info(&mut self) -> Result<ArrayStructInfo, SaveError> {
        let name = self.reader.read_string()?;
        let type_name = self.reader.read_string()?;

        // element size followed by a zero word
        self.reader.skip_bytes(8)?;

        let sub_type = StructType::from_name(&self.reader.read_string()?);
        let guid = [
            self.reader.read_i32()?,
            self.reader.read_i32()?,
            self.reader.read_i32()?,
            self.reader.read_i32()?,
        ];
        self.reader.skip_bytes(1)?;

        Ok(ArrayStructInfo {
            name,
            type_name,
            sub_type,
            guid,
        })
    }

    /// One element of a struct array. Elements use a denser layout than
    /// standalone structs for some types.
    pub(crate) fn read_struct_element(
        &mut self,
        sub_type: &StructType,
        property: &str,
    ) -> Result<StructData, SaveError> {
        let data = match sub_type {
            StructType::InventoryItem => StructData::InventoryItemElement {
                unk1: self.reader.read_i32()?,
                item_name: self.reader.read_string()?,
                level_name: self.reader.read_string()?,
                path_name: self.reader.read_string()?,
            },
            StructType::Guid => StructData::Guid {
                guid: self.reader.read_array()?,
            },
            StructType::NetworkTrace => StructData::NetworkTrace(self.read_network_trace()?),
            StructType::Vector => StructData::Vector(self.read_vector3()?),
            StructType::LinearColor => StructData::LinearColor(self.read_linear_color()?),
            StructType::GpuBufferPixel => StructData::GpuBufferPixel(self.read_gpu_pixel()?),
            other => StructData::Properties(self.read_fallback(
                None,
                VariantContext::StructType,
                other.name(),
                property,
            )?),
        };
        Ok(data)
    }

    pub(crate) fn read_vector3(&mut self) -> Result<Vector3, SaveError> {
        Ok(Vector3 {
            x: self.reader.read_f32()?,
            y: self.reader.read_f32()?,
            z: self.reader.read_f32()?,
        })
    }

    fn read_color(&mut self) -> Result<Color, SaveError> {
        Ok(Color {
            b: self.reader.read_u8()?,
            g: self.reader.read_u8()?,
            r: self.reader.read_u8()?,
            a: self.reader.read_u8()?,
        })
    }

    fn read_linear_color(&mut self) -> Result<LinearColor, SaveError> {
        Ok(LinearColor {
            r: self.reader.read_f32()?,
            g: self.reader.read_f32()?,
            b: self.reader.read_f32()?,
            a: self.reader.read_f32()?,
        })
    }

    /// A hop in a computer network, linked to the hop before it
    pub(crate) fn read_network_trace(&mut self) -> Result<NetworkTrace, SaveError> {
        let level_name = self.reader.read_string()?;
        let path_name = self.reader.read_string()?;

        let prev = if self.reader.read_i32()? == 1 {
            Some(Box::new(self.read_network_trace()?))
        } else {
            None
        };

        let step = if self.reader.read_i32()? == 1 {
            Some(self.reader.read_string()?)
        } else {
            None
        };

        Ok(NetworkTrace {
            level_name,
            path_name,
            prev,
            step,
        })
    }

    fn read_gpu_pixel(&mut self) -> Result<GpuBufferPixel, SaveError> {
        Ok(GpuBufferPixel {
            character: self.reader.read_array()?,
            foreground_color: self.read_linear_color()?,
            background_color: self.read_linear_color()?,
        })
    }

    fn read_lua_state(&mut self, property: &str) -> Result<LuaProcessorState, SaveError> {
        let trace_count = self.read_count()?;
        let mut trace = Vec::new();
        for _ in 0..trace_count {
            trace.push(self.read_network_trace()?);
        }

        let reference_count = self.read_count()?;
        let mut reference = Vec::new();
        for _ in 0..reference_count {
            reference.push(LuaReference {
                level_name: self.reader.read_string()?,
                path_name: self.reader.read_string()?,
            });
        }

        let thread = self.reader.read_string()?;
        let globals = self.reader.read_string()?;

        let struct_count = self.read_count()?;
        let mut structs = Vec::new();
        for _ in 0..struct_count {
            let unk1 = self.reader.read_i32()?;
            let struct_name = self.reader.read_string()?;
            let data = self.read_lua_struct(&struct_name, property)?;
            structs.push(LuaStruct {
                unk1,
                struct_name,
                data,
            });
        }

        Ok(LuaProcessorState {
            trace,
            reference,
            thread,
            globals,
            structs,
        })
    }

    fn read_lua_struct(&mut self, struct_name: &str, property: &str) -> Result<LuaStructData, SaveError> {
        let data = match struct_name {
            LUA_VECTOR => LuaStructData::Vector(self.read_vector3()?),
            LUA_LINEAR_COLOR => LuaStructData::LinearColor(self.read_linear_color()?),
            LUA_INVENTORY_STACK => LuaStructData::InventoryStack {
                unk3: self.reader.read_i32()?,
                unk4: self.reader.read_string()?,
                unk5: self.reader.read_i32()?,
                unk6: self.reader.read_i32()?,
                unk7: self.reader.read_i32()?,
            },
            LUA_ITEM_AMOUNT => LuaStructData::ItemAmount {
                unk3: self.reader.read_i32()?,
                unk4: self.reader.read_string()?,
                unk5: self.reader.read_i32()?,
            },
            LUA_TRACK_GRAPH => LuaStructData::TrackGraph {
                trace: self.read_network_trace()?,
                track_id: self.reader.read_i32()?,
            },
            LUA_GPU_BUFFER => {
                let x = self.reader.read_i32()?;
                let y = self.reader.read_i32()?;
                let size = self.reader.read_i32()?;
                let name = self.reader.read_string()?;
                let type_name = self.reader.read_string()?;
                let length = self.reader.read_i32()?;

                let mut buffer = Vec::new();
                for _ in 0..size.max(0) {
                    buffer.push(self.read_gpu_pixel()?);
                }

                LuaStructData::GpuBuffer {
                    x,
                    y,
                    size,
                    name,
                    type_name,
                    length,
                    buffer,
                    unk3: self.reader.read_raw(GPU_BUFFER_TRAILER)?,
                }
            }
            x if LUA_EMPTY.contains(&x) => LuaStructData::Empty,
            x => return Err(self.unknown(VariantContext::LuaStruct, x, property)),
        };
        Ok(data)
    }
}
