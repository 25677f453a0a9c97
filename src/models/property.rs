use crate::reader::LongValue;
use serde::{Serialize, Serializer};

/// A pointer to another record by path name. Never owns the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Absent when the reference points into the default level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    pub path_name: String,
}

impl ObjectReference {
    /// The level that references omit
    pub const DEFAULT_LEVEL: &'static str = "Persistent_Level";

    pub fn new(level_name: String, path_name: String) -> Self {
        let level_name = if level_name == Self::DEFAULT_LEVEL {
            None
        } else {
            Some(level_name)
        };

        ObjectReference {
            level_name,
            path_name,
        }
    }
}

/// The type tag of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Bool,
    Int8,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Str,
    Name,
    Object,
    Interface,
    Enum,
    Byte,
    Text,
    Array,
    Map,
    Struct,
    Set,
}

impl PropertyType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "BoolProperty" => PropertyType::Bool,
            "Int8Property" => PropertyType::Int8,
            "IntProperty" => PropertyType::Int,
            "UInt32Property" => PropertyType::UInt32,
            "Int64Property" => PropertyType::Int64,
            "UInt64Property" => PropertyType::UInt64,
            "FloatProperty" => PropertyType::Float,
            "DoubleProperty" => PropertyType::Double,
            "StrProperty" => PropertyType::Str,
            "NameProperty" => PropertyType::Name,
            "ObjectProperty" => PropertyType::Object,
            "InterfaceProperty" => PropertyType::Interface,
            "EnumProperty" => PropertyType::Enum,
            "ByteProperty" => PropertyType::Byte,
            "TextProperty" => PropertyType::Text,
            "ArrayProperty" => PropertyType::Array,
            "MapProperty" => PropertyType::Map,
            "StructProperty" => PropertyType::Struct,
            "SetProperty" => PropertyType::Set,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PropertyType::Bool => "BoolProperty",
            PropertyType::Int8 => "Int8Property",
            PropertyType::Int => "IntProperty",
            PropertyType::UInt32 => "UInt32Property",
            PropertyType::Int64 => "Int64Property",
            PropertyType::UInt64 => "UInt64Property",
            PropertyType::Float => "FloatProperty",
            PropertyType::Double => "DoubleProperty",
            PropertyType::Str => "StrProperty",
            PropertyType::Name => "NameProperty",
            PropertyType::Object => "ObjectProperty",
            PropertyType::Interface => "InterfaceProperty",
            PropertyType::Enum => "EnumProperty",
            PropertyType::Byte => "ByteProperty",
            PropertyType::Text => "TextProperty",
            PropertyType::Array => "ArrayProperty",
            PropertyType::Map => "MapProperty",
            PropertyType::Struct => "StructProperty",
            PropertyType::Set => "SetProperty",
        }
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// One named, typed field of a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool {
        value: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        extra: Option<Vec<u8>>,
    },
    Int8(i8),
    Int {
        value: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        extra: Option<Vec<u8>>,
    },
    Long(LongValue),
    Float(f32),
    Double(f64),
    Str(String),
    Object(ObjectReference),
    Enum {
        #[serde(rename = "name")]
        enum_type: String,
        value: String,
    },
    Byte(ByteValue),
    Text(TextValue),
    Array(ArrayValue),
    Map(MapValue),
    Struct(StructValue),
    Set(SetValue),
}

/// A byte property is either a raw byte or a member of a named enum
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteValue {
    pub enum_name: String,
    pub value: ByteKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ByteKind {
    Raw(u8),
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextValue {
    pub flags: i32,
    pub history: TextHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "historyType", rename_all = "camelCase")]
pub enum TextHistory {
    Base {
        namespace: String,
        key: String,
        value: String,
    },
    NamedFormat(FormatText),
    ArgumentFormat(FormatText),
    Transform {
        source: Box<TextValue>,
        #[serde(rename = "transformType")]
        transform_type: u8,
    },
    None {
        #[serde(rename = "hasCultureInvariantString", skip_serializing_if = "Option::is_none")]
        has_culture_invariant: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatText {
    pub source: Box<TextValue>,
    pub arguments: Vec<FormatArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatArgument {
    pub name: String,
    pub value: FormatArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormatArgumentValue {
    Text(TextValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayValue {
    pub element_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<ArrayStructInfo>,
    pub values: ArrayValues,
}

/// Preamble shared by every element of a struct array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayStructInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub sub_type: StructType,
    #[serde(skip_serializing_if = "is_zero_guid")]
    pub guid: [i32; 4],
}

fn is_zero_guid(guid: &[i32; 4]) -> bool {
    guid.iter().all(|&x| x == 0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArrayValues {
    Byte(Vec<u8>),
    Int(Vec<i32>),
    Long(Vec<LongValue>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Str(Vec<String>),
    Text(Vec<TextValue>),
    Object(Vec<ObjectReference>),
    Struct(Vec<StructData>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::Byte(x) => x.len(),
            ArrayValues::Int(x) => x.len(),
            ArrayValues::Long(x) => x.len(),
            ArrayValues::Float(x) => x.len(),
            ArrayValues::Double(x) => x.len(),
            ArrayValues::Str(x) => x.len(),
            ArrayValues::Text(x) => x.len(),
            ArrayValues::Object(x) => x.len(),
            ArrayValues::Struct(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapValue {
    pub key_type: PropertyType,
    pub value_type: PropertyType,
    pub mode: MapMode,
    pub entries: Vec<MapEntry>,
}

/// The preamble selected by the map's mode word
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapMode {
    Plain(i32),
    Named {
        unk2: String,
        unk3: String,
    },
    Extended {
        unk1: [u8; 9],
        unk2: String,
        unk3: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntry {
    pub key: MapKey,
    pub value: MapEntryValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapKey {
    Int(i32),
    Long(LongValue),
    Str(String),
    Object(ObjectReference),
    Enum { name: String },
    Struct(Vec<Property>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapEntryValue {
    Byte(u8),
    Int(i32),
    Long(LongValue),
    Float(f32),
    Double(f64),
    Str(String),
    Object(ObjectReference),
    #[serde(rename_all = "camelCase")]
    Balancer {
        normal_index: i32,
        overflow_index: i32,
        filter_index: i32,
    },
    Struct(Vec<Property>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetValue {
    pub element_type: PropertyType,
    pub values: SetValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SetValues {
    Object(Vec<ObjectReference>),
    Vector(Vec<Vector3>),
    NetworkTrace(Vec<NetworkTrace>),
    Name(Vec<String>),
    Int(Vec<i32>),
}

/// The named physical struct layouts, plus the open arm for anything else
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StructType {
    Color,
    LinearColor,
    Vector,
    Rotator,
    Vector2D,
    Quat,
    Vector4,
    Box,
    RailroadTrackPosition,
    TimerHandle,
    Guid,
    InventoryItem,
    FluidBox,
    SlateBrush,
    DateTime,
    FrameRange,
    NetworkTrace,
    LuaProcessorStateStorage,
    GpuBufferPixel,
    Other(String),
}

impl StructType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Color" => StructType::Color,
            "LinearColor" => StructType::LinearColor,
            "Vector" => StructType::Vector,
            "Rotator" => StructType::Rotator,
            "Vector2D" => StructType::Vector2D,
            "Quat" => StructType::Quat,
            "Vector4" => StructType::Vector4,
            "Box" => StructType::Box,
            "RailroadTrackPosition" => StructType::RailroadTrackPosition,
            "TimerHandle" => StructType::TimerHandle,
            "Guid" => StructType::Guid,
            "InventoryItem" => StructType::InventoryItem,
            "FluidBox" => StructType::FluidBox,
            "SlateBrush" => StructType::SlateBrush,
            "DateTime" => StructType::DateTime,
            "FICFrameRange" => StructType::FrameRange,
            "FINNetworkTrace" => StructType::NetworkTrace,
            "FINLuaProcessorStateStorage" => StructType::LuaProcessorStateStorage,
            "FINGPUT1BufferPixel" => StructType::GpuBufferPixel,
            x => StructType::Other(String::from(x)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StructType::Color => "Color",
            StructType::LinearColor => "LinearColor",
            StructType::Vector => "Vector",
            StructType::Rotator => "Rotator",
            StructType::Vector2D => "Vector2D",
            StructType::Quat => "Quat",
            StructType::Vector4 => "Vector4",
            StructType::Box => "Box",
            StructType::RailroadTrackPosition => "RailroadTrackPosition",
            StructType::TimerHandle => "TimerHandle",
            StructType::Guid => "Guid",
            StructType::InventoryItem => "InventoryItem",
            StructType::FluidBox => "FluidBox",
            StructType::SlateBrush => "SlateBrush",
            StructType::DateTime => "DateTime",
            StructType::FrameRange => "FICFrameRange",
            StructType::NetworkTrace => "FINNetworkTrace",
            StructType::LuaProcessorStateStorage => "FINLuaProcessorStateStorage",
            StructType::GpuBufferPixel => "FINGPUT1BufferPixel",
            StructType::Other(x) => x.as_str(),
        }
    }
}

impl Serialize for StructType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructValue {
    #[serde(rename = "type")]
    pub struct_type: StructType,
    pub data: StructData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector4 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

/// Decoded payload of a struct, one arm per physical layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructData {
    Color(Color),
    LinearColor(LinearColor),
    Vector(Vector3),
    Vector2D(Vector2),
    Vector4(Vector4),
    #[serde(rename_all = "camelCase")]
    Box {
        min: Vector3,
        max: Vector3,
        is_valid: u8,
    },
    RailroadTrackPosition {
        track: ObjectReference,
        offset: f32,
        forward: f32,
    },
    TimerHandle {
        handle: String,
    },
    Guid {
        guid: [u8; 16],
    },
    #[serde(rename_all = "camelCase")]
    InventoryItem {
        unk1: i32,
        item_name: String,
        reference: ObjectReference,
        #[serde(skip_serializing_if = "Option::is_none")]
        property: Option<Box<Property>>,
    },
    #[serde(rename_all = "camelCase")]
    InventoryItemElement {
        unk1: i32,
        item_name: String,
        level_name: String,
        path_name: String,
    },
    FluidBox {
        value: f32,
    },
    SlateBrush {
        unk1: String,
    },
    #[serde(rename_all = "camelCase")]
    DateTime {
        date_time: LongValue,
    },
    FrameRange {
        begin: LongValue,
        end: LongValue,
    },
    NetworkTrace(NetworkTrace),
    LuaProcessorState(LuaProcessorState),
    GpuBufferPixel(GpuBufferPixel),
    Properties(Vec<Property>),
}

/// A chain of network hops ending at a referenced record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTrace {
    pub level_name: String,
    pub path_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Box<NetworkTrace>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LuaProcessorState {
    pub trace: Vec<NetworkTrace>,
    pub reference: Vec<LuaReference>,
    pub thread: String,
    pub globals: String,
    pub structs: Vec<LuaStruct>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LuaReference {
    pub level_name: String,
    pub path_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LuaStruct {
    pub unk1: i32,
    pub struct_name: String,
    pub data: LuaStructData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LuaStructData {
    Vector(Vector3),
    LinearColor(LinearColor),
    #[serde(rename_all = "camelCase")]
    InventoryStack {
        unk3: i32,
        unk4: String,
        unk5: i32,
        unk6: i32,
        unk7: i32,
    },
    #[serde(rename_all = "camelCase")]
    ItemAmount {
        unk3: i32,
        unk4: String,
        unk5: i32,
    },
    #[serde(rename_all = "camelCase")]
    TrackGraph {
        trace: NetworkTrace,
        track_id: i32,
    },
    #[serde(rename_all = "camelCase")]
    GpuBuffer {
        x: i32,
        y: i32,
        size: i32,
        name: String,
        type_name: String,
        length: i32,
        buffer: Vec<GpuBufferPixel>,
        unk3: Vec<u8>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuBufferPixel {
    pub character: [u8; 2],
    pub foreground_color: LinearColor,
    pub background_color: LinearColor,
}
