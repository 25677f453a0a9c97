use super::{ObjectReference, Property};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Object,
    Actor,
}

impl RecordKind {
    pub fn from_word(word: i32) -> Option<Self> {
        match word {
            0 => Some(RecordKind::Object),
            1 => Some(RecordKind::Actor),
            _ => None,
        }
    }
}

/// Spatial placement of an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub rotation: [f32; 4],
    pub translation: [f32; 3],

    /// Only kept when it differs from the unit scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale3d: Option<[f32; 3]>,
}

impl Transform {
    /// Half extent of the cube that actors are expected to be placed in
    pub const WORLD_BOUND: f32 = 500_000.0;

    /// Where actors with unusable coordinates are moved to
    pub const FALLBACK_TRANSLATION: [f32; 3] = [0.0, 0.0, 2000.0];

    /// Replace out of bounds or non-finite translations with the fallback
    /// position. Returns true when the translation was rewritten.
    pub fn sanitize(&mut self) -> bool {
        let [x, y, _] = self.translation;
        let out_of_bounds = !(-Self::WORLD_BOUND..=Self::WORLD_BOUND).contains(&x)
            || !(-Self::WORLD_BOUND..=Self::WORLD_BOUND).contains(&y);
        let non_finite = self.translation.iter().any(|v| !v.is_finite());

        if out_of_bounds || non_finite {
            self.translation = Self::FALLBACK_TRANSLATION;
            true
        } else {
            false
        }
    }
}

/// A decoded object or actor, keyed by its path name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    pub path_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outer_path_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_transform: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_placed_in_level: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<ObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ObjectReference>>,

    /// The body held nothing beyond its header
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub should_be_nulled: bool,

    pub properties: Vec<Property>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Extra>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<PlayerIdentity>,

    /// Trailing bytes the decoders could not account for, kept verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<u8>>,
}

impl Record {
    pub fn new(kind: RecordKind, class_name: String, reference: ObjectReference) -> Self {
        Record {
            kind,
            class_name,
            level_name: reference.level_name,
            path_name: reference.path_name,
            outer_path_name: None,
            needs_transform: None,
            transform: None,
            was_placed_in_level: None,
            entity: None,
            children: None,
            should_be_nulled: false,
            properties: Vec::new(),
            extra: None,
            identity: None,
            missing: None,
        }
    }

    pub fn is_actor(&self) -> bool {
        self.kind == RecordKind::Actor
    }

    /// Find the first property with the given name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|x| x.name == name)
    }
}

/// Class specific payload appended after the generic property list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extra {
    Conveyor {
        count: i32,
        items: Vec<ConveyorItem>,
    },
    GameState {
        count: i32,
        game: Vec<ObjectReference>,
    },
    Circuits {
        count: i32,
        circuits: Vec<Circuit>,
    },
    PowerLine {
        count: i32,
        source: ObjectReference,
        target: ObjectReference,
    },
    Train {
        count: i32,
        objects: Vec<VehicleEntry>,
        previous: ObjectReference,
        next: ObjectReference,
    },
    Vehicle {
        count: i32,
        objects: Vec<VehicleEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConveyorItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,
    pub name: String,
    pub position: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: i32,
    pub level_name: String,
    pub path_name: String,
}

/// Length of the opaque block that follows each vehicle entry name
pub const VEHICLE_ENTRY_BLOCK: usize = 53;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleEntry {
    pub name: String,
    pub unk: Vec<u8>,
}

/// Online identity attached to a player state record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerIdentity {
    EosId(String),
    SteamId(String),
    PlatformId(String),
    Offline,
}
