//! Class specific data that follows the generic property list of a record.
//!
//! Which layout applies is decided by the record's class name through a
//! [`ClassExtensionRegistry`]. Classes without an entry only go through the
//! generic residual byte handling.

use crate::{
    events::{CrossReference, DecodeEvent, Diagnostic},
    models::{Circuit, ConveyorItem, Extra, PlayerIdentity, Record, VehicleEntry, VEHICLE_ENTRY_BLOCK},
    property::PropertyDecoder,
    reader::SaveReader,
    SaveError, SaveErrorKind,
};
use std::collections::HashMap;
use std::fmt::Write;

pub const GAME_STATE_CLASS: &str = "/Game/FactoryGame/-Shared/Blueprint/BP_GameState.BP_GameState_C";
pub const GAME_MODE_CLASS: &str = "/Game/FactoryGame/-Shared/Blueprint/BP_GameMode.BP_GameMode_C";
pub const PLAYER_STATE_CLASS: &str =
    "/Game/FactoryGame/Character/Player/BP_PlayerState.BP_PlayerState_C";
pub const DRONE_TRANSPORT_CLASS: &str =
    "/Game/FactoryGame/Buildable/Factory/DroneStation/BP_DroneTransport.BP_DroneTransport_C";
pub const CIRCUIT_SUBSYSTEM_CLASS: &str =
    "/Game/FactoryGame/-Shared/Blueprint/BP_CircuitSubsystem.BP_CircuitSubsystem_C";

const POWER_LINE_CLASSES: [&str; 8] = [
    "/Game/FactoryGame/Buildable/Factory/PowerLine/Build_PowerLine.Build_PowerLine_C",
    "/Game/FactoryGame/Events/Christmas/Buildings/PowerLineLights/Build_XmassLightsLine.Build_XmassLightsLine_C",
    "/FlexSplines/PowerLine/Build_FlexPowerline.Build_FlexPowerline_C",
    "/AB_CableMod/Visuals1/Build_AB-PLCopper.Build_AB-PLCopper_C",
    "/AB_CableMod/Visuals1/Build_AB-PLCaterium.Build_AB-PLCaterium_C",
    "/AB_CableMod/Visuals3/Build_AB-PLHeavy.Build_AB-PLHeavy_C",
    "/AB_CableMod/Visuals4/Build_AB-SPLight.Build_AB-SPLight_C",
    "/AB_CableMod/Visuals3/Build_AB-PLPaintable.Build_AB-PLPaintable_C",
];

const TRAIN_CLASSES: [&str; 2] = [
    "/Game/FactoryGame/Buildable/Vehicle/Train/Locomotive/BP_Locomotive.BP_Locomotive_C",
    "/Game/FactoryGame/Buildable/Vehicle/Train/Wagon/BP_FreightWagon.BP_FreightWagon_C",
];

const VEHICLE_CLASSES: [&str; 6] = [
    "/Game/FactoryGame/Buildable/Vehicle/Tractor/BP_Tractor.BP_Tractor_C",
    "/Game/FactoryGame/Buildable/Vehicle/Truck/BP_Truck.BP_Truck_C",
    "/Game/FactoryGame/Buildable/Vehicle/Explorer/BP_Explorer.BP_Explorer_C",
    "/Game/FactoryGame/Buildable/Vehicle/Cyberwagon/Testa_BP_WB.Testa_BP_WB_C",
    "/Game/FactoryGame/Buildable/Vehicle/Golfcart/BP_Golfcart.BP_Golfcart_C",
    "/Game/FactoryGame/Buildable/Vehicle/Golfcart/BP_GolfcartGold.BP_GolfcartGold_C",
];

const CONVEYOR_SUBSTRINGS: [&str; 2] = ["/Build_ConveyorBeltMk", "/Build_ConveyorLiftMk"];

const CONVEYOR_PREFIXES: [&str; 4] = [
    "/Game/Conveyors_Mod/Build_LiftMk",
    "/Conveyors_Mod/Build_LiftMk",
    "/Game/CoveredConveyor",
    "/CoveredConveyor",
];

/// The trailing layouts that are understood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// Items riding on a belt or lift
    Conveyor,

    /// Game state and game mode reference lists
    GameState,

    /// Online identity of a player
    PlayerState,

    /// Opaque payload that is always kept as residual bytes
    DroneTransport,
    CircuitSubsystem,
    PowerLine,
    Train,
    Vehicle,
}

/// Maps class names to the trailing layout their records carry.
///
/// Lookups try exact class names first, then prefixes, then substrings, each
/// in registration order.
#[derive(Debug, Clone)]
pub struct ClassExtensionRegistry {
    exact: HashMap<String, ExtensionKind>,
    prefixes: Vec<(String, ExtensionKind)>,
    substrings: Vec<(String, ExtensionKind)>,
}

impl ClassExtensionRegistry {
    /// A registry without any entries
    pub fn empty() -> Self {
        ClassExtensionRegistry {
            exact: HashMap::new(),
            prefixes: Vec::new(),
            substrings: Vec::new(),
        }
    }

    pub fn register(&mut self, class_name: impl Into<String>, kind: ExtensionKind) -> &mut Self {
        self.exact.insert(class_name.into(), kind);
        self
    }

    pub fn register_prefix(&mut self, prefix: impl Into<String>, kind: ExtensionKind) -> &mut Self {
        self.prefixes.push((prefix.into(), kind));
        self
    }

    pub fn register_substring(&mut self, needle: impl Into<String>, kind: ExtensionKind) -> &mut Self {
        self.substrings.push((needle.into(), kind));
        self
    }

    pub fn lookup(&self, class_name: &str) -> Option<ExtensionKind> {
        if let Some(kind) = self.exact.get(class_name) {
            return Some(*kind);
        }

        self.prefixes
            .iter()
            .find(|(prefix, _)| class_name.starts_with(prefix.as_str()))
            .or_else(|| {
                self.substrings
                    .iter()
                    .find(|(needle, _)| class_name.contains(needle.as_str()))
            })
            .map(|(_, kind)| *kind)
    }
}

impl Default for ClassExtensionRegistry {
    fn default() -> Self {
        let mut registry = ClassExtensionRegistry::empty();
        registry
            .register(GAME_STATE_CLASS, ExtensionKind::GameState)
            .register(GAME_MODE_CLASS, ExtensionKind::GameState)
            .register(PLAYER_STATE_CLASS, ExtensionKind::PlayerState)
            .register(DRONE_TRANSPORT_CLASS, ExtensionKind::DroneTransport)
            .register(CIRCUIT_SUBSYSTEM_CLASS, ExtensionKind::CircuitSubsystem);

        for class in POWER_LINE_CLASSES {
            registry.register(class, ExtensionKind::PowerLine);
        }

        for class in TRAIN_CLASSES {
            registry.register(class, ExtensionKind::Train);
        }

        for class in VEHICLE_CLASSES {
            registry.register(class, ExtensionKind::Vehicle);
        }

        for prefix in CONVEYOR_PREFIXES {
            registry.register_prefix(prefix, ExtensionKind::Conveyor);
        }

        for needle in CONVEYOR_SUBSTRINGS {
            registry.register_substring(needle, ExtensionKind::Conveyor);
        }

        registry
    }
}

/// Identity provider bytes written ahead of a player's online id
const PROVIDER_EOS: u8 = 248;
const PROVIDER_EOS_HEX: u8 = 249;
const PROVIDER_LEGACY_EOS: u8 = 17;
const PROVIDER_STEAM: u8 = 25;
const PROVIDER_PLATFORM: u8 = 8;
const PROVIDER_OFFLINE: u8 = 3;

/// Decode the trailing data of `kind` for a record whose body ends at the
/// absolute stream offset `end`
pub(crate) fn read_extension<R: SaveReader>(
    kind: ExtensionKind,
    decoder: &mut PropertyDecoder<'_, R>,
    record: &mut Record,
    end: u64,
) -> Result<(), SaveError> {
    match kind {
        ExtensionKind::Conveyor => {
            let count = decoder.reader().read_i32()?;
            let len = decoder.read_count()?;
            let mut items = Vec::new();
            for _ in 0..len {
                let reader = decoder.reader();
                let length = match reader.read_i32()? {
                    0 => None,
                    x => Some(x),
                };
                let name = reader.read_string()?;

                // level and path name of the item actor, always empty
                reader.read_string()?;
                reader.read_string()?;

                items.push(ConveyorItem {
                    length,
                    name,
                    position: reader.read_f32()?,
                });
            }
            record.extra = Some(Extra::Conveyor { count, items });
        }
        ExtensionKind::GameState => {
            let count = decoder.reader().read_i32()?;
            let len = decoder.read_count()?;
            let mut game = Vec::new();
            for i in 0..len {
                let reference = decoder.read_object_reference()?;
                if i == 0 && record.class_name == GAME_STATE_CLASS {
                    decoder.emit(DecodeEvent::CrossReference(CrossReference::PlayerHost(
                        reference.path_name.clone(),
                    )));
                }
                game.push(reference);
            }
            record.extra = Some(Extra::GameState { count, game });
        }
        ExtensionKind::PlayerState => read_player_state(decoder, record, end)?,
        ExtensionKind::DroneTransport => {
            let remaining = remaining(decoder, end);
            if remaining > 0 {
                record.missing = Some(decoder.reader().read_raw(remaining as usize)?);
            }
        }
        ExtensionKind::CircuitSubsystem => {
            let count = decoder.reader().read_i32()?;
            let len = decoder.read_count()?;
            let mut circuits = Vec::new();
            for _ in 0..len {
                let reader = decoder.reader();
                circuits.push(Circuit {
                    circuit_id: reader.read_i32()?,
                    level_name: reader.read_string()?,
                    path_name: reader.read_string()?,
                });
            }
            record.extra = Some(Extra::Circuits { count, circuits });
        }
        ExtensionKind::PowerLine => {
            record.extra = Some(Extra::PowerLine {
                count: decoder.reader().read_i32()?,
                source: decoder.read_object_reference()?,
                target: decoder.read_object_reference()?,
            });
        }
        ExtensionKind::Train => {
            let count = decoder.reader().read_i32()?;
            let objects = read_vehicle_entries(decoder)?;
            record.extra = Some(Extra::Train {
                count,
                objects,
                previous: decoder.read_object_reference()?,
                next: decoder.read_object_reference()?,
            });
        }
        ExtensionKind::Vehicle => {
            let count = decoder.reader().read_i32()?;
            let objects = read_vehicle_entries(decoder)?;
            record.extra = Some(Extra::Vehicle { count, objects });
        }
    }

    Ok(())
}

/// Declared bytes of the record body that have not been consumed yet.
/// Negative when the body was over-read.
pub(crate) fn remaining<R: SaveReader>(decoder: &mut PropertyDecoder<'_, R>, end: u64) -> i64 {
    end as i64 - decoder.reader().bytes_read() as i64
}

fn read_vehicle_entries<R: SaveReader>(
    decoder: &mut PropertyDecoder<'_, R>,
) -> Result<Vec<VehicleEntry>, SaveError> {
    let len = decoder.read_count()?;
    let mut out = Vec::new();
    for _ in 0..len {
        let reader = decoder.reader();
        out.push(VehicleEntry {
            name: reader.read_string()?,
            unk: reader.read_raw(VEHICLE_ENTRY_BLOCK)?,
        });
    }
    Ok(out)
}

fn read_player_state<R: SaveReader>(
    decoder: &mut PropertyDecoder<'_, R>,
    record: &mut Record,
    end: u64,
) -> Result<(), SaveError> {
    let remaining = remaining(decoder, end);
    if remaining <= 0 {
        return Ok(());
    }

    // kept verbatim so the identity can be written back untouched
    record.missing = Some(decoder.reader().peek_raw(remaining as usize)?);

    let start = decoder.reader().bytes_read();
    match read_identity(decoder.reader()) {
        Ok(identity) => record.identity = Some(identity),
        Err(e) => match e.kind() {
            SaveErrorKind::UnknownIdentityProvider { provider } => {
                let provider = *provider;
                let offset = decoder.reader().bytes_read();
                tracing::warn!(
                    path_name = record.path_name.as_str(),
                    provider,
                    offset,
                    "unrecognized player identity provider"
                );

                decoder.emit(DecodeEvent::Diagnostic(Diagnostic::UnknownIdentityProvider {
                    path_name: record.path_name.clone(),
                    provider,
                    offset,
                }));

                let consumed = decoder.reader().bytes_read() - start;
                let rest = (remaining as u64).saturating_sub(consumed);
                decoder.reader().skip_bytes(rest as usize)?;
            }
            _ => return Err(e),
        },
    }

    Ok(())
}

fn read_identity<R: SaveReader>(reader: &mut R) -> Result<PlayerIdentity, SaveError> {
    // entry count, a player only ever has one identity
    reader.skip_bytes(4)?;

    let provider = reader.read_u8()?;
    let identity = match provider {
        PROVIDER_EOS => {
            reader.read_string()?;
            let id = reader.read_string()?;
            let id = id.split('|').next().unwrap_or_default();
            PlayerIdentity::EosId(String::from(id))
        }
        PROVIDER_EOS_HEX => {
            reader.read_string()?;
            PlayerIdentity::EosId(read_hex_id(reader)?)
        }
        PROVIDER_LEGACY_EOS => PlayerIdentity::EosId(read_hex_id(reader)?),
        PROVIDER_STEAM => PlayerIdentity::SteamId(read_hex_id(reader)?),
        PROVIDER_PLATFORM => PlayerIdentity::PlatformId(reader.read_string()?),
        PROVIDER_OFFLINE => PlayerIdentity::Offline,
        provider => return Err(SaveErrorKind::UnknownIdentityProvider { provider }.into()),
    };

    Ok(identity)
}

/// A byte length followed by that many bytes, rendered as lowercase hex
/// without leading zeros
fn read_hex_id<R: SaveReader>(reader: &mut R) -> Result<String, SaveError> {
    let len = reader.read_u8()?;
    let data = reader.read_raw(usize::from(len))?;

    let mut hex = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(hex, "{:02x}", byte);
    }

    Ok(String::from(hex.trim_start_matches('0')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{ObjectReference, RecordKind},
        testing::{header, ByteWriter},
        ByteCursor,
    };

    const BELT: &str = "/Game/FactoryGame/Buildable/Factory/ConveyorBeltMk1/Build_ConveyorBeltMk1.Build_ConveyorBeltMk1_C";

    fn record(class_name: &str) -> Record {
        Record::new(
            RecordKind::Actor,
            String::from(class_name),
            ObjectReference::new(
                String::from("Persistent_Level"),
                String::from("Persistent_Level:PersistentLevel.Thing_1"),
            ),
        )
    }

    fn run(class_name: &str, data: &[u8]) -> (Record, Vec<DecodeEvent>, u64) {
        let registry = ClassExtensionRegistry::default();
        let kind = registry.lookup(class_name).unwrap();
        let header = header(42, 211839);
        let mut cursor = ByteCursor::new(data);
        let mut events = Vec::new();
        let mut record = record(class_name);
        let mut decoder = PropertyDecoder::new(&mut cursor, &header, &mut events);
        read_extension(kind, &mut decoder, &mut record, data.len() as u64).unwrap();
        let consumed = decoder.reader().bytes_read();
        (record, events, consumed)
    }

    #[test]
    fn builtin_lookups() {
        let registry = ClassExtensionRegistry::default();
        assert_eq!(registry.lookup(BELT), Some(ExtensionKind::Conveyor));
        assert_eq!(
            registry.lookup("/Game/FactoryGame/Buildable/Factory/ConveyorLiftMk5/Build_ConveyorLiftMk5.Build_ConveyorLiftMk5_C"),
            Some(ExtensionKind::Conveyor)
        );
        assert_eq!(
            registry.lookup("/CoveredConveyor/Mk2/Build_CoveredConveyorBelt.Build_CoveredConveyorBelt_C"),
            Some(ExtensionKind::Conveyor)
        );
        assert_eq!(registry.lookup(GAME_MODE_CLASS), Some(ExtensionKind::GameState));
        assert_eq!(registry.lookup(POWER_LINE_CLASSES[3]), Some(ExtensionKind::PowerLine));
        assert_eq!(registry.lookup(VEHICLE_CLASSES[5]), Some(ExtensionKind::Vehicle));
        assert_eq!(
            registry.lookup("/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C"),
            None
        );
    }

    #[test]
    fn runtime_registration() {
        let mut registry = ClassExtensionRegistry::empty();
        assert_eq!(registry.lookup(BELT), None);
        registry
            .register("/MyMod/Build_Hauler.Build_Hauler_C", ExtensionKind::Vehicle)
            .register_prefix("/MyMod/Lines/", ExtensionKind::PowerLine)
            .register_substring("Build_Belt", ExtensionKind::Conveyor);

        assert_eq!(
            registry.lookup("/MyMod/Build_Hauler.Build_Hauler_C"),
            Some(ExtensionKind::Vehicle)
        );
        assert_eq!(
            registry.lookup("/MyMod/Lines/Build_Wire.Build_Wire_C"),
            Some(ExtensionKind::PowerLine)
        );
        assert_eq!(
            registry.lookup("/Other/Build_Belt2.Build_Belt2_C"),
            Some(ExtensionKind::Conveyor)
        );
    }

    #[test]
    fn conveyor_items() {
        let mut w = ByteWriter::new();
        w.i32(0).i32(2);
        w.i32(0).string("Desc_OreIron_C").string("").string("").f32(12.5);
        w.i32(3).string("Desc_Coal_C").string("").string("").f32(80.0);
        let data = w.into_inner();

        let (record, _, consumed) = run(BELT, &data);
        assert_eq!(consumed, data.len() as u64);
        let Some(Extra::Conveyor { count, items }) = record.extra else {
            panic!("expected conveyor items");
        };
        assert_eq!(count, 0);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].length, None);
        assert_eq!(items[1].length, Some(3));
        assert_eq!(items[1].name, "Desc_Coal_C");
        assert_eq!(items[1].position, 80.0);
    }

    #[test]
    fn game_state_reports_player_host() {
        let mut w = ByteWriter::new();
        w.i32(0).i32(2);
        w.object_ref("Persistent_Level", "Persistent_Level:PersistentLevel.BP_PlayerState_C_0");
        w.object_ref("Persistent_Level", "Persistent_Level:PersistentLevel.BP_PlayerState_C_1");
        let data = w.into_inner();

        let (record, events, _) = run(GAME_STATE_CLASS, &data);
        assert!(matches!(record.extra, Some(Extra::GameState { ref game, .. }) if game.len() == 2));
        assert_eq!(
            events,
            vec![DecodeEvent::CrossReference(CrossReference::PlayerHost(
                String::from("Persistent_Level:PersistentLevel.BP_PlayerState_C_0")
            ))]
        );

        let (_, events, _) = run(GAME_MODE_CLASS, &data);
        assert!(events.is_empty());
    }

    fn player_state(provider: u8, payload: &[u8]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.i32(1).u8(provider).raw(payload);
        w.into_inner()
    }

    #[test]
    fn steam_identity_strips_leading_zeros() {
        let data = player_state(25, &[8, 0x01, 0x10, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        let (record, _, consumed) = run(PLAYER_STATE_CLASS, &data);
        assert_eq!(consumed, data.len() as u64);
        assert_eq!(
            record.identity,
            Some(PlayerIdentity::SteamId(String::from("110000102030405")))
        );
        assert_eq!(record.missing.as_deref(), Some(&data[..]));
    }

    #[test]
    fn eos_identity_before_separator() {
        let mut w = ByteWriter::new();
        w.i32(1).u8(248).string("EOS").string("00023a8f|76561198000000000");
        let data = w.into_inner();

        let (record, _, consumed) = run(PLAYER_STATE_CLASS, &data);
        assert_eq!(consumed, data.len() as u64);
        assert_eq!(record.identity, Some(PlayerIdentity::EosId(String::from("00023a8f"))));
    }

    #[test]
    fn prefixed_hex_eos_and_offline() {
        let mut w = ByteWriter::new();
        w.i32(1).u8(249).string("EOS").u8(2).u8(0x00).u8(0xab);
        let data = w.into_inner();
        let (record, _, _) = run(PLAYER_STATE_CLASS, &data);
        assert_eq!(record.identity, Some(PlayerIdentity::EosId(String::from("ab"))));

        let data = player_state(3, &[]);
        let (record, _, _) = run(PLAYER_STATE_CLASS, &data);
        assert_eq!(record.identity, Some(PlayerIdentity::Offline));
    }

    #[test]
    fn unknown_provider_skips_declared_bytes() {
        let data = player_state(77, &[1, 2, 3, 4, 5, 6]);
        let (record, events, consumed) = run(PLAYER_STATE_CLASS, &data);
        assert_eq!(consumed, data.len() as u64);
        assert_eq!(record.identity, None);
        assert_eq!(record.missing.as_deref(), Some(&data[..]));
        assert!(matches!(
            &events[..],
            [DecodeEvent::Diagnostic(Diagnostic::UnknownIdentityProvider { provider: 77, .. })]
        ));
    }

    #[test]
    fn drone_transport_keeps_everything() {
        let data = [9u8; 3];
        let (record, _, consumed) = run(DRONE_TRANSPORT_CLASS, &data);
        assert_eq!(consumed, 3);
        assert_eq!(record.missing, Some(vec![9, 9, 9]));
    }

    #[test]
    fn trains_and_vehicles() {
        let mut w = ByteWriter::new();
        w.i32(0).i32(1).string("FuelInventory").raw(&[0; 53]);
        w.object_ref("Persistent_Level", "Persistent_Level:PersistentLevel.BP_FreightWagon_C_1");
        w.object_ref("", "");
        let data = w.into_inner();

        let (record, _, consumed) = run(TRAIN_CLASSES[0], &data);
        assert_eq!(consumed, data.len() as u64);
        let Some(Extra::Train { objects, previous, .. }) = record.extra else {
            panic!("expected train data");
        };
        assert_eq!(objects[0].name, "FuelInventory");
        assert_eq!(objects[0].unk.len(), VEHICLE_ENTRY_BLOCK);
        assert_eq!(
            previous.path_name,
            "Persistent_Level:PersistentLevel.BP_FreightWagon_C_1"
        );

        let mut w = ByteWriter::new();
        w.i32(0).i32(2).string("A").raw(&[1; 53]).string("B").raw(&[2; 53]);
        let data = w.into_inner();
        let (record, _, consumed) = run(VEHICLE_CLASSES[1], &data);
        assert_eq!(consumed, data.len() as u64);
        assert!(matches!(record.extra, Some(Extra::Vehicle { ref objects, .. }) if objects.len() == 2));
    }

    #[test]
    fn circuits_and_power_lines() {
        let mut w = ByteWriter::new();
        w.i32(0).i32(1).i32(12).string("Persistent_Level").string("Circuit_12");
        let data = w.into_inner();
        let (record, _, _) = run(CIRCUIT_SUBSYSTEM_CLASS, &data);
        let Some(Extra::Circuits { circuits, .. }) = record.extra else {
            panic!("expected circuits");
        };
        assert_eq!(circuits[0].circuit_id, 12);
        assert_eq!(circuits[0].path_name, "Circuit_12");

        let mut w = ByteWriter::new();
        w.i32(0).object_ref("Persistent_Level", "PoleA").object_ref("Persistent_Level", "PoleB");
        let data = w.into_inner();
        let (record, _, _) = run(POWER_LINE_CLASSES[0], &data);
        assert!(matches!(
            record.extra,
            Some(Extra::PowerLine { ref target, .. }) if target.path_name == "PoleB"
        ));
    }
}
