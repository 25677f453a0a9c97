#![allow(dead_code)]

/// Tag the game writes at the start of every chunk header
pub const FILE_TAG: u32 = 0x9E2A_83C1;

pub const MAX_CHUNK_SIZE: u32 = 131_072;

pub const SMELTER: &str =
    "/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C";

pub const INVENTORY: &str = "/Script/FactoryGame.FGInventoryComponent";

#[derive(Debug, Default)]
pub struct Writer {
    data: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn u8(&mut self, x: u8) -> &mut Self {
        self.data.push(x);
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

    pub fn raw(&mut self, x: &[u8]) -> &mut Self {
        self.data.extend_from_slice(x);
        self
    }

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

    pub fn property(&mut self, name: &str, tag: &str) -> &mut Self {
        self.string(name).string(tag).i32(0).i32(0)
    }

    pub fn none(&mut self) -> &mut Self {
        self.string("None")
    }

    pub fn object_header(&mut self, class_name: &str, path: &str, outer: &str) -> &mut Self {
        self.i32(0)
            .string(class_name)
            .object_ref("Persistent_Level", path)
            .string(outer)
    }

    pub fn actor_header(&mut self, class_name: &str, path: &str) -> &mut Self {
        self.i32(1)
            .string(class_name)
            .object_ref("Persistent_Level", path)
            .i32(1);
        self.f32(0.0).f32(0.0).f32(0.0).f32(1.0);
        self.f32(100.0).f32(200.0).f32(300.0);
        self.f32(1.0).f32(1.0).f32(1.0).i32(0)
    }

    /// Length prefixed record body
    pub fn body(&mut self, body: &[u8]) -> &mut Self {
        self.i32(body.len() as i32).raw(body)
    }
}

/// Body of an object holding a single float property followed by `tail`
pub fn object_body(tail: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.property("mHealth", "FloatProperty").u8(0).f32(100.0);
    w.none();
    w.raw(tail);
    w.into_inner()
}

/// Body of an actor with no children and no properties past the terminator
pub fn actor_body(extra: &[u8]) -> Vec<u8> {
    let mut w = Writer::new();
    w.object_ref("Persistent_Level", "Persistent_Level:PersistentLevel")
        .i32(0);
    w.none();
    w.raw(extra);
    w.into_inner()
}

pub fn header(header_version: i32, save_version: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.i32(header_version)
        .i32(save_version)
        .i32(211_839)
        .string("Persistent_Level")
        .string("?startloc=Grass Fields?sessionName=Base")
        .string("Base")
        .i32(7200)
        .i32(0x1234)
        .i32(0)
        .u8(1);
    if header_version >= 7 {
        w.i32(40);
    }
    if header_version >= 8 {
        w.string("").i32(0);
    }
    w.into_inner()
}

/// Compress `body` into chunks of at most `chunk_size` inflated bytes, each
/// behind a chunk header
pub fn chunks(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for piece in body.chunks(chunk_size.max(1)) {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(piece, 6);
        let mut head = [0u8; 48];
        head[0..4].copy_from_slice(&FILE_TAG.to_le_bytes());
        head[8..12].copy_from_slice(&MAX_CHUNK_SIZE.to_le_bytes());
        head[16..20].copy_from_slice(&(compressed.len() as u32).to_le_bytes());
        head[24..28].copy_from_slice(&(piece.len() as u32).to_le_bytes());
        out.extend_from_slice(&head);
        out.extend_from_slice(&compressed);
    }
    out
}

/// A complete save: header, then the body preceded by its four padding
/// bytes, compressed
pub fn save(save_version: i32, body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut inflated = vec![0u8; 4];
    inflated.extend_from_slice(body);
    let mut out = header(8, save_version);
    out.extend_from_slice(&chunks(&inflated, chunk_size));
    out
}
