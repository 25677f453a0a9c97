use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use factorysave::{DecodeEvent, FnSink, SaveExtractor};

const RECORDS: usize = 2000;

fn string(out: &mut Vec<u8>, x: &str) {
    out.extend_from_slice(&(x.len() as i32 + 1).to_le_bytes());
    out.extend_from_slice(x.as_bytes());
    out.push(0);
}

fn i32(out: &mut Vec<u8>, x: i32) {
    out.extend_from_slice(&x.to_le_bytes());
}

/// A save of inventory objects, each with a couple of scalar properties
fn synthetic_save() -> Vec<u8> {
    let mut body = vec![0u8; 4];
    i32(&mut body, RECORDS as i32);
    for i in 0..RECORDS {
        i32(&mut body, 0);
        string(&mut body, "/Script/FactoryGame.FGInventoryComponent");
        string(&mut body, "Persistent_Level");
        string(&mut body, &format!("Persistent_Level:PersistentLevel.Inventory_{}", i));
        string(&mut body, "Persistent_Level:PersistentLevel");
    }

    i32(&mut body, RECORDS as i32);
    for i in 0..RECORDS {
        let mut props = Vec::new();
        string(&mut props, "mNumItems");
        string(&mut props, "IntProperty");
        i32(&mut props, 4);
        i32(&mut props, 0);
        props.push(0);
        i32(&mut props, i as i32);
        string(&mut props, "mOwnerName");
        string(&mut props, "StrProperty");
        i32(&mut props, 0);
        i32(&mut props, 0);
        props.push(0);
        string(&mut props, "Pioneer");
        string(&mut props, "None");

        i32(&mut body, props.len() as i32);
        body.extend_from_slice(&props);
    }
    i32(&mut body, 0);

    let mut save = Vec::new();
    i32(&mut save, 6);
    i32(&mut save, 25);
    i32(&mut save, 152_331);
    string(&mut save, "Persistent_Level");
    string(&mut save, "?startloc=Grass Fields");
    string(&mut save, "Bench");
    i32(&mut save, 0);
    save.extend_from_slice(&0u64.to_le_bytes());
    save.push(0);

    for piece in body.chunks(131_072) {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(piece, 6);
        let mut head = [0u8; 48];
        head[0..4].copy_from_slice(&0x9E2A_83C1u32.to_le_bytes());
        head[8..12].copy_from_slice(&131_072u32.to_le_bytes());
        head[16..20].copy_from_slice(&(compressed.len() as u32).to_le_bytes());
        head[24..28].copy_from_slice(&(piece.len() as u32).to_le_bytes());
        save.extend_from_slice(&head);
        save.extend_from_slice(&compressed);
    }

    save
}

pub fn decode_benchmark(c: &mut Criterion) {
    let data = synthetic_save();
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(RECORDS as u64));
    group.bench_function("header", |b| {
        b.iter(|| SaveExtractor::extract_header(black_box(&data)).unwrap());
    });
    group.bench_function("records", |b| {
        let extractor = SaveExtractor::default();
        b.iter(|| {
            let mut records = 0;
            extractor
                .decode(
                    black_box(&data),
                    FnSink(|event: DecodeEvent| {
                        if let DecodeEvent::Records(batch) = event {
                            records += batch.len();
                        }
                    }),
                )
                .unwrap();
            records
        });
    });
    group.finish();
}

criterion_group!(benches, decode_benchmark);
criterion_main!(benches);
