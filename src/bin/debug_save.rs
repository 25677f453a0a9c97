use factorysave::{DecodeEvent, FnSink, SaveExtractor};
use std::collections::BTreeMap;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).ok_or("expected a path to a save file")?;
    let data = std::fs::read(path)?;

    let header = SaveExtractor::extract_header(&data)?;
    println!("{:#?}", header);

    // records name the level they were saved in
    let mut per_level = BTreeMap::new();
    let mut diagnostics = 0;
    let summary = SaveExtractor::default().decode(
        &data,
        FnSink(|event: DecodeEvent| match event {
            DecodeEvent::Records(batch) => {
                for record in batch.values() {
                    let level = record
                        .level_name
                        .clone()
                        .unwrap_or_else(|| String::from("Persistent_Level"));
                    *per_level.entry(level).or_insert(0usize) += 1;
                }
            }
            DecodeEvent::Diagnostic(diagnostic) => {
                diagnostics += 1;
                eprintln!("{:?}", diagnostic);
            }
            _ => {}
        }),
    )?;

    for (level, count) in &per_level {
        println!("{}: {} records", level, count);
    }

    println!(
        "{} records, {} levels, {} collectables, {} diagnostics",
        summary.records,
        summary.levels.len(),
        summary.collectables,
        diagnostics
    );
    Ok(())
}
