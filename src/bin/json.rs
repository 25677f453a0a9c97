use factorysave::{DecodedSave, SaveExtractor};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).ok_or("expected a path to a save file")?;
    let data = std::fs::read(path)?;

    let mut save = DecodedSave::default();
    SaveExtractor::default().decode(&data, &mut save)?;

    let stdout = std::io::stdout();
    serde_json::to_writer(stdout.lock(), &save)?;
    Ok(())
}
