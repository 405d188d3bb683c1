/// Writes the order-encoding fixture files other client implementations
/// replay against their own encoder.
///
/// Usage: `cargo run --example conformance_fixtures -- [output-dir] [seed]`

use std::path::PathBuf;
use oredex::conformance::ConformanceGenerator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let rng = match args.next() {
        Some(seed) => StdRng::seed_from_u64(seed.parse()?),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&dir)?;
    let mut generator = ConformanceGenerator::new(rng);
    for (name, contents) in generator.fixtures()? {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        info!(path = %path.display(), "wrote fixture");
    }

    Ok(())
}
