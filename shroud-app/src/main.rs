mod commands;
mod config;

use anyhow::Result;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load_or_default()?;

    match args.get(1).map(|s| s.as_str()) {
        Some("scan") => commands::scan::run(&config, &args[2..]).await,
        Some("encrypt") => commands::vault::encrypt(&config, &args[2..]),
        Some("decrypt") => commands::vault::decrypt(&config, &args[2..]),
        Some("status") => commands::vault::status(&config),
        Some("purge") => commands::vault::purge(&config, &args[2..]),
        Some("config") if args.get(2).map(|s| s.as_str()) == Some("init") => {
            let config = Config::default();
            config.save()?;
            println!("Wrote default configuration to shroud.toml");
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("shroud - sensitive file scanner with an encrypted vault");
    println!();
    println!("Usage:");
    println!("  shroud scan <dir> [--vault] [--owner NAME] [--concurrency N] [--json]");
    println!("  shroud encrypt <file> [--owner NAME]");
    println!("  shroud decrypt <uuid> [--out DIR]");
    println!("  shroud status");
    println!("  shroud purge <uuid>");
    println!("  shroud config init");
}
