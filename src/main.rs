use anyhow::{Context, Result};
use std::env;

// Use library instead of local modules
use account_service::{logging, seed, AppConfig};

const USAGE: &str = "usage: account-service <seed [COUNT] | list | count>";

fn main() -> Result<()> {
    logging::init_logging();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load().context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        Some("seed") => {
            let count = match args.get(2) {
                Some(raw) => raw.parse().with_context(|| format!("Invalid count `{raw}`"))?,
                None => 3,
            };
            run_seed(&config, count)
        }
        Some("list") => run_list(&config),
        Some("count") => run_count(&config),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn run_seed(config: &AppConfig, count: usize) -> Result<()> {
    let store = config.store.open().context("Failed to open account store")?;

    let today = chrono::Local::now().date_naive();
    let seeded = seed::seed_accounts(store.as_ref(), count, today, &mut rand::thread_rng())?;
    let total = store.count()?;

    println!("Seeded {} accounts ({} stored)", seeded.len(), total);
    Ok(())
}

fn run_list(config: &AppConfig) -> Result<()> {
    let store = config.store.open().context("Failed to open account store")?;

    for account in store.list()? {
        println!("{}", serde_json::to_string(&account)?);
    }

    Ok(())
}

fn run_count(config: &AppConfig) -> Result<()> {
    let store = config.store.open().context("Failed to open account store")?;
    println!("{}", store.count()?);
    Ok(())
}
