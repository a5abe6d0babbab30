use anyhow::Context;
use lotledger::{config::Config, LedgerSession, LedgerSnapshot};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Ledger error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let snapshot = LedgerSnapshot::read_from(&config.snapshot_path)
        .with_context(|| format!("reading snapshot {}", config.snapshot_path))?;

    let mut session = LedgerSession::restore(snapshot, config.commission_policy())
        .with_clock(config.civil_clock());
    if config.force_recalculate {
        session.recalculate();
    }

    let summary = session.summary();
    tracing::info!(
        total_quantity = %summary.total_quantity,
        active_lots = summary.active_lot_count,
        cost_value = %summary.cost_value,
        cheapest_cost = ?summary.cheapest_lot.as_ref().map(|l| l.unit_cost.to_canonical_string()),
        fingerprint = %session.state().fingerprint(),
        "Inventory"
    );

    session
        .snapshot()
        .write_to(&config.snapshot_path)
        .with_context(|| format!("writing snapshot {}", config.snapshot_path))?;
    Ok(())
}
