//! LP Report Binary
//!
//! Reads the state file published by lp-engine and prints a ranked
//! position table followed by the portfolio summary.
//!
//! Usage:
//!   lp-report --state data/lp_state.json
//!   lp-report --sort net_effective_pct --desc --hide-zero
//!   lp-report --filter sword

use anyhow::{Context, Result};
use clap::Parser;
use lp_engine::ranking::format::{fmt_pct, fmt_share, fmt_vee};
use lp_engine::ranking::{view, SortDirection, ViewQuery};
use lp_engine::types::{Earn, MergedRecord};
use lp_engine::PublishedState;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lp-report")]
struct Args {
    /// Published state file
    #[arg(short, long, env = "LP_STATE_FILE", default_value = "data/lp_state.json")]
    state: PathBuf,

    /// Column to sort by (e.g. lp_apr, net_effective_pct, item_name)
    #[arg(long, default_value = "lp_apr")]
    sort: String,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Case-insensitive substring of the item name
    #[arg(long, default_value = "")]
    filter: String,

    /// Only show pairs with a non-zero LP share
    #[arg(long)]
    hide_zero: bool,

    /// Age in seconds after which the state is reported as stale
    #[arg(long, default_value_t = 300)]
    max_age_secs: i64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let state = PublishedState::read_from_file(&args.state)
        .with_context(|| format!("Cannot load {}; is lp-engine running?", args.state.display()))?;

    if state.is_stale(args.max_age_secs) {
        eprintln!(
            "WARNING: state is stale (last updated {}, older than {}s)",
            state.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
            args.max_age_secs
        );
    }

    let query = ViewQuery {
        filter: args.filter,
        hide_zero_share: args.hide_zero,
        sort_key: args.sort,
        direction: if args.desc { SortDirection::Desc } else { SortDirection::Asc },
    };
    let rows = view(&state.records, &query);

    println!(
        "Generation {} | updated {} | fee rate {:.2}%",
        state.generation,
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
        state.fee_rate * 100.0
    );
    println!();
    println!(
        "{:<22} {:>12} {:>14} {:>14} {:>10} {:>12} {:>12} {:>12}  {}",
        "Pair", "Price", "Vol 7d", "My VEE", "Share", "Fees 7d", "APR", "Net", "Band"
    );
    println!("{}", "-".repeat(132));

    for r in &rows {
        println!("{}", render_row(r));
    }
    if rows.is_empty() {
        println!("(no matching pairs)");
    }

    println!();
    print!("{}", state.summary.generate_report());
    println!(
        "Cycles: {} ok / {} failed / {} skipped ticks",
        state.stats.successful_cycles, state.stats.failed_cycles, state.stats.skipped_ticks
    );

    Ok(())
}

fn render_row(r: &MergedRecord) -> String {
    let mut name: String = r.display_name().chars().take(22).collect();
    if name.is_empty() {
        name = r.pair_address().short();
    }

    format!(
        "{:<22} {:>12} {:>14} {:>14} {:>10} {:>12} {:>12} {:>12}  {}",
        name,
        fmt_vee(Some(r.snapshot.price_vee)),
        fmt_vee(Some(r.snapshot.volume_7d())),
        fmt_vee(Some(r.user_vee)),
        fmt_share(r.lp_share),
        fmt_earn(r.lp_earn_vee_7d),
        fmt_pct(r.lp_apr),
        fmt_pct(r.net_effective_pct()),
        r.band
    )
}

/// Estimated figures are prefixed with `~`
fn fmt_earn(earn: Option<Earn>) -> String {
    match earn {
        Some(e) if e.is_reported() => fmt_vee(Some(e.value)),
        Some(e) => format!("~{}", fmt_vee(Some(e.value))),
        None => "-".to_string(),
    }
}
