//! `mhub`: import marketplace exports and report on them.

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use mhub_analytics::{
    combine_daily, combine_hourly, combine_sku, combine_weekday, compare_periods, comparison_rows,
    forecast, goal_progress, growth_rates, marketplace_summaries, month_over_month,
    month_projection, monthly, product_metrics, totals, weekly, write_table, Dashboard, FlatTable,
    GoalMetric, Metric, DEFAULT_DELIMITER,
};
use mhub_core::{Config, Store};
use mhub_store::{MarketplaceHub, SqliteStore};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mhub", version, about = "Marketplace sales analytics")]
struct Args {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database; overrides the configured path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import one export file, replacing that marketplace's previous data.
    Import { file: PathBuf },
    /// List stored marketplaces.
    Status,
    /// Print totals, months, comparisons, forecast and goals.
    Report {
        /// Print the full dashboard document instead.
        #[arg(long)]
        json: bool,
    },
    /// Write one derived table.
    Export {
        #[arg(value_enum)]
        table: Table,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show or change goals.
    Goals {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Delete all imported data. Goals are kept.
    Clear,
}

#[derive(Debug, Subcommand)]
enum GoalAction {
    Show,
    Set { metric: String, value: f64 },
    Unset { metric: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Table {
    Daily,
    Monthly,
    Weekly,
    Products,
    Hourly,
    Weekday,
    Comparisons,
    Growth,
    Forecast,
    Dashboard,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(db) = &args.db {
        config.storage.db_path = db.display().to_string();
    }

    let backend = SqliteStore::open(&config.storage.db_path)
        .with_context(|| format!("opening database {}", config.storage.db_path))?;
    let mut hub = MarketplaceHub::new(backend, &config.storage);

    match args.command {
        Command::Import { file } => import(&mut hub, &config, &file),
        Command::Status => status(&hub, &config),
        Command::Report { json } => report(&hub, json),
        Command::Export { table, out } => export(&hub, table, out),
        Command::Goals { action } => goals(&mut hub, action),
        Command::Clear => {
            hub.clear_all().context("clearing data")?;
            println!("All marketplace data removed.");
            Ok(())
        }
    }
}

type Hub = MarketplaceHub<SqliteStore>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn display_name<'a>(config: &'a Config, id: &'a str) -> &'a str {
    config.marketplaces.get(id).map_or(id, |mp| mp.name.as_str())
}

fn import(hub: &mut Hub, config: &Config, file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let bundle = hub
        .import(&text)
        .with_context(|| format!("importing {}", file.display()))?;

    let range = bundle
        .meta
        .date_range
        .map(|[first, last]| format!("{first} .. {last}"))
        .unwrap_or_else(|| "no dated rows".to_string());
    println!(
        "{}: {} orders, {:.2} revenue, {} days ({range}), {} SKUs",
        display_name(config, &bundle.marketplace),
        bundle.meta.orders,
        bundle.meta.revenue,
        bundle.daily.len(),
        bundle.sku.len(),
    );
    Ok(())
}

fn status(hub: &Hub, config: &Config) -> anyhow::Result<()> {
    let store = hub.load_store()?;
    if store.is_empty() {
        println!("No data imported.");
        return Ok(());
    }
    for summary in marketplace_summaries(&store) {
        let imported = store
            .get(&summary.marketplace)
            .and_then(|b| b.imported_at)
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<12} {:>6} orders {:>12.2} revenue {:>4} days {:>5} SKUs  {imported}",
            display_name(config, &summary.marketplace),
            summary.totals.metrics.orders,
            summary.totals.metrics.revenue,
            summary.days,
            summary.skus,
        );
    }
    Ok(())
}

fn report(hub: &Hub, json: bool) -> anyhow::Result<()> {
    let store = hub.load_store()?;
    let goals = hub.goals()?;

    if json {
        println!("{}", Dashboard::build(&store, &goals, today()).to_json()?);
        return Ok(());
    }

    let daily = combine_daily(&store);
    if daily.is_empty() {
        println!("No data imported.");
        return Ok(());
    }
    let total = totals(&daily);
    let months = monthly(&daily);

    let m = &total.metrics;
    println!(
        "Revenue {:.2}  Orders {}  Units {}  Net {:.2}",
        m.revenue, m.orders, m.units, m.net
    );
    println!(
        "AOV {:.2}  Refund rate {:.1}%  Fees {:.2}  Net margin {:.1}%",
        total.avg_order_value,
        total.refund_rate * 100.0,
        total.total_fees,
        total.net_margin * 100.0
    );

    println!("\nMonths");
    for month in &months {
        println!(
            "  {:<8} {:>12.2} {:>6} orders  {:>2} days  {:>10.2}/day",
            month.label,
            month.totals.metrics.revenue,
            month.totals.metrics.orders,
            month.days,
            month.daily_avg_rev
        );
    }
    if let Some(mom) = month_over_month(&months) {
        let trend = |metric| match mom.change(metric) {
            Some(change) => format!("{:+.1}%", change * 100.0),
            None => "n/a".to_string(),
        };
        println!(
            "  {} vs {}: revenue {}  orders {}  net {}",
            mom.month,
            mom.previous,
            trend(Metric::Revenue),
            trend(Metric::Orders),
            trend(Metric::Net)
        );
    }

    println!("\nComparisons");
    for period in &compare_periods(&daily).periods {
        println!(
            "  {} ({} .. {} vs {} .. {})",
            period.period.label(),
            period.current.start,
            period.current.end,
            period.previous.start,
            period.previous.end
        );
        for (metric, delta) in &period.metrics {
            println!(
                "    {:<8} {:>12.2} {:>12.2} {:>+8.1}%",
                metric.name(),
                delta.current,
                delta.previous,
                delta.change * 100.0
            );
        }
    }

    let outlook = forecast(&months, today());
    if !outlook.points.is_empty() {
        println!("\nForecast (avg growth {:+.1}%)", outlook.avg_growth * 100.0);
        for point in &outlook.points {
            println!(
                "  {:<4} {:<8} {:>12.0} {:>8.0} orders",
                point.month, point.label, point.revenue, point.orders
            );
        }
    }

    let progress = goal_progress(&goals, &months, &total);
    if !progress.is_empty() {
        println!("\nGoals");
        for goal in &progress {
            println!(
                "  {:<16} {:>12.2} / {:>12.2}  {:>5.1}%  {:?}",
                goal.metric.key(),
                goal.current,
                goal.target,
                goal.progress * 100.0,
                goal.status
            );
        }
    }
    let revenue_goal = goals.get(GoalMetric::MonthlyRevenue.key());
    if let (Some(target), Some(latest)) = (revenue_goal, months.last()) {
        let p = month_projection(latest, *target);
        println!(
            "  projected {:.2} for {}, {} days left, {:.2}/day needed ({:+.1}%){}",
            p.projected_revenue,
            latest.label,
            p.days_left,
            p.required_daily,
            p.required_increase * 100.0,
            if p.on_track { ", on track" } else { "" }
        );
    }
    Ok(())
}

fn export(hub: &Hub, table: Table, out: Option<PathBuf>) -> anyhow::Result<()> {
    let store = hub.load_store()?;
    let writer: Box<dyn Write> = match &out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    write_export(&store, &hub.goals()?, table, writer)?;
    if let Some(path) = out {
        tracing::info!(path = %path.display(), ?table, "export written");
    }
    Ok(())
}

fn write_export(
    store: &Store,
    goals: &mhub_core::GoalConfig,
    table: Table,
    mut writer: Box<dyn Write>,
) -> anyhow::Result<()> {
    fn rows<T: FlatTable>(writer: Box<dyn Write>, rows: &[T]) -> anyhow::Result<()> {
        write_table(writer, rows, DEFAULT_DELIMITER)?;
        Ok(())
    }

    let daily = combine_daily(store);
    match table {
        Table::Daily => rows(writer, &daily),
        Table::Monthly => rows(writer, &monthly(&daily)),
        Table::Weekly => rows(writer, &weekly(&daily)),
        Table::Products => rows(writer, &product_metrics(&combine_sku(store))),
        Table::Hourly => rows(writer, &combine_hourly(store)),
        Table::Weekday => rows(writer, &combine_weekday(store)),
        Table::Comparisons => rows(writer, &comparison_rows(&compare_periods(&daily))),
        Table::Growth => rows(writer, &growth_rates(&monthly(&daily))),
        Table::Forecast => rows(writer, &forecast(&monthly(&daily), today()).points),
        Table::Dashboard => {
            let json = Dashboard::build(store, goals, today()).to_json()?;
            writeln!(writer, "{json}")?;
            Ok(())
        }
    }
}

fn goals(hub: &mut Hub, action: GoalAction) -> anyhow::Result<()> {
    match action {
        GoalAction::Show => {
            let goals = hub.goals()?;
            if goals.is_empty() {
                println!("No goals set.");
            }
            for (metric, target) in &goals {
                println!("{metric:<16} {target}");
            }
        }
        GoalAction::Set { metric, value } => {
            if !value.is_finite() || value < 0.0 {
                bail!("goal value must be a non-negative number");
            }
            if GoalMetric::from_key(&metric).is_none() {
                tracing::warn!(%metric, "not a tracked goal metric; stored anyway");
            }
            hub.set_goal(&metric, value)?;
            println!("{metric} = {value}");
        }
        GoalAction::Unset { metric } => {
            if !hub.unset_goal(&metric)? {
                println!("{metric} was not set.");
            }
        }
    }
    Ok(())
}
