use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use cuescout_core::{
    AppConfig, Coordinates, DiscoveryRequest, FilterSpec, RadiusFilter,
};
use cuescout_db::PgStore;
use cuescout_discovery::{DiscoveryCoordinator, DiscoveryOutcome};
use cuescout_geocode::{CachingGeocoder, NominatimClient};

#[derive(Debug, Parser)]
#[command(name = "cuescout")]
#[command(about = "Pool tournament discovery engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one discovery query against the tournament store.
    Discover(DiscoverArgs),
    /// Geocode a free-text address through the configured provider.
    Geocode { address: String },
    /// Apply pending database migrations.
    Migrate,
    /// Verify database connectivity.
    Ping,
}

#[derive(Debug, Args)]
struct DiscoverArgs {
    /// Substring match on the tournament name.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    game_type: Option<String>,
    #[arg(long)]
    format: Option<String>,
    #[arg(long)]
    equipment: Option<String>,
    #[arg(long)]
    skill_level: Option<String>,
    /// Inclusive lower bound on the scheduled date (YYYY-MM-DD).
    #[arg(long)]
    date_from: Option<String>,
    /// Inclusive upper bound on the scheduled date (YYYY-MM-DD).
    #[arg(long)]
    date_to: Option<String>,
    /// Inclusive upper bound on the entry fee, e.g. 25.00.
    #[arg(long)]
    max_entry_fee: Option<String>,
    /// Tri-state: omit to ignore, pass true/false to filter.
    #[arg(long)]
    reports_to_fargo: Option<bool>,
    #[arg(long)]
    handicapped: Option<bool>,
    /// Reference latitude; requires --lng and --radius.
    #[arg(long)]
    lat: Option<f64>,
    /// Reference longitude; requires --lat and --radius.
    #[arg(long)]
    lng: Option<f64>,
    /// Radius in miles around the reference point.
    #[arg(long)]
    radius: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = cuescout_core::load_app_config_from_env()?;
    init_tracing(&config);
    tracing::debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::Discover(args) => discover(&config, args).await,
        Commands::Geocode { address } => geocode(&config, &address).await,
        Commands::Migrate => migrate(&config).await,
        Commands::Ping => ping(&config).await,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn discover(config: &AppConfig, args: DiscoverArgs) -> anyhow::Result<()> {
    let request = build_request(&args)?;

    let pool = connect(config).await?;
    let store = PgStore::new(pool);
    let geocoder = CachingGeocoder::new(build_client(config)?);
    let coordinator = DiscoveryCoordinator::new(store, geocoder);

    let outcome = coordinator.discover(&request).await?;
    match outcome {
        DiscoveryOutcome::Fresh(hits) => {
            if hits.is_empty() {
                println!("no tournaments matched");
                return Ok(());
            }
            for hit in &hits {
                let t = &hit.tournament;
                let location = match (hit.coordinates, hit.distance_miles) {
                    (Some(c), Some(d)) => format!("({:.4}, {:.4})  {d:.1} mi", c.lat, c.lng),
                    (Some(c), None) => format!("({:.4}, {:.4})", c.lat, c.lng),
                    _ => "location unresolved".to_string(),
                };
                println!(
                    "#{:<6} {}  {:<40} {:<12} {}",
                    t.id,
                    t.scheduled_date,
                    t.name,
                    t.game_type.as_deref().unwrap_or("-"),
                    location
                );
            }
            println!("{} tournament(s)", hits.len());
        }
        // Unreachable for a single CLI invocation; the coordinator supports
        // sessions with overlapping requests.
        DiscoveryOutcome::Superseded => println!("request superseded"),
    }
    Ok(())
}

async fn geocode(config: &AppConfig, address: &str) -> anyhow::Result<()> {
    let client = build_client(config)?;
    match client.search(address).await? {
        Some(coords) => println!("{address}\n  lat: {}\n  lng: {}", coords.lat, coords.lng),
        None => println!("{address}\n  no result"),
    }
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    cuescout_db::run_migrations(&pool)
        .await
        .context("running migrations")?;
    println!("migrations up to date");
    Ok(())
}

async fn ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    cuescout_db::ping(&pool).await.context("pinging database")?;
    println!("database reachable");
    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    cuescout_db::connect_pool(database_url, pool_config(config))
        .await
        .context("connecting to database")
}

fn pool_config(config: &AppConfig) -> cuescout_db::PoolConfig {
    cuescout_db::PoolConfig {
        max_connections: config.db_max_connections,
        min_connections: config.db_min_connections,
        acquire_timeout_secs: config.db_acquire_timeout_secs,
    }
}

fn build_client(config: &AppConfig) -> anyhow::Result<NominatimClient> {
    NominatimClient::with_base_url(
        &config.geocoder_base_url,
        config.geocoder_timeout_secs,
        config.geocoder_min_interval_ms,
        &config.geocoder_user_agent,
    )
    .context("building geocoder client")
}

fn build_request(args: &DiscoverArgs) -> anyhow::Result<DiscoveryRequest> {
    let filter = FilterSpec {
        search: args.search.clone(),
        game_type: args.game_type.clone(),
        format: args.format.clone(),
        equipment: args.equipment.clone(),
        skill_level: args.skill_level.clone(),
        date_from: args.date_from.as_deref().map(parse_date).transpose()?,
        date_to: args.date_to.as_deref().map(parse_date).transpose()?,
        max_entry_fee: args
            .max_entry_fee
            .as_deref()
            .map(|raw| {
                raw.parse::<Decimal>()
                    .with_context(|| format!("invalid entry fee \"{raw}\""))
            })
            .transpose()?,
        reports_to_fargo: args.reports_to_fargo,
        handicapped: args.handicapped,
    };

    let near = match (args.lat, args.lng, args.radius) {
        (None, None, None) => None,
        (Some(lat), Some(lng), Some(radius_miles)) => {
            let Some(origin) = Coordinates::checked(lat, lng) else {
                bail!("reference coordinates ({lat}, {lng}) are out of range");
            };
            if !radius_miles.is_finite() || radius_miles < 0.0 {
                bail!("radius must be a non-negative number of miles");
            }
            Some(RadiusFilter {
                origin,
                radius_miles,
            })
        }
        _ => bail!("--lat, --lng and --radius must be given together"),
    };

    Ok(DiscoveryRequest { filter, near })
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date \"{raw}\" (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> DiscoverArgs {
        DiscoverArgs {
            search: None,
            game_type: None,
            format: None,
            equipment: None,
            skill_level: None,
            date_from: None,
            date_to: None,
            max_entry_fee: None,
            reports_to_fargo: None,
            handicapped: None,
            lat: None,
            lng: None,
            radius: None,
        }
    }

    #[test]
    fn bare_args_build_an_empty_request() {
        let request = build_request(&base_args()).unwrap();
        assert_eq!(request.filter, FilterSpec::default());
        assert!(request.near.is_none());
    }

    #[test]
    fn radius_arguments_must_come_together() {
        let mut args = base_args();
        args.lat = Some(33.6598);
        assert!(build_request(&args).is_err());

        args.lng = Some(-112.1806);
        args.radius = Some(25.0);
        let request = build_request(&args).unwrap();
        let near = request.near.unwrap();
        assert!((near.origin.lat - 33.6598).abs() < 1e-9);
        assert!((near.radius_miles - 25.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_reference_is_rejected() {
        let mut args = base_args();
        args.lat = Some(91.0);
        args.lng = Some(0.0);
        args.radius = Some(10.0);
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn dates_and_fee_are_parsed() {
        let mut args = base_args();
        args.date_from = Some("2025-07-01".to_string());
        args.max_entry_fee = Some("25.00".to_string());
        let request = build_request(&args).unwrap();
        assert_eq!(
            request.filter.date_from,
            Some(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        );
        assert_eq!(request.filter.max_entry_fee, Some(Decimal::new(2500, 2)));
    }

    #[test]
    fn pool_settings_come_from_the_app_config() {
        let config = AppConfig {
            database_url: Some("postgres://localhost/cuescout".to_string()),
            log_level: "info".to_string(),
            db_max_connections: 4,
            db_min_connections: 2,
            db_acquire_timeout_secs: 7,
            geocoder_base_url: "http://127.0.0.1:8080".to_string(),
            geocoder_timeout_secs: 10,
            geocoder_min_interval_ms: 0,
            geocoder_user_agent: "cuescout-tests/0.1".to_string(),
        };
        let pool = pool_config(&config);
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 2);
        assert_eq!(pool.acquire_timeout_secs, 7);
    }

    #[test]
    fn bad_date_is_a_readable_error() {
        let mut args = base_args();
        args.date_to = Some("07/01/2025".to_string());
        let err = build_request(&args).unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }
}
