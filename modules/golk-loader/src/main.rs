use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use golk_common::schema::SourceFile;
use golk_graph::loader::{load_steps, DEFAULT_BATCH_SIZE};
use golk_graph::migrate::constraint_statements;
use golk_graph::{migrate, BulkLoader, GraphClient, LoadPlan};

#[derive(Parser)]
#[command(name = "golk-load", about = "Load the GoLK source CSVs into Neo4j")]
struct Cli {
    #[arg(long, env = "NEO4J_URI", required_unless_present = "dry_run")]
    neo4j_uri: Option<String>,
    #[arg(long, env = "NEO4J_USER", required_unless_present = "dry_run")]
    neo4j_user: Option<String>,
    #[arg(
        long,
        env = "NEO4J_PASSWORD",
        hide_env_values = true,
        required_unless_present = "dry_run"
    )]
    neo4j_password: Option<String>,
    #[arg(long, env = "NEO4J_DATABASE")]
    neo4j_database: Option<String>,

    /// Prefix the server resolves CSV names against
    #[arg(long, default_value = "file:///")]
    file_root: String,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Key value to exclude from node imports (repeatable)
    #[arg(long = "skip-id")]
    skip_ids: Vec<String>,
    /// Replace a source file name, e.g. `--file restaurants.csv=restaurants_2024.csv`
    #[arg(long = "file", value_parser = parse_file_override)]
    files: Vec<(SourceFile, String)>,

    /// Create constraints and indexes, then stop
    #[arg(long)]
    constraints_only: bool,
    /// Print the statements without connecting
    #[arg(long)]
    dry_run: bool,
}

fn parse_file_override(raw: &str) -> Result<(SourceFile, String), String> {
    let (default, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected DEFAULT=NAME, got `{raw}`"))?;
    let source = SourceFile::ALL
        .into_iter()
        .find(|f| f.default_name().eq_ignore_ascii_case(default.trim()))
        .ok_or_else(|| format!("unknown source file `{default}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty file name for `{default}`"));
    }
    Ok((source, name.to_string()))
}

fn plan_from(cli: &Cli) -> LoadPlan {
    let plan = LoadPlan {
        file_root: cli.file_root.clone(),
        batch_size: cli.batch_size,
        ids_to_skip: cli.skip_ids.clone(),
        ..LoadPlan::default()
    };
    cli.files
        .iter()
        .fold(plan, |plan, (source, name)| plan.with_file(*source, name.clone()))
}

/// Added on top of `RUST_LOG`.
const LOG_DIRECTIVE: &str = "golk=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?))
        .init();

    let cli = Cli::parse();
    let plan = plan_from(&cli);

    if cli.dry_run {
        for cypher in constraint_statements() {
            println!("// constraint\n{cypher};\n");
        }
        for step in load_steps(&plan) {
            println!("// {}\n{};\n", step.description, step.cypher);
        }
        return Ok(());
    }

    let (Some(uri), Some(user), Some(password)) =
        (&cli.neo4j_uri, &cli.neo4j_user, &cli.neo4j_password)
    else {
        bail!("--neo4j-uri, --neo4j-user and --neo4j-password are required");
    };
    let client = GraphClient::connect(uri, user, password, cli.neo4j_database.as_deref())
        .await
        .context("Failed to connect to Neo4j")?;
    info!(uri = %uri, "Connected to Neo4j");

    migrate(&client).await.context("Failed to create constraints")?;
    if cli.constraints_only {
        info!("Constraints created, skipping data load");
        return Ok(());
    }

    let report = BulkLoader::new(client).run(&plan).await?;
    info!(
        steps = report.steps_executed,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Load finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec![
            "golk-load",
            "--neo4j-uri",
            "bolt://localhost:7687",
            "--neo4j-user",
            "neo4j",
            "--neo4j-password",
            "pw",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn file_override_matches_default_name() {
        let (source, name) = parse_file_override("restaurants.csv=restaurants_2024.csv").unwrap();
        assert_eq!(source, SourceFile::Restaurants);
        assert_eq!(name, "restaurants_2024.csv");
    }

    #[test]
    fn bad_file_overrides_are_rejected() {
        assert!(parse_file_override("restaurants.csv").is_err());
        assert!(parse_file_override("nope.csv=x.csv").is_err());
        assert!(parse_file_override("restaurants.csv= ").is_err());
    }

    #[test]
    fn flags_flow_into_the_plan() {
        let cli = cli(&[
            "--file-root",
            "https://data.example/csv/",
            "--batch-size",
            "500",
            "--skip-id",
            "Atlantis",
            "--skip-id",
            "El Dorado",
        ]);
        let plan = plan_from(&cli);
        assert_eq!(plan.file_root, "https://data.example/csv/");
        assert_eq!(plan.batch_size, 500);
        assert_eq!(plan.ids_to_skip, ["Atlantis", "El Dorado"]);
        assert!(!cli.dry_run);
    }

    #[test]
    fn log_directive_targets_golk_crates() {
        let directive: tracing_subscriber::filter::Directive = LOG_DIRECTIVE.parse().unwrap();
        assert_eq!(directive.to_string(), "golk=info");
    }

    #[test]
    fn dry_run_needs_no_connection_settings() {
        let cli = Cli::try_parse_from(["golk-load", "--dry-run", "--batch-size", "50"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(plan_from(&cli).batch_size, 50);
    }
}
