use anyhow::{bail, Context};
use clap::Parser;
use eagerql::config::EngineConfig;
use eagerql::executor::Dialect;
use eagerql::query_factory::{
    FindObjectsFromRawSqlQueryFactory, FindObjectsQueryFactory, MagicJoin, QueryFactory,
};
use eagerql::schema_catalog::SchemaConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// EagerQL - compile find requests against a YAML schema and print the SQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML schema file
    #[arg(long)]
    schema: PathBuf,

    /// Root table of the request
    #[arg(long)]
    table: String,

    /// Additional table to eager-fetch columns from (repeatable)
    #[arg(long = "fetch")]
    fetch: Vec<String>,

    /// SQL filter expression
    #[arg(long, default_value = "")]
    filter: String,

    /// ORDER BY list, without the keywords
    #[arg(long, default_value = "")]
    order_by: String,

    /// Caller-written FROM clause (switches to the raw variant)
    #[arg(long)]
    from: Option<String>,

    /// Caller-written count query, for raw FROM clauses that GROUP BY
    #[arg(long)]
    count_sql: Option<String>,

    /// SQL dialect (defaults to EAGERQL_NATIVE_DIALECT, then mysql)
    #[arg(long)]
    dialect: Option<Dialect>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to WARN level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("Configuration error")?;
    let dialect = cli.dialect.unwrap_or(config.native_dialect);

    let schema = SchemaConfig::from_yaml_file(&cli.schema)
        .and_then(|c| c.to_schema())
        .with_context(|| format!("Failed to load schema from {}", cli.schema.display()))?;
    let analyzer = Arc::new(config.analyzer(Arc::new(schema)));
    let magic_join = MagicJoin::new(Arc::clone(&analyzer), dialect);

    let factory: Box<dyn QueryFactory> = match cli.from {
        Some(from) => {
            if !cli.fetch.is_empty() {
                bail!("--fetch cannot be combined with --from");
            }
            let mut factory =
                FindObjectsFromRawSqlQueryFactory::new(analyzer, dialect, cli.table, from)
                    .with_filter(cli.filter)
                    .with_order_by(cli.order_by);
            if let Some(count_sql) = cli.count_sql {
                factory = factory.with_count_sql(count_sql);
            }
            Box::new(factory)
        }
        None => Box::new(
            FindObjectsQueryFactory::new(analyzer, dialect, cli.table)
                .with_additional_tables(cli.fetch)
                .with_filter(cli.filter)
                .with_order_by(cli.order_by),
        ),
    };

    let compiled = factory.compiled()?;
    println!("-- rows\n{};\n", magic_join.expand(&compiled.magic_sql)?);
    println!("-- count\n{};\n", magic_join.expand(&compiled.magic_sql_count)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&compiled.column_descriptors)?
    );
    Ok(())
}
