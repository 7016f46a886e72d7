mod catalog;
mod cli;
mod config;
mod content;
mod dates;
mod engine;
mod error;
mod export;
mod llm;
mod oracle;
mod ticket;
mod ui;
mod workflow;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use config::{Backend, GeneratorConfig};
use content::{CommentGenerator, DescriptionGenerator, LlmWriter, TemplateWriter};
use engine::TicketSetBuilder;
use oracle::{OfflineSignal, SignalSource};
use workflow::WorkflowSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "ncgen=debug" } else { "ncgen=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = GeneratorConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.command {
        Command::Generate {
            total,
            start,
            end,
            backend,
            model,
            max_retries,
            json,
            csv,
        } => {
            if let Some(total) = total {
                config.total_tickets = total;
            }
            if let Some(start) = start {
                config.start_date = start;
            }
            if let Some(end) = end {
                config.end_date = end;
            }
            if let Some(backend) = backend {
                config.backend = backend;
            }
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(max_retries) = max_retries {
                config.max_retries = max_retries;
            }
            if let Some(json) = json {
                config.json_output = json;
            }
            if let Some(csv) = csv {
                config.csv_output = csv;
            }
            generate(&config).await
        }
        Command::Catalog { total } => {
            let workflows = config.validate()?;
            ui::print_catalog(
                &config.categories,
                total.unwrap_or(config.total_tickets),
                workflows.default_name(),
            );
            Ok(())
        }
        Command::Workflow { name } => {
            let workflows = config.validate()?;
            let workflow = workflows.resolve(name.as_deref()).with_context(|| {
                format!(
                    "unknown workflow '{}' (known: {})",
                    name.as_deref().unwrap_or_default(),
                    workflows.names().collect::<Vec<_>>().join(", ")
                )
            })?;
            ui::print_workflow(workflow);
            Ok(())
        }
    }
}

async fn generate(config: &GeneratorConfig) -> anyhow::Result<()> {
    let workflows = config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        total = config.total_tickets,
        backend = ?config.backend,
        seed = ?config.seed,
        "starting generation"
    );

    match config.backend {
        Backend::Template => {
            let writer = TemplateWriter::default();
            run_generation(config, &workflows, &writer, &OfflineSignal, &mut rng).await
        }
        Backend::Llm => {
            let client = llm::ChatClient::with_base_url(config.api_key.clone(), config.base_url.clone())?;
            let mut writer =
                LlmWriter::new(client, config.model.clone(), config.temperature, config.retry_policy());
            if let Some(seed) = config.seed {
                writer = writer.with_seed(seed);
            }
            run_generation(config, &workflows, &writer, &writer, &mut rng).await
        }
    }
}

async fn run_generation<W, S>(
    config: &GeneratorConfig,
    workflows: &WorkflowSet,
    writer: &W,
    oracle: &S,
    rng: &mut StdRng,
) -> anyhow::Result<()>
where
    W: CommentGenerator + DescriptionGenerator,
    S: SignalSource,
{
    let range = config.date_range()?;
    let planned = engine::plan_counts(&config.categories, config.total_tickets)
        .iter()
        .map(|(_, n)| n)
        .sum();
    let progress = ui::BatchProgress::start(planned);

    let report = TicketSetBuilder::new(&config.categories, workflows, writer, oracle, &progress)
        .with_id_prefix(config.id_prefix.clone())
        .with_ticket_timeout(config.ticket_timeout_secs.map(Duration::from_secs))
        .generate_all(rng, config.total_tickets, range)
        .await?;

    export::write_json(&config.json_output, &report.tickets)
        .with_context(|| format!("writing {}", config.json_output.display()))?;
    let rows = export::write_csv(&config.csv_output, &report.tickets)
        .with_context(|| format!("writing {}", config.csv_output.display()))?;

    progress.finish(
        &report,
        &[
            format!("{} ({} tickets)", config.json_output.display(), report.tickets.len()),
            format!("{} ({rows} rows)", config.csv_output.display()),
        ],
    );
    Ok(())
}
