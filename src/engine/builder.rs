use std::time::Duration;

use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{error, info};

use super::lifecycle::{LifecycleEngine, TicketSeed};
use crate::catalog::{self, Category};
use crate::content::{CommentGenerator, DescriptionGenerator};
use crate::dates::{self, DateRange};
use crate::error::GeneratorError;
use crate::oracle::SignalSource;
use crate::ticket::{Ticket, ticket_id};
use crate::workflow::{Workflow, WorkflowSet};

/// Receives batch progress. Fire-and-forget.
pub trait ProgressSink {
    fn category_started(&self, _category: &str, _count: usize) {}

    /// `done` and `total` are counted within `category`; failed tickets count as done.
    fn ticket_done(&self, done: usize, total: usize, category: &str);

    fn ticket_failed(&self, _ticket_id: &str, _error: &GeneratorError) {}
}

/// A ticket that could not be generated.
#[derive(Debug, Clone, Serialize)]
pub struct TicketFailure {
    pub ticket_id: String,
    pub category: String,
    pub error: String,
}

/// Outcome of a batch: tickets in generation order plus the ones that failed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub tickets: Vec<Ticket>,
    pub failures: Vec<TicketFailure>,
}

/// Per-category ticket counts, `floor(total * weight)` each.
pub fn plan_counts(catalog: &[Category], total: usize) -> Vec<(&Category, usize)> {
    catalog.iter().map(|c| (c, c.ticket_count(total))).collect()
}

/// Fans the lifecycle engine out over the whole catalog.
pub struct TicketSetBuilder<'a, W, S, P> {
    catalog: &'a [Category],
    workflows: &'a WorkflowSet,
    engine: LifecycleEngine<'a, W, S>,
    progress: &'a P,
    id_prefix: Option<String>,
    ticket_timeout: Option<Duration>,
}

impl<'a, W, S, P> TicketSetBuilder<'a, W, S, P>
where
    W: CommentGenerator + DescriptionGenerator,
    S: SignalSource,
    P: ProgressSink,
{
    pub fn new(
        catalog: &'a [Category],
        workflows: &'a WorkflowSet,
        writer: &'a W,
        oracle: &'a S,
        progress: &'a P,
    ) -> Self {
        Self {
            catalog,
            workflows,
            engine: LifecycleEngine::new(writer, oracle),
            progress,
            id_prefix: None,
            ticket_timeout: None,
        }
    }

    /// Prefixes every id, making ids unique across separately generated sets.
    pub fn with_id_prefix(mut self, prefix: Option<String>) -> Self {
        self.id_prefix = prefix;
        self
    }

    /// Abandons a ticket that takes longer than `timeout`.
    pub fn with_ticket_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ticket_timeout = timeout;
        self
    }

    /// Resolves every category's workflow up front so a bad reference fails
    /// before any ticket is generated.
    fn resolve_workflows(&self) -> Result<Vec<&'a Workflow>, GeneratorError> {
        self.catalog
            .iter()
            .map(|c| {
                self.workflows.resolve(c.workflow.as_deref()).ok_or_else(|| {
                    GeneratorError::Config(format!(
                        "category {} uses unknown workflow '{}'",
                        c.code,
                        c.workflow.as_deref().unwrap_or_default()
                    ))
                })
            })
            .collect()
    }

    /// Generates the whole set. Only configuration problems are returned as
    /// errors; a failing ticket is recorded in the report and skipped.
    pub async fn generate_all(
        &self,
        rng: &mut StdRng,
        total: usize,
        range: DateRange,
    ) -> Result<BatchReport, GeneratorError> {
        catalog::validate_catalog(self.catalog).map_err(GeneratorError::Config)?;
        let workflows = self.resolve_workflows()?;
        let mut report = BatchReport::default();

        for ((category, count), workflow) in plan_counts(self.catalog, total).into_iter().zip(workflows) {
            info!(category = %category.name, count, workflow = %workflow.name, "generating tickets");
            self.progress.category_started(&category.name, count);

            let open_dates = dates::allocate_open_dates(rng, count, range);
            for (i, open_date) in open_dates.into_iter().enumerate() {
                let id = ticket_id(self.id_prefix.as_deref(), &category.code, i + 1);
                let seed = TicketSeed {
                    id: &id,
                    category,
                    workflow,
                    open_date,
                };

                match self.run_one(rng, seed).await {
                    Ok(ticket) => report.tickets.push(ticket),
                    Err(e) => {
                        error!(ticket = %id, error = %e, "ticket generation failed");
                        self.progress.ticket_failed(&id, &e);
                        report.failures.push(TicketFailure {
                            ticket_id: id.clone(),
                            category: category.name.clone(),
                            error: e.to_string(),
                        });
                    }
                }
                self.progress.ticket_done(i + 1, count, &category.name);
            }
        }

        info!(
            generated = report.tickets.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        Ok(report)
    }

    async fn run_one(&self, rng: &mut StdRng, seed: TicketSeed<'_>) -> Result<Ticket, GeneratorError> {
        match self.ticket_timeout {
            None => self.engine.run(rng, seed).await,
            Some(limit) => tokio::time::timeout(limit, self.engine.run(rng, seed))
                .await
                .unwrap_or_else(|_| {
                    Err(GeneratorError::Timeout {
                        ticket_id: seed.id.to_string(),
                        secs: limit.as_secs(),
                    })
                }),
        }
    }
}
