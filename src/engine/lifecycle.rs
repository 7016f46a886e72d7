use chrono::NaiveDate;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::catalog::Category;
use crate::content::{CommentGenerator, CommentRequest, DescriptionGenerator};
use crate::dates::{self, StepContext};
use crate::error::GeneratorError;
use crate::oracle::{self, SignalSource};
use crate::ticket::{StatusEntry, Ticket, action_label};
use crate::workflow::{Recurrence, StepKind, StepRole, Workflow, WorkflowStep};

/// What the engine needs to start one ticket.
#[derive(Debug, Clone, Copy)]
pub struct TicketSeed<'a> {
    pub id: &'a str,
    pub category: &'a Category,
    pub workflow: &'a Workflow,
    pub open_date: NaiveDate,
}

/// Mutable state carried through one ticket's walk.
///
/// Later steps read back what earlier steps left here: the expertise step
/// reads `first_analysis`, the per-action steps read `actions`.
#[derive(Debug, Clone)]
pub struct TicketState {
    pub clock: NaiveDate,
    pub comments: Vec<String>,
    pub history: Vec<StatusEntry>,
    pub first_analysis: Option<String>,
    pub actions: Vec<String>,
}

impl TicketState {
    pub fn new(open_date: NaiveDate) -> Self {
        Self {
            clock: open_date,
            comments: Vec::new(),
            history: Vec::new(),
            first_analysis: None,
            actions: Vec::new(),
        }
    }

    /// Appends an entry at the current clock and logs the comment.
    pub fn record(&mut self, status: String, comment: String) {
        self.history.push(StatusEntry {
            status,
            date: self.clock,
            comment: comment.clone(),
        });
        self.comments.push(comment);
    }

    /// Replaces the action plan with `Action 1 ..= Action n`.
    pub fn plan_actions(&mut self, n: u32) {
        self.actions = (1..=n).map(|i| format!("Action {i}")).collect();
    }
}

/// Walks a single ticket through its workflow.
pub struct LifecycleEngine<'a, W, S> {
    writer: &'a W,
    oracle: &'a S,
}

impl<'a, W, S> LifecycleEngine<'a, W, S>
where
    W: CommentGenerator + DescriptionGenerator,
    S: SignalSource,
{
    pub fn new(writer: &'a W, oracle: &'a S) -> Self {
        Self { writer, oracle }
    }

    /// Generates one complete ticket. Any description or comment failure
    /// aborts this ticket and discards its partial history.
    pub async fn run(
        &self,
        rng: &mut StdRng,
        seed: TicketSeed<'_>,
    ) -> Result<Ticket, GeneratorError> {
        let category = seed.category;
        let hint = category
            .labels
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(category.name.as_str());
        let description = self
            .writer
            .describe(&category.name, hint)
            .await
            .map_err(|e| GeneratorError::content(seed.id, "description", e))?;

        let mut state = TicketState::new(seed.open_date);

        for step in &seed.workflow.steps {
            if step.kind == StepKind::Optional && !rng.gen_bool(0.5) {
                debug!(ticket = seed.id, step = %step.status, "optional step skipped");
                continue;
            }

            let iterations = self.iterations(rng, step, &description, &state).await;
            let ctx = match step.role {
                StepRole::ActionExecution => StepContext::ActionExecution,
                StepRole::ActionValidation => StepContext::ActionValidation,
                _ => StepContext::Step,
            };

            for action in iterations {
                let label = match &action {
                    Some(a) => action_label(&step.status, a),
                    None => step.status.clone(),
                };
                let req = CommentRequest {
                    ticket_id: seed.id,
                    step,
                    category_name: &category.name,
                    description: &description,
                    prior_comments: &state.comments,
                    action: action.as_deref(),
                };
                let comment = self
                    .writer
                    .comment(&req)
                    .await
                    .map_err(|e| GeneratorError::content(seed.id, &label, e))?;

                if step.role == StepRole::FirstAnalysis && state.first_analysis.is_none() {
                    state.first_analysis = Some(comment.clone());
                }
                state.record(label, comment);
                state.clock = dates::advance(rng, state.clock, &category.delays, ctx);
            }

            if step.role == StepRole::ActionPlan {
                let n = oracle::estimate_action_count(self.oracle, rng, &state.comments).await;
                debug!(ticket = seed.id, actions = n, "action plan sized");
                state.plan_actions(n);
            }
        }

        Ok(Ticket {
            id: seed.id.to_string(),
            category: category.name.clone(),
            open_date: seed.open_date,
            initial_description: description,
            status_history: state.history,
        })
    }

    /// One element per entry to emit; per-action steps carry the action id.
    async fn iterations(
        &self,
        rng: &mut StdRng,
        step: &WorkflowStep,
        description: &str,
        state: &TicketState,
    ) -> Vec<Option<String>> {
        if step.recurrence == Recurrence::Once {
            return vec![None];
        }
        if step.role.is_per_action() {
            return state.actions.iter().cloned().map(Some).collect();
        }

        let first_analysis = state.first_analysis.as_deref().unwrap_or("");
        let complexity =
            oracle::estimate_complexity(self.oracle, rng, description, first_analysis).await;
        let n = if complexity == 1 {
            1
        } else {
            rng.gen_range(1..=complexity)
        };
        debug!(step = %step.status, complexity, repeats = n, "repeatable step sized");
        vec![None; n as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::content::TemplateWriter;
    use crate::dates::{DayWindow, DelayProfile};
    use crate::oracle::OfflineSignal;
    use crate::oracle::tests::FixedSignal;
    use crate::workflow::{WorkflowSet, short_workflow, standard_workflow};
    use rand::SeedableRng;
    use std::cell::RefCell;

    fn open_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 14).unwrap()
    }

    async fn run_with<W, S>(writer: &W, oracle: &S, workflow: &Workflow, rng_seed: u64) -> Result<Ticket, GeneratorError>
    where
        W: CommentGenerator + DescriptionGenerator,
        S: SignalSource,
    {
        let catalog = builtin_catalog();
        let engine = LifecycleEngine::new(writer, oracle);
        let mut rng = StdRng::seed_from_u64(rng_seed);
        engine
            .run(
                &mut rng,
                TicketSeed {
                    id: "MEC-0001",
                    category: &catalog[0],
                    workflow,
                    open_date: open_date(),
                },
            )
            .await
    }

    fn standard() -> Workflow {
        Workflow::new("standard", standard_workflow())
    }

    #[tokio::test]
    async fn mandatory_once_steps_appear_once_in_order() {
        let wf = standard();
        let expected: Vec<&str> = wf.mandatory_once().map(|s| s.status.as_str()).collect();
        for seed in 0..20 {
            let ticket = run_with(&TemplateWriter::default(), &OfflineSignal, &wf, seed)
                .await
                .unwrap();
            let seen: Vec<&str> = ticket
                .status_history
                .iter()
                .map(|e| e.status.as_str())
                .filter(|s| expected.contains(s))
                .collect();
            assert_eq!(seen, expected, "seed {seed}");
            assert!(ticket.status_history.len() >= expected.len());
        }
    }

    #[tokio::test]
    async fn dates_are_monotonic_from_open_date() {
        let wf = standard();
        for seed in 0..20 {
            let ticket = run_with(&TemplateWriter::default(), &OfflineSignal, &wf, seed)
                .await
                .unwrap();
            assert_eq!(ticket.status_history[0].date, ticket.open_date);
            for pair in ticket.status_history.windows(2) {
                assert!(pair[0].date <= pair[1].date, "seed {seed}: {pair:?}");
            }
        }
    }

    #[tokio::test]
    async fn per_action_steps_match_plan() {
        let wf = standard();
        let ticket = run_with(&TemplateWriter::default(), &FixedSignal("3"), &wf, 1)
            .await
            .unwrap();

        for base in [
            "Correction Action Plan Execution - per action",
            "Validation of corrective actions",
        ] {
            let labels: Vec<&str> = ticket
                .status_history
                .iter()
                .map(|e| e.status.as_str())
                .filter(|s| s.starts_with(base))
                .collect();
            assert_eq!(
                labels,
                vec![
                    format!("{base} - Action 1"),
                    format!("{base} - Action 2"),
                    format!("{base} - Action 3"),
                ]
            );
        }
    }

    #[tokio::test]
    async fn per_action_counts_follow_fallback_plan() {
        // Unusable answers: the plan size is a random draw, but both action
        // steps still agree with it.
        let wf = standard();
        for seed in 0..20 {
            let ticket = run_with(&TemplateWriter::default(), &FixedSignal("many"), &wf, seed)
                .await
                .unwrap();
            let exec = ticket
                .status_history
                .iter()
                .filter(|e| e.status.starts_with("Correction Action Plan Execution"))
                .count();
            let valid = ticket
                .status_history
                .iter()
                .filter(|e| e.status.starts_with("Validation of corrective actions - "))
                .count();
            assert!((1..=5).contains(&exec), "seed {seed}: {exec}");
            assert_eq!(exec, valid);
        }
    }

    #[tokio::test]
    async fn expertise_repeats_are_bounded_by_complexity() {
        let wf = standard();
        for (answer, max) in [("1", 1), ("3", 3)] {
            for seed in 0..20 {
                let ticket = run_with(&TemplateWriter::default(), &FixedSignal(answer), &wf, seed)
                    .await
                    .unwrap();
                for status in [
                    "Technical Analysis - expertise",
                    "Calculation Analysis - expertise",
                ] {
                    assert!(ticket.count_status(status) <= max);
                }
            }
        }
    }

    #[tokio::test]
    async fn optional_steps_are_sometimes_skipped() {
        let wf = standard();
        let mut with = 0;
        let mut without = 0;
        for seed in 0..40 {
            let ticket = run_with(&TemplateWriter::default(), &FixedSignal("1"), &wf, seed)
                .await
                .unwrap();
            match ticket.count_status("Technical Analysis - expertise") {
                0 => without += 1,
                1 => with += 1,
                n => panic!("complexity 1 allows one entry, got {n}"),
            }
        }
        assert!(with > 0 && without > 0);
    }

    #[tokio::test]
    async fn short_workflow_has_exactly_five_entries() {
        let wf = Workflow::new("short", short_workflow());
        let ticket = run_with(&TemplateWriter::default(), &OfflineSignal, &wf, 9)
            .await
            .unwrap();
        let statuses: Vec<&str> = ticket.status_history.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(
            statuses,
            vec!["Open", "Analysis", "Corrective Action", "Validation", "Closure"]
        );
    }

    /// Comments encode how many prior comments they were shown.
    struct Echo {
        first_analysis_seen: RefCell<Vec<String>>,
    }

    impl CommentGenerator for Echo {
        async fn comment(&self, req: &CommentRequest<'_>) -> anyhow::Result<String> {
            Ok(format!("c{}", req.prior_comments.len()))
        }
    }

    impl DescriptionGenerator for Echo {
        async fn describe(&self, _: &str, hint: &str) -> anyhow::Result<String> {
            Ok(hint.to_string())
        }
    }

    /// Records the first analysis each complexity call receives.
    struct Spy<'a>(&'a Echo);

    impl SignalSource for Spy<'_> {
        async fn complexity_signal(&self, _: &str, first: &str) -> Result<String, GeneratorError> {
            self.0.first_analysis_seen.borrow_mut().push(first.to_string());
            Ok("2".into())
        }

        async fn action_count_signal(&self, history: &[String]) -> Result<String, GeneratorError> {
            Ok(history.len().min(2).to_string())
        }
    }

    #[tokio::test]
    async fn comments_see_exactly_the_earlier_comments() {
        let echo = Echo {
            first_analysis_seen: RefCell::new(Vec::new()),
        };
        let spy = Spy(&echo);
        let wf = standard();
        let ticket = run_with(&echo, &spy, &wf, 4).await.unwrap();
        for (i, entry) in ticket.status_history.iter().enumerate() {
            assert_eq!(entry.comment, format!("c{i}"));
        }
        // Technical Analysis is the second entry, so its comment is "c1".
        for seen in echo.first_analysis_seen.borrow().iter() {
            assert_eq!(seen, "c1");
        }
        // The description is the hint itself.
        assert!(catalog_hint(&ticket.initial_description));
    }

    fn catalog_hint(text: &str) -> bool {
        builtin_catalog()[0].labels.iter().any(|l| l == text)
    }

    #[test]
    fn state_records_and_plans() {
        let mut state = TicketState::new(open_date());
        state.record("Open".into(), "raised".into());
        state.plan_actions(2);
        assert_eq!(state.history[0].date, open_date());
        assert_eq!(state.comments, vec!["raised".to_string()]);
        assert_eq!(state.actions, vec!["Action 1", "Action 2"]);
        state.plan_actions(1);
        assert_eq!(state.actions, vec!["Action 1"]);
    }

    /// Fails at one status label.
    struct FailAt(&'static str);

    impl CommentGenerator for FailAt {
        async fn comment(&self, req: &CommentRequest<'_>) -> anyhow::Result<String> {
            if req.step.status == self.0 {
                anyhow::bail!("backend down");
            }
            Ok("ok".into())
        }
    }

    impl DescriptionGenerator for FailAt {
        async fn describe(&self, _: &str, _: &str) -> anyhow::Result<String> {
            Ok("desc".into())
        }
    }

    #[tokio::test]
    async fn comment_failure_aborts_ticket() {
        let wf = standard();
        let err = run_with(&FailAt("Root-cause analysis"), &OfflineSignal, &wf, 2)
            .await
            .unwrap_err();
        match err {
            GeneratorError::ContentGeneration { ticket_id, stage, reason } => {
                assert_eq!(ticket_id, "MEC-0001");
                assert_eq!(stage, "Root-cause analysis");
                assert_eq!(reason, "backend down");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn plain_step(status: &str, recurrence: Recurrence, role: StepRole) -> WorkflowStep {
        WorkflowStep {
            status: status.into(),
            kind: StepKind::Mandatory,
            recurrence,
            role,
            instruction: String::new(),
        }
    }

    #[tokio::test]
    async fn clock_uses_category_window_for_each_context() {
        let category = Category {
            code: "TST".into(),
            name: "Timing".into(),
            labels: vec!["hint".into()],
            weight: 1.0,
            workflow: None,
            delays: DelayProfile {
                step: DayWindow::new(0, 0),
                execution: DayWindow::new(10, 10),
                validation: DayWindow::new(1, 1),
            },
        };
        let workflow = Workflow::new(
            "timing",
            vec![
                plain_step("Open", Recurrence::Once, StepRole::Generic),
                plain_step("Plan", Recurrence::Once, StepRole::ActionPlan),
                plain_step("Exec", Recurrence::Many, StepRole::ActionExecution),
                plain_step("Check", Recurrence::Many, StepRole::ActionValidation),
                plain_step("Closure", Recurrence::Once, StepRole::Generic),
            ],
        );
        let writer = TemplateWriter::default();
        let oracle = FixedSignal("2");
        let engine = LifecycleEngine::new(&writer, &oracle);
        let mut rng = StdRng::seed_from_u64(8);
        let ticket = engine
            .run(
                &mut rng,
                TicketSeed {
                    id: "TST-0001",
                    category: &category,
                    workflow: &workflow,
                    open_date: open_date(),
                },
            )
            .await
            .unwrap();

        let offsets: Vec<(&str, i64)> = ticket
            .status_history
            .iter()
            .map(|e| (e.status.as_str(), (e.date - open_date()).num_days()))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("Open", 0),
                ("Plan", 0),
                ("Exec - Action 1", 0),
                ("Exec - Action 2", 10),
                ("Check - Action 1", 20),
                ("Check - Action 2", 21),
                ("Closure", 22),
            ]
        );
    }

    #[tokio::test]
    async fn category_workflow_selection_is_data_driven() {
        let catalog = builtin_catalog();
        let set = WorkflowSet::builtin();
        let doc = catalog.iter().find(|c| c.code == "DOC").unwrap();
        let wf = set.resolve(doc.workflow.as_deref()).unwrap();
        assert_eq!(wf.name, "short");
    }
}
