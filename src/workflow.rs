//! Workflow definitions: the ordered statuses a ticket walks through.
//!
//! A workflow is plain data. Which steps repeat, which are optional, and
//! which ones feed the action plan are all carried by [`WorkflowStep`], so
//! the lifecycle engine has a single code path for every workflow.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Mandatory,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Once,
    Many,
}

/// What a step means to the engine, independent of its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    #[default]
    Generic,
    /// First technical analysis; its first comment feeds the complexity estimate.
    FirstAnalysis,
    /// Specialist input repeated according to estimated complexity.
    Expertise,
    /// Defines the corrective action plan and sizes it.
    ActionPlan,
    /// One entry per planned action: the remediation work.
    ActionExecution,
    /// One entry per planned action: checking the remediation.
    ActionValidation,
}

impl StepRole {
    pub fn is_per_action(self) -> bool {
        matches!(self, StepRole::ActionExecution | StepRole::ActionValidation)
    }
}

impl fmt::Display for StepRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRole::Generic => write!(f, "generic"),
            StepRole::FirstAnalysis => write!(f, "first_analysis"),
            StepRole::Expertise => write!(f, "expertise"),
            StepRole::ActionPlan => write!(f, "action_plan"),
            StepRole::ActionExecution => write!(f, "action_execution"),
            StepRole::ActionValidation => write!(f, "action_validation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub status: String,
    pub kind: StepKind,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub role: StepRole,
    /// Who is writing at this step and what they should cover.
    pub instruction: String,
}

impl WorkflowStep {
    #[cfg(test)]
    pub fn is_mandatory_once(&self) -> bool {
        self.kind == StepKind::Mandatory && self.recurrence == Recurrence::Once
    }
}

/// A named, ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    #[cfg(test)]
    pub fn mandatory_once(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.steps.iter().filter(|s| s.is_mandatory_once())
    }

    /// Structural checks:
    /// - at least one step
    /// - `many` only on expertise and per-action steps, and those are never `once`
    /// - per-action steps come after an action plan step
    pub fn validate(&self) -> Result<(), String> {
        if self.steps.is_empty() {
            return Err(format!("workflow '{}' has no steps", self.name));
        }

        let mut plan_seen = false;
        for step in &self.steps {
            if step.status.trim().is_empty() {
                return Err(format!("workflow '{}' has a step without status", self.name));
            }
            let repeatable = matches!(
                step.role,
                StepRole::Expertise | StepRole::ActionExecution | StepRole::ActionValidation
            );
            match (step.recurrence, repeatable) {
                (Recurrence::Many, false) => {
                    return Err(format!(
                        "step '{}' repeats but its role '{}' has no repetition rule",
                        step.status, step.role
                    ));
                }
                (Recurrence::Once, true) => {
                    return Err(format!(
                        "step '{}' has role '{}' which must be recurrence = \"many\"",
                        step.status, step.role
                    ));
                }
                _ => {}
            }
            if step.role == StepRole::ActionPlan {
                if step.kind == StepKind::Optional {
                    return Err(format!("action plan step '{}' cannot be optional", step.status));
                }
                plan_seen = true;
            }
            if step.role.is_per_action() && !plan_seen {
                return Err(format!(
                    "step '{}' consumes actions but no action plan step precedes it",
                    step.status
                ));
            }
        }
        Ok(())
    }
}

fn step(
    status: &str,
    kind: StepKind,
    recurrence: Recurrence,
    role: StepRole,
    instruction: &str,
) -> WorkflowStep {
    WorkflowStep {
        status: status.to_string(),
        kind,
        recurrence,
        role,
        instruction: instruction.to_string(),
    }
}

/// Full A220 assembly-line non-conformity workflow.
pub fn standard_workflow() -> Vec<WorkflowStep> {
    use Recurrence::{Many, Once};
    use StepKind::{Mandatory, Optional};
    use StepRole::*;

    vec![
        step(
            "Open",
            Mandatory,
            Once,
            Generic,
            "You are the technician on the A220 assembly line who raised this ticket. \
             Describe what you observed in precise technical terms, with measurements \
             and locations where relevant.",
        ),
        step(
            "Technical Analysis",
            Mandatory,
            Once,
            FirstAnalysis,
            "You are the technical analyst. Analyse the reported issue using the \
             description and earlier comments: likely causes, affected systems and \
             immediate recommendations.",
        ),
        step(
            "Technical Analysis - expertise",
            Optional,
            Many,
            Expertise,
            "You are a domain expert called in on this ticket. Extend the analysis \
             with specialist insight without repeating what is already said.",
        ),
        step(
            "Technical Analysis - validation",
            Mandatory,
            Once,
            Generic,
            "You are the technical manager. Validate the analysis, raise any \
             concerns and state whether it is approved.",
        ),
        step(
            "Calculation Analysis",
            Mandatory,
            Once,
            Generic,
            "You are a stress and calculation engineer. Document the calculations \
             relevant to this issue and your findings.",
        ),
        step(
            "Calculation Analysis - expertise",
            Optional,
            Many,
            Expertise,
            "You are a senior calculation expert. Add specialised calculations or \
             cross-checks as needed.",
        ),
        step(
            "Calculation Analysis - validation",
            Mandatory,
            Once,
            Generic,
            "You are the calculation engineering manager. Approve the calculation \
             analysis or request further work.",
        ),
        step(
            "Analysis & Calculation - workpackage validation",
            Mandatory,
            Once,
            Generic,
            "You own the work package. Review every analysis so far and sign off, \
             adding any remarks.",
        ),
        step(
            "Root-cause analysis",
            Mandatory,
            Once,
            Generic,
            "Run a root-cause analysis and document the underlying cause.",
        ),
        step(
            "Classification: Impact assessment (minor, major, critical)",
            Mandatory,
            Once,
            Generic,
            "Assess the impact of the non-conformity and classify it as minor, \
             major or critical, with justification.",
        ),
        step(
            "Decision of corrective actions required",
            Mandatory,
            Once,
            Generic,
            "Decide which corrective actions are required and record the decision.",
        ),
        step(
            "Correction Action Plan Definition",
            Mandatory,
            Once,
            ActionPlan,
            "Define the corrective action plan, listing the concrete actions needed \
             to resolve the issue.",
        ),
        step(
            "Correction Action Plan Execution - per action",
            Mandatory,
            Many,
            ActionExecution,
            "Carry out the given corrective action and report progress, results and \
             any difficulties.",
        ),
        step(
            "Validation of corrective actions",
            Mandatory,
            Many,
            ActionValidation,
            "Verify that the given corrective action resolved its part of the issue \
             and record your approval.",
        ),
        step(
            "Closure",
            Mandatory,
            Once,
            Generic,
            "You are the final reviewer. Confirm every step is complete, summarise \
             the resolution and close the ticket.",
        ),
    ]
}

/// Five fixed statuses, no repetition. Used by lightweight categories.
pub fn short_workflow() -> Vec<WorkflowStep> {
    use Recurrence::Once;
    use StepKind::Mandatory;
    use StepRole::*;

    vec![
        step("Open", Mandatory, Once, Generic, "Report the issue as observed."),
        step(
            "Analysis",
            Mandatory,
            Once,
            FirstAnalysis,
            "Analyse the issue and identify its cause.",
        ),
        step(
            "Corrective Action",
            Mandatory,
            Once,
            Generic,
            "Describe the correction applied.",
        ),
        step(
            "Validation",
            Mandatory,
            Once,
            Generic,
            "Confirm the correction is effective.",
        ),
        step("Closure", Mandatory, Once, Generic, "Close the ticket with a summary."),
    ]
}

pub const DEFAULT_WORKFLOW: &str = "standard";

pub fn builtin_workflows() -> BTreeMap<String, Vec<WorkflowStep>> {
    BTreeMap::from([
        (DEFAULT_WORKFLOW.to_string(), standard_workflow()),
        ("short".to_string(), short_workflow()),
    ])
}

/// Validated, read-only table of named workflows.
#[derive(Debug, Clone)]
pub struct WorkflowSet {
    default: String,
    workflows: BTreeMap<String, Workflow>,
}

impl WorkflowSet {
    pub fn new(
        default: &str,
        definitions: BTreeMap<String, Vec<WorkflowStep>>,
    ) -> Result<Self, String> {
        let mut workflows = BTreeMap::new();
        for (name, steps) in definitions {
            let workflow = Workflow::new(name.clone(), steps);
            workflow.validate()?;
            workflows.insert(name, workflow);
        }
        if !workflows.contains_key(default) {
            return Err(format!("default workflow '{default}' is not defined"));
        }
        Ok(Self {
            default: default.to_string(),
            workflows,
        })
    }

    #[cfg(test)]
    pub fn builtin() -> Self {
        Self::new(DEFAULT_WORKFLOW, builtin_workflows()).unwrap()
    }

    pub fn get(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }

    /// The named workflow, or the default one for `None`.
    pub fn resolve(&self, name: Option<&str>) -> Option<&Workflow> {
        self.get(name.unwrap_or(&self.default))
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_workflows_are_valid() {
        for (name, steps) in builtin_workflows() {
            Workflow::new(name, steps).validate().unwrap();
        }
    }

    #[test]
    fn standard_workflow_shape() {
        let wf = Workflow::new("standard", standard_workflow());
        assert_eq!(wf.steps.len(), 15);
        assert_eq!(wf.mandatory_once().count(), 11);
        assert_eq!(wf.steps.first().unwrap().status, "Open");
        assert_eq!(wf.steps.last().unwrap().status, "Closure");
        assert_eq!(
            wf.steps.iter().filter(|s| s.role == StepRole::ActionPlan).count(),
            1
        );
    }

    #[test]
    fn short_workflow_is_five_fixed_steps() {
        let wf = Workflow::new("short", short_workflow());
        assert_eq!(wf.steps.len(), 5);
        assert_eq!(wf.mandatory_once().count(), 5);
    }

    #[test]
    fn rejects_empty_workflow() {
        let err = Workflow::new("empty", vec![]).validate().unwrap_err();
        assert!(err.contains("no steps"));
    }

    #[test]
    fn rejects_per_action_step_before_plan() {
        let mut steps = standard_workflow();
        // Move the plan definition after its consumers.
        let plan = steps.remove(11);
        steps.insert(13, plan);
        let err = Workflow::new("bad", steps).validate().unwrap_err();
        assert!(err.contains("no action plan"));
    }

    #[test]
    fn rejects_generic_repeatable_step() {
        let mut steps = short_workflow();
        steps[2].recurrence = Recurrence::Many;
        let err = Workflow::new("bad", steps).validate().unwrap_err();
        assert!(err.contains("no repetition rule"));
    }

    #[test]
    fn rejects_expertise_once() {
        let mut steps = standard_workflow();
        steps[2].recurrence = Recurrence::Once;
        assert!(Workflow::new("bad", steps).validate().is_err());
    }

    #[test]
    fn step_deserializes_with_default_role() {
        let toml_str = r#"
            status = "Open"
            kind = "mandatory"
            recurrence = "once"
            instruction = "Report it."
        "#;
        let step: WorkflowStep = toml::from_str(toml_str).unwrap();
        assert_eq!(step.role, StepRole::Generic);
        assert!(step.is_mandatory_once());
    }

    #[test]
    fn workflow_set_resolves_default_and_named() {
        let set = WorkflowSet::builtin();
        assert_eq!(set.default_name(), "standard");
        assert_eq!(set.resolve(None).unwrap().steps.len(), 15);
        assert_eq!(set.resolve(Some("short")).unwrap().steps.len(), 5);
        assert!(set.resolve(Some("missing")).is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["short", "standard"]);
    }

    #[test]
    fn workflow_set_requires_default() {
        let err = WorkflowSet::new("nope", builtin_workflows()).unwrap_err();
        assert!(err.contains("nope"));
    }

    #[test]
    fn workflow_set_validates_members() {
        let mut defs = builtin_workflows();
        defs.insert("empty".into(), vec![]);
        assert!(WorkflowSet::new(DEFAULT_WORKFLOW, defs).is_err());
    }

    #[test]
    fn role_display() {
        assert_eq!(StepRole::ActionExecution.to_string(), "action_execution");
        assert_eq!(StepRole::FirstAnalysis.to_string(), "first_analysis");
    }
}
