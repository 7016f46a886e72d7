//! Offline, deterministic text backend.
//!
//! Comments come from a table keyed by status label, with a per-role
//! fallback for statuses the table does not know. Placeholders:
//! `{ticket}`, `{category}`, `{status}`, `{description}`, `{action}` and
//! `{seq}` (number of comments already on the ticket, plus one).

use std::collections::HashMap;

use super::{CommentGenerator, CommentRequest, DescriptionGenerator};
use crate::workflow::StepRole;

pub struct TemplateWriter {
    by_status: HashMap<String, String>,
}

impl Default for TemplateWriter {
    fn default() -> Self {
        let by_status = [
            (
                "Open",
                "{ticket} opened by the line technician: {description}",
            ),
            (
                "Technical Analysis",
                "Technical analysis of {ticket}: the finding is confirmed and the affected \
                 assembly is quarantined pending further investigation.",
            ),
            (
                "Technical Analysis - validation",
                "Technical analysis reviewed and approved by the technical manager.",
            ),
            (
                "Calculation Analysis",
                "Calculation check performed; margins recomputed for the affected area.",
            ),
            (
                "Calculation Analysis - validation",
                "Calculation analysis approved by the calculation engineering manager.",
            ),
            (
                "Analysis & Calculation - workpackage validation",
                "Work package owner signed off all analyses for {ticket}.",
            ),
            (
                "Root-cause analysis",
                "Root cause identified for {ticket} and recorded in the investigation file.",
            ),
            (
                "Classification: Impact assessment (minor, major, critical)",
                "Impact assessed for {ticket}; classification recorded with justification.",
            ),
            (
                "Decision of corrective actions required",
                "Corrective actions are required; plan definition requested.",
            ),
            (
                "Correction Action Plan Definition",
                "Corrective action plan defined for {ticket}.",
            ),
            (
                "Closure",
                "All steps complete for {ticket}. Resolution summarised and ticket closed.",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { by_status }
    }
}

impl TemplateWriter {
    /// Adds or replaces the template for a status label.
    #[cfg(test)]
    pub fn with_template(mut self, status: &str, template: &str) -> Self {
        self.by_status
            .insert(status.to_string(), template.to_string());
        self
    }

    fn fallback(role: StepRole) -> &'static str {
        match role {
            StepRole::Generic => "{status} recorded for {ticket}.",
            StepRole::FirstAnalysis => "Initial analysis of {ticket}: {description}",
            StepRole::Expertise => "Expert review #{seq} for {ticket} ({category}).",
            StepRole::ActionPlan => "Corrective action plan defined for {ticket}.",
            StepRole::ActionExecution => "{action} carried out for {ticket}.",
            StepRole::ActionValidation => "{action} verified effective for {ticket}.",
        }
    }

    /// Fills `{ticket}`, `{category}`, `{status}`, `{description}`, `{action}`
    /// and `{seq}` in a single left-to-right pass, so inserted text is never
    /// rescanned. Unknown or unclosed braces are copied as they are.
    fn render(template: &str, req: &CommentRequest<'_>) -> String {
        let seq = (req.prior_comments.len() + 1).to_string();
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            rest = &rest[start..];
            let filled = rest.find('}').and_then(|end| {
                let value = match &rest[1..end] {
                    "ticket" => req.ticket_id,
                    "category" => req.category_name,
                    "status" => req.step.status.as_str(),
                    "description" => req.description,
                    "action" => req.action.unwrap_or(""),
                    "seq" => seq.as_str(),
                    _ => return None,
                };
                Some((value, end))
            });
            match filled {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl CommentGenerator for TemplateWriter {
    async fn comment(&self, req: &CommentRequest<'_>) -> anyhow::Result<String> {
        // Per-action steps always need the action id in the text.
        let template = if req.step.role.is_per_action() {
            Self::fallback(req.step.role)
        } else {
            self.by_status
                .get(&req.step.status)
                .map(String::as_str)
                .unwrap_or_else(|| Self::fallback(req.step.role))
        };
        Ok(Self::render(template, req))
    }
}

impl DescriptionGenerator for TemplateWriter {
    async fn describe(&self, category_name: &str, hint: &str) -> anyhow::Result<String> {
        Ok(format!(
            "{hint}. Finding raised on the A220 assembly line and logged under {category_name}."
        ))
    }
}
