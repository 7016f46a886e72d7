//! Category catalog: what kinds of non-conformity exist and how often each
//! one shows up in the generated set.

use serde::{Deserialize, Serialize};

use crate::dates::DelayProfile;

/// Allowed drift of the weight sum away from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// One non-conformity category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Short code used as the ticket id prefix ("MEC", "ELE"...).
    pub code: String,
    /// Display name written into every ticket.
    pub name: String,
    /// Incident hints used to seed descriptions.
    pub labels: Vec<String>,
    /// Share of the total ticket count, in [0, 1].
    pub weight: f64,
    /// Named workflow this category follows; `None` means the default one.
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub delays: DelayProfile,
}

impl Category {
    /// floor(total * weight). Truncation losses are not redistributed.
    pub fn ticket_count(&self, total: usize) -> usize {
        (total as f64 * self.weight).floor() as usize
    }
}

/// Checks codes, weights, labels and delay windows. Workflow references are
/// checked by whoever holds the workflow table.
pub fn validate_catalog(categories: &[Category]) -> Result<(), String> {
    if categories.is_empty() {
        return Err("category catalog is empty".into());
    }

    let mut seen = std::collections::HashSet::new();
    for cat in categories {
        if cat.code.trim().is_empty() {
            return Err(format!("category '{}' has an empty code", cat.name));
        }
        if !seen.insert(cat.code.as_str()) {
            return Err(format!("duplicate category code '{}'", cat.code));
        }
        if !(0.0..=1.0).contains(&cat.weight) {
            return Err(format!(
                "category {} weight {} is outside [0, 1]",
                cat.code, cat.weight
            ));
        }
        if cat.labels.is_empty() {
            return Err(format!("category {} has no label hints", cat.code));
        }
        cat.delays
            .validate()
            .map_err(|e| format!("category {}: {e}", cat.code))?;
    }

    let sum: f64 = categories.iter().map(|c| c.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(format!("category weights sum to {sum:.3}, expected 1.0"));
    }

    Ok(())
}

fn category(code: &str, name: &str, weight: f64, labels: &[&str]) -> Category {
    Category {
        code: code.to_string(),
        name: name.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        weight,
        workflow: None,
        delays: DelayProfile::default(),
    }
}

/// The built-in aircraft-manufacturing catalog.
pub fn builtin_catalog() -> Vec<Category> {
    let mut software = category(
        "LOG",
        "Software Non-Conformities",
        0.15,
        &[
            "Critical bug in the autopilot software",
            "Incompatibility between firmware versions",
            "Configuration error in the embedded system",
            "Abnormally long system response time",
            "System crash during execution of certain commands",
            "Insufficient memory causing slowdowns",
            "Error in navigation calculations",
            "Security issue in the embedded software",
            "Failed software update",
            "Missing functionality in the communication module",
        ],
    );
    software.delays = DelayProfile::slow();

    let mut documentation = category(
        "DOC",
        "Documentation Non-Conformities",
        0.10,
        &[
            "Missing user manual for a piece of equipment",
            "Obsolete procedure detected in the documentation",
            "Labeling error on components",
            "Inconsistency between diagram and text description",
            "Missing page in the technical report",
            "Poor translation in the provided documentation",
            "Incorrect reference to an industry standard",
            "Incomplete or erroneous table of contents",
            "Missing illustrations for some procedures",
            "Missing safety instructions in the manual",
        ],
    );
    documentation.workflow = Some("short".into());

    let mut safety = category(
        "SEC",
        "Safety Non-Conformities",
        0.05,
        &[
            "Missing personal protective equipment",
            "Unresolved hazard reported on site",
            "Safety procedure not followed by personnel",
            "Work area not meeting safety standards",
            "Safety incident reported without injury",
            "Insufficient or missing safety signage",
            "Safety training not completed by an employee",
            "First aid equipment not available",
            "Evacuation drill not conducted on time",
            "Improper use of hazardous equipment",
        ],
    );
    safety.delays = DelayProfile::fast();

    vec![
        category(
            "MEC",
            "Mechanical Non-Conformities",
            0.25,
            &[
                "Alignment defect detected during assembly",
                "Incorrect torque on the engine",
                "Damaged part identified during inspection",
                "Premature wear of a mechanical component",
                "Hydraulic leak detected in the system",
                "Excessive vibration observed during testing",
                "Premature corrosion on a metal part",
                "Structural deformation identified",
                "Balancing problem on a rotating part",
                "Overheating of a mechanical component",
            ],
        ),
        category(
            "ELE",
            "Electrical Non-Conformities",
            0.20,
            &[
                "Wiring error in the navigation system",
                "Defective connector causing signal loss",
                "Short circuit detected during electrical tests",
                "Faulty battery requiring replacement",
                "Anomaly in the power supply system",
                "Electromagnetic interference observed",
                "Grounding problem on a component",
                "Blown fuse during system activation",
                "Overvoltage detected in the main circuit",
                "Insulation defect on an electrical cable",
            ],
        ),
        software,
        documentation,
        category(
            "QUAL",
            "Quality Control Non-Conformities",
            0.15,
            &[
                "Incorrect measurements taken during inspection",
                "Incorrect calibration of a measuring instrument",
                "Missing quality control on a batch of parts",
                "Non-compliance with specified tolerances",
                "Improper application of control procedure",
                "Insufficient sampling for tests",
                "Incomplete quality control report",
                "ISO standard non-compliance detected",
                "Human error during visual inspection",
                "Non-compliance with the established control plan",
            ],
        ),
        category(
            "SUP",
            "Supply Chain Non-Conformities",
            0.10,
            &[
                "Late delivery of critical components",
                "Receipt of parts not meeting specifications",
                "Counterfeit components detected in the batch",
                "Error in the quantity of parts delivered",
                "Incomplete supplier documentation",
                "Supplier change without notification",
                "Recurrent quality issues with a supplier",
                "Non-compliance with packaging conditions",
                "Incorrect labeling on received batches",
                "Non-compliance with import regulations",
            ],
        ),
        safety,
    ]
}
