//! One grading run, from archives to summary.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use ios_config_core::{diff_with_options, format_lines, DiffOptions, ParseError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::addr::parse_ipv4;
use crate::archive::{load_archive, load_optional_archive, ArchiveError, LoadedArchive};
use crate::checks::{
    evaluate_topology, missing_device, run_checks, unparsable_device, CheckContext, CheckResult,
    CheckScope,
};
use crate::identity::{is_personal_literal, AddressRewriter, IdentityError, IdentityHint};
use crate::matcher::{match_devices, DeviceIdentity};
use crate::neighbors::parse_ospf_neighbors;
use crate::normalize::{parse_device, ParsedDevice};
use crate::profile::{ProfileLoadError, ProfileSet};
use crate::scoring::{aggregate, round_half_up, AggregationError};
use crate::summary::{CheckSummary, DeviceStatus, DeviceSummary, GradingSummary};
use crate::topology::{build_edges, component_count, describe, expected_neighbors};

#[derive(Debug, Error)]
pub enum GradeError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("master configuration {device} could not be parsed: {source}")]
    MasterParse { device: String, source: ParseError },
    #[error(transparent)]
    Profile(#[from] ProfileLoadError),
    #[error("failed to compute the final score: {0}")]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    InvalidHint(#[from] IdentityError),
}

/// Files and options for one run.
#[derive(Debug, Clone, Default)]
pub struct GradeRequest {
    pub master: PathBuf,
    pub student: PathBuf,
    pub master_neighbors: Option<PathBuf>,
    pub student_neighbors: Option<PathBuf>,
    /// The student's prefix, e.g. `212.05`.
    pub hint: String,
    /// Prefix to rewrite personal addresses onto instead of the hint.
    pub master_prefix: Option<String>,
    /// Assignment type; detected when absent.
    pub assignment: Option<String>,
    /// Profiles file replacing the built-in profiles.
    pub profiles: Option<PathBuf>,
}

/// Already loaded inputs for one run.
#[derive(Debug, Clone, Copy)]
pub struct GradeInputs<'a> {
    pub master: &'a LoadedArchive,
    pub student: &'a LoadedArchive,
    pub master_neighbors: &'a LoadedArchive,
    pub student_neighbors: &'a LoadedArchive,
    pub hint: &'a str,
    pub master_prefix: Option<&'a str>,
    pub assignment: Option<&'a str>,
    pub profiles: &'a ProfileSet,
}

/// A submitted device: parsed, or the reason it could not be.
#[derive(Debug)]
enum Submission {
    Parsed(ParsedDevice),
    Failed(ParseError),
}

impl DeviceIdentity for ParsedDevice {
    fn hostname(&self) -> Option<&str> {
        self.config.hostname.as_deref()
    }
}

impl DeviceIdentity for Submission {
    fn hostname(&self) -> Option<&str> {
        match self {
            Submission::Parsed(device) => device.hostname(),
            Submission::Failed(_) => None,
        }
    }
}

/// Load the archives named in `request` and grade them.
pub fn grade(request: &GradeRequest) -> Result<GradingSummary, GradeError> {
    IdentityHint::parse(&request.hint)?;
    let profiles = match &request.profiles {
        Some(path) => ProfileSet::load(path)?,
        None => ProfileSet::embedded()?,
    };
    let master = load_archive(&request.master)?;
    let student = load_archive(&request.student)?;
    let master_neighbors = load_optional_archive(request.master_neighbors.as_deref())?;
    let student_neighbors = load_optional_archive(request.student_neighbors.as_deref())?;

    grade_archives(GradeInputs {
        master: &master,
        student: &student,
        master_neighbors: &master_neighbors,
        student_neighbors: &student_neighbors,
        hint: &request.hint,
        master_prefix: request.master_prefix.as_deref(),
        assignment: request.assignment.as_deref(),
        profiles: &profiles,
    })
}

/// Grade loaded archives.
pub fn grade_archives(inputs: GradeInputs<'_>) -> Result<GradingSummary, GradeError> {
    let hint = IdentityHint::parse(inputs.hint)?;
    let rewriter = AddressRewriter::new(&hint, inputs.master_prefix)?;

    let mut masters = BTreeMap::new();
    for (id, text) in &inputs.master.devices {
        let device = parse_device(text, &rewriter).map_err(|source| GradeError::MasterParse {
            device: id.clone(),
            source,
        })?;
        masters.insert(id.clone(), device);
    }

    let mut students = BTreeMap::new();
    for (id, text) in &inputs.student.devices {
        let submission = match parse_device(text, &rewriter) {
            Ok(device) => Submission::Parsed(device),
            Err(err) => {
                warn!(file = %id, error = %err, "student configuration could not be parsed");
                Submission::Failed(err)
            }
        };
        students.insert(id.clone(), submission);
    }

    let profile = inputs.profiles.detect(
        inputs.assignment,
        &inputs.master.name,
        masters.values().map(|d| &d.config),
    )?;
    debug!(assignment = %profile.name, "assignment selected");

    let master_addresses: BTreeSet<Ipv4Addr> = masters
        .values()
        .flat_map(|d| d.literals.iter())
        .filter_map(|lit| parse_ipv4(lit))
        .collect();
    let personal_space = inputs.master_prefix.is_some_and(|p| !p.trim().is_empty())
        || masters
            .values()
            .flat_map(|d| d.literals.iter())
            .any(|lit| is_personal_literal(lit));
    let scope = CheckScope {
        hint: &hint,
        personal_space,
        master_addresses: &master_addresses,
        static_routes_graded: profile.weight("static_routes") > 0,
    };

    let master_edges = build_edges(masters.iter().map(|(id, d)| (id.as_str(), &d.config)));
    let master_configs: BTreeMap<String, _> =
        masters.iter().map(|(id, d)| (id.clone(), &d.config)).collect();
    let mut expected = expected_neighbors(&master_configs, &master_edges);
    for id in masters.keys() {
        if let Some(table) = neighbor_table(inputs.master_neighbors, &[id.as_str()], &hint) {
            expected.insert(id.clone(), parse_ospf_neighbors(table, &rewriter));
        }
    }
    let no_neighbors = BTreeSet::new();

    let outcome = match_devices(&masters, &students, &hint);
    let mut notes: Vec<String> = outcome.notes.iter().map(ToString::to_string).collect();
    for id in &inputs.master.duplicates {
        warn!(file = %id, "duplicate master configuration ignored");
        notes.push(format!("master archive contains {id} more than once; later copy ignored"));
    }
    for id in &inputs.student.duplicates {
        notes.push(format!("student archive contains {id} more than once; later copy ignored"));
    }
    for id in &outcome.extra {
        warn!(file = %id, "submission matches no master device");
        notes.push(format!("{id}: does not match any master device"));
    }

    let mut results: Vec<CheckResult> = Vec::new();
    let mut devices = BTreeMap::new();
    let mut student_configs = BTreeMap::new();

    for pair in &outcome.pairs {
        let master = pair.master;
        let device_results = match pair.student {
            Submission::Parsed(student) => {
                let student_table = neighbor_table(
                    inputs.student_neighbors,
                    &[pair.student_id, pair.device],
                    &hint,
                )
                .map(|table| parse_ospf_neighbors(table, &rewriter));
                let ctx = CheckContext {
                    scope: &scope,
                    device: pair.device,
                    master,
                    student,
                    expected_neighbors: expected.get(pair.device).unwrap_or(&no_neighbors),
                    student_neighbors: student_table.as_ref(),
                };
                let device_results = run_checks(&ctx);
                student_configs.insert(pair.device.to_string(), &student.config);
                devices.insert(
                    pair.device.to_string(),
                    DeviceSummary {
                        status: DeviceStatus::Graded,
                        student_file: Some(pair.student_id.to_string()),
                        score: None,
                        error: None,
                        unparsed_lines: student.unparsed.clone(),
                        diff: format_lines(&diff_with_options(
                            &master.tree,
                            &student.tree,
                            &DiffOptions::ios(),
                        )),
                    },
                );
                device_results
            }
            Submission::Failed(err) => {
                devices.insert(
                    pair.device.to_string(),
                    DeviceSummary {
                        status: DeviceStatus::Unparsable,
                        student_file: Some(pair.student_id.to_string()),
                        score: None,
                        error: Some(err.to_string()),
                        unparsed_lines: Vec::new(),
                        diff: Vec::new(),
                    },
                );
                unparsable_device(pair.device, master, &scope, &err.to_string())
            }
        };
        results.extend(device_results);
    }

    for id in &outcome.missing {
        if let Some(master) = masters.get(*id) {
            results.extend(missing_device(id, master, &scope));
        }
        devices.insert(
            id.to_string(),
            DeviceSummary {
                status: DeviceStatus::Missing,
                student_file: None,
                score: None,
                error: None,
                unparsed_lines: Vec::new(),
                diff: Vec::new(),
            },
        );
    }

    let student_edges = build_edges(student_configs.iter().map(|(id, c)| (id.as_str(), *c)));
    // Missing devices show up as missing links, not as a partition.
    if let Some(result) = evaluate_topology(
        &master_edges,
        &student_edges,
        component_count(masters.keys().map(String::as_str), &master_edges),
        component_count(student_configs.keys().map(String::as_str), &student_edges),
    ) {
        results.push(result);
    }

    let board = aggregate(&results, profile).map_err(|err| {
        error!(error = %err, assignment = %profile.name, "score aggregation failed");
        GradeError::Aggregation(err)
    })?;

    for (id, summary) in devices.iter_mut() {
        summary.score = board.devices.get(id).copied().flatten().map(round_half_up);
        if let Some(pair) = outcome.pairs.iter().find(|p| p.device == id.as_str()) {
            info!(
                device = %id,
                file = %pair.student_id,
                score = ?summary.score,
                "graded submission"
            );
        }
    }

    Ok(GradingSummary {
        final_score: round_half_up(board.final_score),
        per_router: board
            .checks
            .iter()
            .map(|(name, score)| (name.clone(), CheckSummary::from(score)))
            .collect(),
        assignment_type: profile.name.clone(),
        num_devices: masters.len(),
        devices,
        unmatched_master: outcome.missing.iter().map(ToString::to_string).collect(),
        unmatched_student: outcome.extra.iter().map(ToString::to_string).collect(),
        notes,
        master_edges: describe(&master_edges),
        student_edges: describe(&student_edges),
    })
}

/// Neighbour output for a device: the first file named after one of
/// `candidates`, compared case-insensitively with the prefix stripped.
fn neighbor_table<'a>(
    archive: &'a LoadedArchive,
    candidates: &[&str],
    hint: &IdentityHint,
) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        archive
            .devices
            .iter()
            .find(|(id, _)| {
                id.eq_ignore_ascii_case(candidate)
                    || hint.strip_from(id).eq_ignore_ascii_case(candidate)
            })
            .map(|(_, text)| text.as_str())
    })
}

