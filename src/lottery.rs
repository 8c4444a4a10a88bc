use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::collections::BTreeMap;

use seat_lottery::{
    run_lottery, run_lottery_grouped, Candidate, Group, LotteryError, PerCategory, QuotaConfig,
};

use crate::args::Args;
use crate::lottery::config_reader::*;
use crate::lottery::io_output::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_output;
pub mod io_xlsx;

pub use io_common::ParsedCandidate;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("No header row in {path}"))]
    EmptyInput { path: String },

    #[snafu(display("Missing required columns: {}", missing.join(", ")))]
    MissingColumns { missing: Vec<String> },
    #[snafu(display("Line {lineno}: cannot resolve the category of candidate {id:?}: {reason}"))]
    UnresolvedCategory {
        lineno: usize,
        id: String,
        reason: String,
    },

    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },

    #[snafu(display("Missing parameter {name} (on the command line or in the configuration file)"))]
    MissingParameter { name: String },
    #[snafu(display("Invalid seat count {entry:?}, expected TURMA=NUM"))]
    InvalidSeatOverride { entry: String },
    #[snafu(display("--vagas is required without --por-turma"))]
    MissingSeats {},
    #[snafu(display("Unknown input type {input_type:?} (expected csv or xlsx)"))]
    UnknownInputType { input_type: String },

    #[snafu(display("The draw could not be run"))]
    Lottery { source: LotteryError },
    #[snafu(display("Difference detected between the summary and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type CliResult<T> = Result<T, CliError>;

fn read_candidates(settings: &Settings) -> CliResult<Vec<ParsedCandidate>> {
    match settings.input_type {
        InputType::Csv => io_csv::read_csv_candidates(&settings.input),
        InputType::Xlsx => io_xlsx::read_xlsx_candidates(
            &settings.input,
            settings.excel_worksheet_name.as_deref(),
        ),
    }
}

/// The percentages of a class, with a zero for each category it is closed to.
pub fn restrict_percentages(
    percentages: &PerCategory<f64>,
    allowed: &PerCategory<bool>,
) -> PerCategory<f64> {
    PerCategory::from_fn(|c| if allowed[c] { percentages[c] } else { 0.0 })
}

/// Candidates whose category their class is closed to, by class.
pub type Excluded = BTreeMap<String, Vec<Candidate>>;

/// Collects the candidates by class, in order of first appearance.
///
/// The seats of a class are the first count declared for it, else
/// `default_seats`. The categories a class is open to come from its first
/// row: candidates of other categories are set aside, and the class gets
/// its own percentages with a zero for the closed categories.
fn build_groups(
    parsed: Vec<ParsedCandidate>,
    default_seats: Option<u32>,
    percentages: &PerCategory<f64>,
) -> (Vec<Group>, Excluded) {
    let mut groups: Vec<Group> = Vec::new();
    let mut allowed_by_group: Vec<PerCategory<bool>> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut excluded: Excluded = BTreeMap::new();
    for p in parsed {
        if p.group.is_empty() {
            warn!("Candidate {:?} has no class", p.candidate.id);
        }
        let idx = *index.entry(p.group.clone()).or_insert_with(|| {
            groups.push(Group::new(&p.group, Vec::new(), None));
            allowed_by_group.push(p.allowed);
            groups.len() - 1
        });
        let group = &mut groups[idx];
        if group.seats.is_none() {
            group.seats = p.declared_seats;
        }
        if allowed_by_group[idx][p.candidate.category] {
            group.candidates.push(p.candidate);
        } else {
            warn!(
                "Candidate {:?} set aside: class {:?} is closed to {}",
                p.candidate.id, group.id, p.candidate.category
            );
            excluded
                .entry(group.id.clone())
                .or_default()
                .push(p.candidate);
        }
    }
    for (group, allowed) in groups.iter_mut().zip(allowed_by_group.iter()) {
        if group.seats.is_none() {
            group.seats = default_seats;
        }
        if allowed.0.iter().any(|open| !open) {
            group.percentages = Some(restrict_percentages(percentages, allowed));
        }
        debug!(
            "build_groups: {:?}: {} candidates, seats {:?}, percentages {:?}",
            group.id,
            group.candidates.len(),
            group.seats,
            group.percentages
        );
    }
    (groups, excluded)
}

/// The override keys that name no class of the input.
pub fn unmatched_overrides<'a>(
    groups: &[Group],
    overrides: &'a BTreeMap<String, u32>,
) -> Vec<&'a str> {
    overrides
        .keys()
        .filter(|k| !groups.iter().any(|g| &g.id == *k))
        .map(|k| k.as_str())
        .collect()
}

/// Runs a complete draw from the command line, and returns the summary.
pub fn run_lottery_cli(args: &Args) -> CliResult<serde_json::Value> {
    let settings = resolve_settings(args)?;
    let parsed = read_candidates(&settings)?;
    if parsed.is_empty() {
        warn!("No candidates found in {:?}", settings.input);
    }

    let summary = if settings.per_group {
        let (groups, excluded) = build_groups(parsed, settings.seats, &settings.percentages);
        for name in unmatched_overrides(&groups, &settings.seat_overrides) {
            warn!("Seat count given for {:?}, which is not a class of the input", name);
        }
        info!("Drawing {} classes", groups.len());
        let results = run_lottery_grouped(
            &groups,
            &settings.percentages,
            settings.seed,
            &settings.seat_overrides,
        )
        .context(LotterySnafu {})?;
        print_grouped(&results);
        write_grouped_outputs(
            &results,
            &args.out_approved,
            &args.out_waitlist,
            &args.out_consolidated_approved,
            &args.out_consolidated_waitlist,
        )?;
        build_grouped_summary_js(&settings.percentages, settings.seed, &results, &excluded)
    } else {
        let seats = settings.seats.context(MissingSeatsSnafu {})?;
        if !settings.seat_overrides.is_empty() {
            warn!("Seat counts per class are ignored without --por-turma");
        }
        let config = QuotaConfig::new(seats, settings.percentages).context(LotterySnafu {})?;
        let candidates: Vec<_> = parsed.into_iter().map(|p| p.candidate).collect();
        let allocation = run_lottery(&candidates, &config, settings.seed).context(LotterySnafu {})?;
        print_allocation(&allocation);
        write_single_outputs(&allocation, &args.out_approved, &args.out_waitlist)?;
        build_summary_js(seats, &settings.percentages, settings.seed, &allocation)
    };

    if let Some(out) = &args.out {
        write_summary(&summary, out)?;
    }
    if let Some(reference) = &args.reference {
        check_reference(&summary, reference)?;
    }
    Ok(summary)
}
