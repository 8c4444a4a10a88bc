// Terminal, CSV and JSON outputs of a draw.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use seat_lottery::{Allocation, Candidate, CategoryStats, PerCategory};

use crate::lottery::io_common::*;
use crate::lottery::*;

pub const OUTPUT_HEADER: [&str; 5] = [
    "Id [Candidato]",
    "Número de sorteio",
    "Nome [Candidato]",
    "Turma [Vaga]",
    "Categoria",
];

fn first_attribute(c: &Candidate, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| c.attribute(n))
        .find(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Maps a candidate from either input layout to the output columns.
/// `group` fills the class column when the row has none.
pub fn output_row(c: &Candidate, group: &str) -> Vec<String> {
    vec![
        c.id.clone(),
        first_attribute(c, &[EXPORT_COL_NUMBER]).unwrap_or_default(),
        first_attribute(c, &[EXPORT_COL_NAME, COL_NAME]).unwrap_or_default(),
        first_attribute(c, &[EXPORT_COL_GROUP, COL_GROUP]).unwrap_or_else(|| group.to_string()),
        c.category.label().to_string(),
    ]
}

/// The file of one class: `{base}_{class}_{suffix}.csv`.
pub fn group_output_path(base: &str, group: &str, suffix: &str) -> String {
    let safe_group = group.replace('/', "-").replace(' ', "_");
    format!("{}_{}_{}.csv", base.trim_end_matches('/'), safe_group, suffix)
}

/// Writes `(class, candidate)` entries as a CSV file, creating the parent
/// directories if needed.
pub fn write_candidates_csv(path: &str, entries: &[(&str, &Candidate)]) -> CliResult<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingFileSnafu { path })?;
        }
    }
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path })?;
    wtr.write_record(OUTPUT_HEADER)
        .context(WritingCsvSnafu { path })?;
    for (group, c) in entries.iter() {
        wtr.write_record(output_row(c, group))
            .context(WritingCsvSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    info!("Wrote {} rows to {:?}", entries.len(), path);
    Ok(())
}

fn tag<'a>(group: &'a str, cs: &'a [Candidate]) -> Vec<(&'a str, &'a Candidate)> {
    cs.iter().map(|c| (group, c)).collect()
}

/// The outputs of a single draw.
pub fn write_single_outputs(
    allocation: &Allocation,
    out_approved: &Option<String>,
    out_waitlist: &Option<String>,
) -> CliResult<()> {
    if let Some(p) = out_approved {
        write_candidates_csv(p, &tag("", &allocation.approved))?;
    }
    if let Some(p) = out_waitlist {
        write_candidates_csv(p, &tag("", &allocation.waitlist))?;
    }
    Ok(())
}

/// The outputs of a draw per class: one pair of files per class, and the
/// consolidated files with all the classes in sorted order.
pub fn write_grouped_outputs(
    results: &BTreeMap<String, Allocation>,
    out_approved: &Option<String>,
    out_waitlist: &Option<String>,
    out_consolidated_approved: &Option<String>,
    out_consolidated_waitlist: &Option<String>,
) -> CliResult<()> {
    for (group, allocation) in results.iter() {
        if let Some(base) = out_approved {
            let p = group_output_path(base, group, "aprovados");
            write_candidates_csv(&p, &tag(group, &allocation.approved))?;
        }
        if let Some(base) = out_waitlist {
            let p = group_output_path(base, group, "espera");
            write_candidates_csv(&p, &tag(group, &allocation.waitlist))?;
        }
    }
    if let Some(p) = out_consolidated_approved {
        let entries: Vec<(&str, &Candidate)> = results
            .iter()
            .flat_map(|(g, a)| tag(g, &a.approved))
            .collect();
        write_candidates_csv(p, &entries)?;
    }
    if let Some(p) = out_consolidated_waitlist {
        let entries: Vec<(&str, &Candidate)> = results
            .iter()
            .flat_map(|(g, a)| tag(g, &a.waitlist))
            .collect();
        write_candidates_csv(p, &entries)?;
    }
    Ok(())
}

pub fn format_line(c: &Candidate) -> String {
    let id = first_attribute(c, &[EXPORT_COL_ID, COL_ID]).unwrap_or_else(|| c.id.clone());
    let name = first_attribute(c, &[EXPORT_COL_NAME, COL_NAME]).unwrap_or_default();
    format!(" - {} - {} ({})", id, name, c.category.label())
}

pub fn format_allocation(allocation: &Allocation) -> Vec<String> {
    let mut lines = vec!["Aprovados:".to_string()];
    lines.extend(allocation.approved.iter().map(format_line));
    lines.push("Lista de espera:".to_string());
    lines.extend(allocation.waitlist.iter().map(format_line));
    lines
}

pub fn print_allocation(allocation: &Allocation) {
    for line in format_allocation(allocation) {
        println!("{}", line);
    }
}

pub fn print_grouped(results: &BTreeMap<String, Allocation>) {
    for (group, allocation) in results.iter() {
        println!();
        println!("=== Turma: {} ===", group);
        print_allocation(allocation);
    }
}

fn percentages_js(percentages: &PerCategory<f64>) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (category, pct) in percentages.iter() {
        m.insert(category.label().to_string(), json!(pct));
    }
    JSValue::Object(m)
}

fn stats_js(stats: &PerCategory<CategoryStats>) -> Vec<JSValue> {
    stats
        .iter()
        .map(|(category, s)| {
            json!({
                "category": category.label(),
                "baseQuota": s.base_quota,
                "roundingBonus": s.rounding_bonus,
                "carriedIn": s.carried_in,
                "quota": s.quota,
                "available": s.available,
                "approved": s.approved,
                "sweptIn": s.swept_in,
                "shortfall": s.shortfall,
            })
        })
        .collect()
}

fn ids(cs: &[Candidate]) -> Vec<String> {
    cs.iter().map(|c| c.id.clone()).collect()
}

fn result_js(group: Option<&str>, allocation: &Allocation) -> JSValue {
    json!({
        "group": group,
        "seats": allocation.total_seats(),
        "unfilled": allocation.unfilled,
        "categories": stats_js(&allocation.stats),
        "approved": ids(&allocation.approved),
        "waitlist": ids(&allocation.waitlist),
    })
}

/// The audit record of a single draw.
pub fn build_summary_js(
    seats: u32,
    percentages: &PerCategory<f64>,
    seed: u64,
    allocation: &Allocation,
) -> JSValue {
    json!({
        "config": {
            "seats": seats,
            "percentages": percentages_js(percentages),
            "seed": seed,
        },
        "results": [result_js(None, allocation)],
    })
}

/// The audit record of a draw per class, classes in sorted order.
///
/// Each class also lists the candidates set aside because the class is
/// closed to their category.
pub fn build_grouped_summary_js(
    percentages: &PerCategory<f64>,
    seed: u64,
    results: &BTreeMap<String, Allocation>,
    excluded: &Excluded,
) -> JSValue {
    let mut seats_per_group: JSMap<String, JSValue> = JSMap::new();
    for (group, allocation) in results.iter() {
        seats_per_group.insert(group.clone(), json!(allocation.total_seats()));
    }
    let results_js: Vec<JSValue> = results
        .iter()
        .map(|(group, allocation)| {
            let mut js = result_js(Some(group), allocation);
            let set_aside = excluded.get(group).map(|cs| ids(cs)).unwrap_or_default();
            js["excluded"] = json!(set_aside);
            js
        })
        .collect();
    json!({
        "config": {
            "seatsPerGroup": seats_per_group,
            "percentages": percentages_js(percentages),
            "seed": seed,
        },
        "results": results_js,
    })
}

/// Writes the summary to a file, or to the standard output for `stdout`.
pub fn write_summary(summary: &JSValue, out: &str) -> CliResult<()> {
    let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
        return Ok(());
    }
    if let Some(parent) = Path::new(out).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingFileSnafu { path: out })?;
        }
    }
    fs::write(out, pretty).context(WritingFileSnafu { path: out })?;
    info!("Wrote summary to {:?}", out);
    Ok(())
}

pub fn read_summary(path: &str) -> CliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Compares a summary with a reference file. A difference is printed as a
/// diff and reported as an error.
pub fn check_reference(summary: &JSValue, reference_path: &str) -> CliResult<()> {
    let reference = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty {
        warn!("Found differences with the reference {:?}", reference_path);
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("Summary matches the reference {:?}", reference_path);
    Ok(())
}
