// Row handling shared by the CSV and Excel readers.

use std::collections::HashSet;
use std::path::Path;

use seat_lottery::{Candidate, Category, PerCategory};

use crate::lottery::*;

pub const COL_ID: &str = "id";
pub const COL_NAME: &str = "nome";
pub const COL_CATEGORY: &str = "categoria";
pub const COL_GROUP: &str = "turma";

pub const EXPORT_COL_ID: &str = "Id [Candidato]";
pub const EXPORT_COL_NAME: &str = "Nome [Candidato]";
pub const EXPORT_COL_GROUP: &str = "Turma [Vaga]";
pub const EXPORT_COL_SEATS: &str = "Quantidade vagas [Vaga]";
pub const EXPORT_COL_NUMBER: &str = "Numero";

// Checked in priority order.
const EXPORT_FLAGS: [(&str, Category); 3] = [
    ("Aluno [Candidato]", Category::Aluno),
    ("Servidor [Candidato]", Category::Servidor),
    ("Externo [Candidato]", Category::ComunidadeExterna),
];

// The categories a class is open to, in the export.
const EXPORT_OPEN_FLAGS: [(&str, Category); 3] = [
    ("Aluno [Vaga]", Category::Aluno),
    ("Servidor [Vaga]", Category::Servidor),
    ("Externo [Vaga]", Category::ComunidadeExterna),
];

/// The two supported layouts of a candidate file.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputLayout {
    /// Columns `id`, `nome`, `categoria` and optionally `turma`.
    Simple,
    /// The export of the registration system, with one flag column per category.
    Export,
}

/// A candidate as read from a file, before being handed to the draw.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedCandidate {
    pub candidate: Candidate,
    /// Empty if the file has no class column.
    pub group: String,
    pub declared_seats: Option<u32>,
    /// The categories the class of this row is open to.
    pub allowed: PerCategory<bool>,
}

pub fn trueish(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "true" | "1" | "sim" | "yes" | "y"
    )
}

/// The first run of digits in a cell, if any (`"30 vagas"` -> 30, `"-"` -> None).
pub fn parse_int_maybe(val: &str) -> Option<u32> {
    let digits: String = val
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok()
}

/// The highest priority category flagged as true on an export row.
pub fn category_from_flags(attributes: &[(String, String)]) -> Option<Category> {
    EXPORT_FLAGS.iter().find_map(|(col, category)| {
        let flagged = attributes
            .iter()
            .any(|(k, v)| k == col && trueish(v));
        if flagged {
            Some(*category)
        } else {
            None
        }
    })
}

/// The categories a class is open to, from the `[Vaga]` flags of a row.
///
/// A missing column counts as open. A row that closes the class to every
/// category is read as open to all of them.
pub fn allowed_categories(attributes: &[(String, String)]) -> PerCategory<bool> {
    let mut allowed = PerCategory::new(true, true, true);
    for (col, category) in EXPORT_OPEN_FLAGS.iter() {
        if let Some(v) = attributes.iter().find(|(k, _)| k == col).map(|(_, v)| v) {
            allowed[*category] = trueish(v);
        }
    }
    if allowed.0.iter().all(|open| !open) {
        return PerCategory::new(true, true, true);
    }
    allowed
}

pub fn detect_layout(headers: &[String]) -> CliResult<InputLayout> {
    let present: HashSet<&str> = headers.iter().map(|h| h.as_str()).collect();
    if present.contains(EXPORT_COL_GROUP) && present.contains(EXPORT_COL_NAME) {
        return Ok(InputLayout::Export);
    }
    let missing: Vec<String> = [COL_ID, COL_NAME, COL_CATEGORY]
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    ensure!(missing.is_empty(), MissingColumnsSnafu { missing });
    Ok(InputLayout::Simple)
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

fn lookup<'a>(attributes: &'a [(String, String)], col: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == col)
        .map(|(_, v)| v.trim())
}

/// Turns the rows of a table into candidates.
///
/// `rows` yields the line number of each row (1-based, the header being
/// line 1) with its cells. All the cells are kept as attributes, and a
/// `categoria` column with the resolved category is added.
pub fn parse_table(
    path: &str,
    headers: Vec<String>,
    rows: impl Iterator<Item = CliResult<(usize, Vec<String>)>>,
) -> CliResult<Vec<ParsedCandidate>> {
    let layout = detect_layout(&headers)?;
    info!("parse_table: {:?}: layout {:?}", path, layout);
    let default_id = make_default_id(path);

    let mut res: Vec<ParsedCandidate> = Vec::new();
    for row in rows {
        let (lineno, cells) = row?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("parse_table: line {}: skipping empty row", lineno);
            continue;
        }
        let mut attributes: Vec<(String, String)> = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.clone(), cells.get(idx).cloned().unwrap_or_default()))
            .collect();

        let (id, category, group, declared_seats) = match layout {
            InputLayout::Simple => {
                let id = lookup(&attributes, COL_ID).unwrap_or_default().to_string();
                let label = lookup(&attributes, COL_CATEGORY).unwrap_or_default();
                let category = label.parse::<Category>().ok().context(
                    UnresolvedCategorySnafu {
                        lineno,
                        id: id.clone(),
                        reason: format!("unknown category {:?}", label),
                    },
                )?;
                let group = lookup(&attributes, COL_GROUP).unwrap_or_default().to_string();
                (id, category, group, None)
            }
            InputLayout::Export => {
                let id = match lookup(&attributes, EXPORT_COL_ID) {
                    Some(s) if !s.is_empty() => s.to_string(),
                    _ => default_id(lineno),
                };
                let category = category_from_flags(&attributes).context(
                    UnresolvedCategorySnafu {
                        lineno,
                        id: id.clone(),
                        reason: "no category flag is set",
                    },
                )?;
                let group = lookup(&attributes, EXPORT_COL_GROUP)
                    .unwrap_or_default()
                    .to_string();
                let seats = lookup(&attributes, EXPORT_COL_SEATS).and_then(parse_int_maybe);
                (id, category, group, seats)
            }
        };

        match attributes.iter_mut().find(|(k, _)| k == COL_CATEGORY) {
            Some((_, v)) => *v = category.label().to_string(),
            None => attributes.push((COL_CATEGORY.to_string(), category.label().to_string())),
        }
        debug!(
            "parse_table: line {}: id {:?} category {} group {:?}",
            lineno, id, category, group
        );
        let allowed = allowed_categories(&attributes);
        res.push(ParsedCandidate {
            candidate: Candidate::with_attributes(&id, category, attributes),
            group,
            declared_seats,
            allowed,
        });
    }
    info!("parse_table: {:?}: {} candidates", path, res.len());
    Ok(res)
}
