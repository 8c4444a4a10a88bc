use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use seat_lottery::PerCategory;

use crate::args::Args;
use crate::lottery::*;

/// The optional JSON configuration file.
///
/// Every field can also be given on the command line, which takes precedence.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryConfigFile {
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
    pub seats: Option<u32>,
    pub pct_aluno: Option<f64>,
    pub pct_servidor: Option<f64>,
    pub pct_comunidade: Option<f64>,
    pub seed: Option<u64>,
    pub per_group: Option<bool>,
    pub seats_per_group: Option<BTreeMap<String, u32>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

impl InputType {
    fn parse(s: &str) -> CliResult<InputType> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "excel" => Ok(InputType::Xlsx),
            _ => UnknownInputTypeSnafu { input_type: s }.fail(),
        }
    }

    fn from_extension(path: &str) -> InputType {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => InputType::Xlsx,
            _ => InputType::Csv,
        }
    }
}

/// Everything needed to run a draw, once the file and the flags are merged.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub input: String,
    pub input_type: InputType,
    pub excel_worksheet_name: Option<String>,
    /// Required for a single draw; the default for classes without seats otherwise.
    pub seats: Option<u32>,
    pub percentages: PerCategory<f64>,
    pub seed: u64,
    pub per_group: bool,
    pub seat_overrides: BTreeMap<String, u32>,
}

pub fn read_config_file(path: &str) -> CliResult<LotteryConfigFile> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: LotteryConfigFile =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config_file: {:?}", config);
    Ok(config)
}

/// Parses `TURMA=NUM;TURMA2=NUM2`. Blank entries are ignored.
pub fn parse_seat_overrides(entries: &str) -> CliResult<BTreeMap<String, u32>> {
    let mut res: BTreeMap<String, u32> = BTreeMap::new();
    for part in entries.split(';') {
        if part.trim().is_empty() {
            continue;
        }
        let (group, num) = part
            .split_once('=')
            .context(InvalidSeatOverrideSnafu { entry: part })?;
        let seats = num
            .trim()
            .parse::<u32>()
            .ok()
            .context(InvalidSeatOverrideSnafu { entry: part })?;
        res.insert(group.trim().to_string(), seats);
    }
    Ok(res)
}

fn required<T>(value: Option<T>, name: &str) -> CliResult<T> {
    value.context(MissingParameterSnafu { name })
}

/// Merges the command line with the configuration file, if any.
pub fn resolve_settings(args: &Args) -> CliResult<Settings> {
    let file = match &args.config {
        Some(p) => {
            info!("Reading configuration {:?}", p);
            read_config_file(p)?
        }
        None => LotteryConfigFile::default(),
    };

    let input = required(args.input.clone().or(file.input), "--input")?;
    let input_type = match args.input_type.clone().or(file.input_type) {
        Some(s) => InputType::parse(&s)?,
        None => InputType::from_extension(&input),
    };

    let percentages = PerCategory::new(
        required(args.pct_aluno.or(file.pct_aluno), "--pct-aluno")?,
        required(args.pct_servidor.or(file.pct_servidor), "--pct-servidor")?,
        required(
            args.pct_comunidade.or(file.pct_comunidade),
            "--pct-comunidade",
        )?,
    );

    let mut seat_overrides = file.seats_per_group.unwrap_or_default();
    if let Some(entries) = &args.seats_per_group {
        seat_overrides.extend(parse_seat_overrides(entries)?);
    }

    let settings = Settings {
        input,
        input_type,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or(file.excel_worksheet_name),
        seats: args.seats.or(file.seats),
        percentages,
        seed: required(args.seed.or(file.seed), "--seed")?,
        per_group: args.per_group || file.per_group.unwrap_or(false),
        seat_overrides,
    };
    debug!("resolve_settings: {:?}", settings);
    Ok(settings)
}
