// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::lottery::{io_common::parse_table, *};

pub fn read_xlsx_candidates(
    path: &str,
    worksheet_name: Option<&str>,
) -> CliResult<Vec<ParsedCandidate>> {
    info!("Attempting to read candidate workbook {:?}", path);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .context(MissingWorksheetSnafu {
        name: worksheet_name.unwrap_or("(first sheet)"),
        path,
    })?
    .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyInputSnafu { path })?;
    let headers: Vec<String> = header
        .iter()
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();
    debug!("read_xlsx_candidates: headers: {:?}", headers);

    let rows = iter
        .enumerate()
        .map(|(idx, row)| -> CliResult<(usize, Vec<String>)> {
            Ok((idx + 2, row.iter().map(cell_to_string).collect()))
        });
    parse_table(path, headers, rows)
}

// Spreadsheets store ids and seat counts as floats.
fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => String::new(),
        other => {
            warn!("cell_to_string: unexpected cell {:?}", other);
            format!("{:?}", other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::Float(30.0)), "30");
        assert_eq!(cell_to_string(&DataType::Float(0.5)), "0.5");
        assert_eq!(cell_to_string(&DataType::Int(7)), "7");
        assert_eq!(cell_to_string(&DataType::Bool(true)), "true");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::String("Ana".to_string())), "Ana");
    }

    use seat_lottery::{Category, PerCategory};

    const SIMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/candidatos_simples.xlsx");
    const EXPORT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/inscritos_export.xlsx");

    #[test]
    fn simple_workbook() {
        let res = read_xlsx_candidates(SIMPLE, None).unwrap();
        let ids: Vec<&str> = res.iter().map(|p| p.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(res[0].candidate.category, Category::Aluno);
        assert_eq!(res[1].candidate.category, Category::Servidor);
        assert_eq!(res[2].candidate.category, Category::ComunidadeExterna);
        assert_eq!(res[0].candidate.attribute("nome"), Some("Ana Souza"));
        assert_eq!(res[0].group, "");
        assert_eq!(res[0].declared_seats, None);

        let named = read_xlsx_candidates(SIMPLE, Some("Inscritos")).unwrap();
        assert_eq!(named, res);
    }

    #[test]
    fn export_workbook_on_second_sheet() {
        let res = read_xlsx_candidates(EXPORT, Some("Inscricoes")).unwrap();
        assert_eq!(res.len(), 6);
        assert_eq!(res[0].candidate.id, "101");
        assert_eq!(res[0].candidate.attribute("Numero"), Some("1"));
        assert_eq!(res[0].group, "Turma A");
        assert_eq!(res[0].declared_seats, Some(2));
        assert_eq!(res[0].allowed, PerCategory::new(true, true, true));
        assert_eq!(res[2].candidate.category, Category::ComunidadeExterna);
        assert_eq!(res[3].group, "Turma B");
        assert_eq!(res[3].declared_seats, Some(1));
        assert_eq!(res[3].allowed, PerCategory::new(true, false, false));
        assert_eq!(res[4].candidate.category, Category::Servidor);
    }

    #[test]
    fn first_sheet_without_candidates() {
        // The first sheet of the export only holds a note.
        assert!(matches!(
            read_xlsx_candidates(EXPORT, None),
            Err(CliError::MissingColumns { .. })
        ));
    }

    #[test]
    fn missing_worksheet() {
        match read_xlsx_candidates(SIMPLE, Some("Planilha1")) {
            Err(CliError::MissingWorksheet { name, .. }) => assert_eq!(name, "Planilha1"),
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn missing_file() {
        let err = read_xlsx_candidates("/nonexistent/candidatos.xlsx", None).unwrap_err();
        assert!(matches!(err, CliError::OpeningExcel { .. }));
    }
}
