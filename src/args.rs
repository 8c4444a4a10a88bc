use clap::Parser;

/// Seat lottery with priority quotas (Aluno, Servidor, Comunidade Externa).
///
/// The draw is reproducible: the same input file, percentages and seed always
/// give the same approved list and waitlist.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file with the candidates, in CSV or Excel format. Two layouts are
    /// accepted: the columns id, nome, categoria (and optionally turma), or the export of
    /// the registration system.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is deduced from the extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) A JSON file with the settings of the draw. The options given on the
    /// command line take precedence over the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// The number of seats. Required without --por-turma; with it, the number of seats of the
    /// classes that do not declare one.
    #[clap(long = "vagas", value_parser)]
    pub seats: Option<u32>,

    /// The share of the seats reserved for Aluno, within [0, 1].
    #[clap(long, value_parser)]
    pub pct_aluno: Option<f64>,

    /// The share of the seats reserved for Servidor, within [0, 1].
    #[clap(long, value_parser)]
    pub pct_servidor: Option<f64>,

    /// The share of the seats reserved for Comunidade Externa, within [0, 1].
    #[clap(long, value_parser)]
    pub pct_comunidade: Option<f64>,

    /// The seed of the draw. Publish it along with the input to let anyone check the result.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// If passed, each class (column Turma [Vaga] or turma) is drawn on its own.
    #[clap(long = "por-turma", takes_value = false)]
    pub per_group: bool,

    /// (TURMA=NUM;TURMA2=NUM2) The number of seats of some classes. It takes precedence over the
    /// counts found in the input.
    #[clap(long = "vagas-por-turma", value_parser)]
    pub seats_per_group: Option<String>,

    /// (file path) CSV output of the approved candidates. With --por-turma, the prefix of one file
    /// per class.
    #[clap(long = "out-aprovados", value_parser)]
    pub out_approved: Option<String>,

    /// (file path) CSV output of the waitlist. With --por-turma, the prefix of one file per class.
    #[clap(long = "out-espera", value_parser)]
    pub out_waitlist: Option<String>,

    /// (file path) With --por-turma, a single CSV with the approved candidates of all the classes.
    #[clap(long = "out-consolidado-aprovados", value_parser)]
    pub out_consolidated_approved: Option<String>,

    /// (file path) With --por-turma, a single CSV with the waitlists of all the classes.
    #[clap(long = "out-consolidado-espera", value_parser)]
    pub out_consolidated_waitlist: Option<String>,

    /// (file path or 'stdout') If specified, the summary of the draw will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A summary in JSON format. If provided, the result of the draw is checked against
    /// it and any difference is reported.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flags() {
        let args = Args::try_parse_from([
            "sorteio",
            "-i",
            "inscritos.csv",
            "--vagas",
            "30",
            "--pct-aluno",
            "0.5",
            "--pct-servidor",
            "0.3",
            "--pct-comunidade",
            "0.2",
            "--seed",
            "2024",
            "--por-turma",
            "--vagas-por-turma",
            "T1=3;T2=5",
            "--out-aprovados",
            "saida/aprovados",
            "-o",
            "stdout",
        ])
        .unwrap();
        assert_eq!(args.input.as_deref(), Some("inscritos.csv"));
        assert_eq!(args.seats, Some(30));
        assert_eq!(args.pct_comunidade, Some(0.2));
        assert_eq!(args.seed, Some(2024));
        assert!(args.per_group);
        assert_eq!(args.seats_per_group.as_deref(), Some("T1=3;T2=5"));
        assert_eq!(args.out_approved.as_deref(), Some("saida/aprovados"));
        assert_eq!(args.out.as_deref(), Some("stdout"));
        assert!(!args.verbose);
    }

    #[test]
    fn negative_seats_rejected() {
        assert!(Args::try_parse_from(["sorteio", "--vagas", "-3"]).is_err());
    }
}
