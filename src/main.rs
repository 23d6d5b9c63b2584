//! Post-process a CSV scan output file
//!
//! Re-reads a file written by the CSV sink and writes a copy whose data
//! rows are sorted by the numeric second column.

use std::process;
use clap::{Arg, ArgAction, Command};
use log::{info, LevelFilter, Log, Metadata, Record};

use csv_sink::{
    config::{SinkConfig, SinkConfigBuilder, DEFAULT_PROCESSED_FILE},
    error::{SinkError, SinkResult},
    sort_output_file,
    EXIT_SUCCESS,
};

/// Writes log records to stderr as `csv-sink: message`
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                log::Level::Error | log::Level::Warn => eprintln!(
                    "csv-sink: {}: {}",
                    record.level().as_str().to_lowercase(),
                    record.args()
                ),
                _ => eprintln!("csv-sink: {}", record.args()),
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("csv-sink: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run() -> SinkResult<i32> {
    let matches = build_cli().get_matches();

    init_logging(&matches);

    let config = parse_config_from_matches(&matches)?;
    let input = config
        .output_file
        .clone()
        .ok_or_else(|| SinkError::internal("missing input file"))?;

    let expected_records = match matches.get_one::<String>("records") {
        Some(n) => Some(
            n.parse::<usize>()
                .map_err(|_| SinkError::parse_error(&format!("invalid record count: {}", n)))?,
        ),
        None => None,
    };

    let summary = sort_output_file(&config, std::path::Path::new(&input), expected_records)?;
    info!(
        "{} records sorted into {}",
        summary.records_sorted,
        summary.output.display()
    );

    Ok(EXIT_SUCCESS)
}

fn init_logging(matches: &clap::ArgMatches) {
    let level = if matches.get_flag("debug") {
        LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn build_cli() -> Command {
    Command::new("csv-sink")
        .version(env!("CARGO_PKG_VERSION"))
        .override_usage("csv-sink [OPTION]... FILE")
        .about("Sort a CSV scan output file by its numeric second column")
        .long_about("Re-read a CSV file written by the scan output sink, sort its data rows by the unsigned integer in the second column and write the result to a separate file. The header line, if present, is copied unchanged. The input file is never modified.")

        .arg(Arg::new("file")
            .help("CSV output file to post-process")
            .required(true)
            .value_name("FILE"))

        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .help("Write the sorted result to FILE")
            .default_value(DEFAULT_PROCESSED_FILE)
            .value_name("FILE"))
        .arg(Arg::new("no-header")
            .long("no-header")
            .help("The input has no header row; sort every line")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("stable")
            .short('s')
            .long("stable")
            .help("Keep input order among rows with equal keys")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("field-separator")
            .short('t')
            .long("field-separator")
            .help("Use SEP instead of a comma")
            .value_name("SEP"))
        .arg(Arg::new("records")
            .short('n')
            .long("records")
            .help("Sort only the first N data rows")
            .value_name("N"))

        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Report progress on stderr")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("debug")
            .long("debug")
            .help("Print debugging information on stderr")
            .action(ArgAction::SetTrue))
}

/// Parse configuration from command line matches
fn parse_config_from_matches(matches: &clap::ArgMatches) -> SinkResult<SinkConfig> {
    let mut builder = SinkConfigBuilder::new().post_process();

    if let Some(file) = matches.get_one::<String>("file") {
        builder = builder.output_file(file.clone());
    }
    if let Some(output) = matches.get_one::<String>("output") {
        builder = builder.processed_file(output.clone());
    }
    if matches.get_flag("no-header") {
        builder = builder.no_header_row();
    }
    if matches.get_flag("stable") {
        builder = builder.stable();
    }

    if let Some(sep_str) = matches.get_one::<String>("field-separator") {
        let mut chars = sep_str.chars();
        match (chars.next(), chars.next()) {
            (Some(sep), None) => builder = builder.field_separator(sep),
            _ => return Err(SinkError::invalid_field_separator(sep_str)),
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_config() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(["csv-sink", "--stable", "--no-header", "scan.csv"])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");

        assert_eq!(config.output_file, Some("scan.csv".to_string()));
        assert_eq!(config.processed_file, DEFAULT_PROCESSED_FILE);
        assert!(config.stable);
        assert!(!config.has_header());
        assert!(config.post_process_enabled());
    }

    #[test]
    fn test_parse_separator_and_output() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(["csv-sink", "-t", ";", "-o", "sorted.csv", "scan.csv"])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");

        assert_eq!(config.field_separator, ';');
        assert_eq!(config.processed_file, "sorted.csv");
    }

    #[test]
    fn test_invalid_separator() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(["csv-sink", "-t", "::", "scan.csv"])
            .expect("Failed to parse test arguments");

        let result = parse_config_from_matches(&matches);
        assert!(matches!(result, Err(SinkError::InvalidFieldSeparator { .. })));
    }

    #[test]
    fn test_output_same_as_input_rejected() {
        let app = build_cli();
        let matches = app
            .try_get_matches_from(["csv-sink", "-o", "scan.csv", "scan.csv"])
            .expect("Failed to parse test arguments");

        assert!(parse_config_from_matches(&matches).is_err());
    }

    #[test]
    fn test_missing_file_argument() {
        assert!(build_cli().try_get_matches_from(["csv-sink"]).is_err());
    }
}
