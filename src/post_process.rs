//! Post-process sort of a finished CSV output file.
//!
//! The sorter re-reads the primary output from disk, parses each data row
//! into an address, a numeric key (second column) and the untouched
//! remainder, sorts the rows by the numeric key and writes them, after the
//! original header, to a separate file. The primary output is never
//! modified.

use crate::config::SinkConfig;
use crate::error::{SinkContext, SinkError, SinkResult};
use crate::mapped::MappedFile;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Record count from which sorting switches to rayon
const PARALLEL_THRESHOLD: usize = 8192;

/// Options controlling one post-process run
#[derive(Debug, Clone)]
pub struct PostProcessOptions {
    /// First line is a header that is copied verbatim and not sorted
    pub has_header: bool,
    /// Column delimiter
    pub delimiter: u8,
    /// Keep input order among equal keys
    pub stable: bool,
    /// Number of records the writer produced; `None` consumes every line
    pub expected_records: Option<usize>,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            stable: false,
            expected_records: None,
        }
    }
}

impl PostProcessOptions {
    /// Options matching what a sink with `config` wrote `records` rows with
    pub fn from_config(config: &SinkConfig, records: usize) -> Self {
        Self {
            has_header: config.has_header(),
            delimiter: config.delimiter(),
            stable: config.stable,
            expected_records: Some(records),
        }
    }
}

/// Outcome of a post-process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessSummary {
    /// Path of the sorted output
    pub output: PathBuf,
    /// Data rows written to the sorted output
    pub records_sorted: usize,
    /// Empty lines ignored while parsing
    pub blank_lines_skipped: usize,
    /// Non-empty lines left after the expected count was reached
    pub unconsumed_lines: usize,
    /// Expected records the file did not contain
    pub missing_records: usize,
}

impl PostProcessSummary {
    /// Whether the file held exactly the expected number of records
    pub fn count_matched(&self) -> bool {
        self.unconsumed_lines == 0 && self.missing_records == 0
    }
}

/// One data row, borrowed from the mapped input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRecord<'a> {
    /// First column (an address)
    pub primary_key: &'a [u8],
    /// Second column as an unsigned integer
    pub numeric_key: u64,
    /// Everything after the second delimiter, verbatim
    pub remainder: Option<&'a [u8]>,
}

impl<'a> ParsedRecord<'a> {
    /// Parse a data row.
    ///
    /// A missing second column yields a key of 0. `remainder` is `None` only
    /// when no delimiter follows the second column.
    pub fn parse(line: &'a [u8], delimiter: u8) -> Self {
        let (primary_key, rest) = split_column(line, delimiter);
        let (numeric_key, remainder) = match rest {
            Some(rest) => {
                let (key, remainder) = split_column(rest, delimiter);
                (parse_unsigned(unquote(key)), remainder)
            }
            None => (0, None),
        };
        Self {
            primary_key,
            numeric_key,
            remainder,
        }
    }

    fn write_to<W: Write + ?Sized>(&self, out: &mut W, delimiter: u8) -> std::io::Result<()> {
        out.write_all(self.primary_key)?;
        out.write_all(&[delimiter])?;
        write!(out, "{}", self.numeric_key)?;
        if let Some(remainder) = self.remainder {
            out.write_all(&[delimiter])?;
            out.write_all(remainder)?;
        }
        out.write_all(b"\n")
    }
}

/// Split off the first column.
///
/// A column starting with `"` is quoted when its next quote is followed by
/// the delimiter or the end of line, matching how the encoder quotes
/// strings. Otherwise the column ends at the first delimiter.
fn split_column(line: &[u8], delimiter: u8) -> (&[u8], Option<&[u8]>) {
    if line.first() == Some(&b'"') {
        if let Some(offset) = line[1..].iter().position(|&b| b == b'"') {
            let end = offset + 1;
            if end + 1 == line.len() {
                return (line, None);
            }
            if line[end + 1] == delimiter {
                return (&line[..=end], Some(&line[end + 2..]));
            }
        }
    }
    match line.iter().position(|&b| b == delimiter) {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

fn unquote(column: &[u8]) -> &[u8] {
    column
        .strip_prefix(b"\"")
        .and_then(|c| c.strip_suffix(b"\""))
        .unwrap_or(column)
}

/// Lenient unsigned decimal parse in the manner of C `strtoul`.
///
/// Leading blanks and a `+` are skipped, digits are read up to the first
/// non-digit, no digits gives 0 and overflow saturates at `u64::MAX`.
pub fn parse_unsigned(bytes: &[u8]) -> u64 {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let mut digits = &bytes[start..];
    if let Some(rest) = digits.strip_prefix(b"+") {
        digits = rest;
    }

    let mut value: u64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        value = match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
        {
            Some(v) => v,
            None => return u64::MAX,
        };
    }
    value
}

/// Sorts a finished output file into a new file
pub struct PostProcessor {
    options: PostProcessOptions,
}

impl PostProcessor {
    pub fn new(options: PostProcessOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PostProcessOptions {
        &self.options
    }

    /// Read `input`, sort its data rows by numeric key and write them to `output`
    pub fn run(&self, input: &Path, output: &Path) -> SinkResult<PostProcessSummary> {
        let input_name = input.display().to_string();
        let output_name = output.display().to_string();
        info!("post processing {input_name}");

        if output.exists()
            && fs::canonicalize(output).with_file_context(&output_name)?
                == fs::canonicalize(input).with_file_context(&input_name)?
        {
            return Err(SinkError::conflicting_options(
                "processed output must not overwrite the primary output",
            ));
        }

        let mapped = MappedFile::new(input).with_file_context(&input_name)?;
        let mut lines = mapped.lines();

        let header = if self.options.has_header {
            Some(lines.next().ok_or_else(|| SinkError::missing_header(&input_name))?)
        } else {
            None
        };

        let capacity = match self.options.expected_records {
            Some(count) => count,
            None => bytecount_lines(mapped.as_bytes()),
        };
        let mut records: Vec<ParsedRecord<'_>> = Vec::new();
        records
            .try_reserve_exact(capacity)
            .map_err(|_| SinkError::OutOfMemory { records: capacity })?;

        debug!("parsing records");
        let limit = self.options.expected_records.unwrap_or(usize::MAX);
        let mut blank_lines_skipped = 0;
        while records.len() < limit {
            let Some(line) = lines.next() else {
                break;
            };
            if line.is_empty() {
                blank_lines_skipped += 1;
                continue;
            }
            records.push(ParsedRecord::parse(line, self.options.delimiter));
        }

        let unconsumed_lines = lines.filter(|line| !line.is_empty()).count();
        let missing_records = self
            .options
            .expected_records
            .map_or(0, |count| count.saturating_sub(records.len()));
        if unconsumed_lines > 0 {
            warn!(
                "{input_name}: {unconsumed_lines} data lines beyond the {} expected records were not sorted",
                records.len()
            );
        }
        if missing_records > 0 {
            warn!(
                "{input_name}: expected {} records, found {}",
                records.len() + missing_records,
                records.len()
            );
        }

        debug!("sorting {} records", records.len());
        self.sort_records(&mut records);

        debug!("writing sorted records to {output_name}");
        self.write_sorted(output, header, &records)
            .with_file_context(&output_name)?;
        info!("sorted output written to {output_name}");

        Ok(PostProcessSummary {
            output: output.to_path_buf(),
            records_sorted: records.len(),
            blank_lines_skipped,
            unconsumed_lines,
            missing_records,
        })
    }

    /// Sort by numeric key, ascending
    pub fn sort_records(&self, records: &mut [ParsedRecord<'_>]) {
        let parallel = records.len() >= PARALLEL_THRESHOLD && num_cpus::get() > 1;
        match (self.options.stable, parallel) {
            (true, true) => records.par_sort_by_key(|r| r.numeric_key),
            (true, false) => records.sort_by_key(|r| r.numeric_key),
            (false, true) => records.par_sort_unstable_by_key(|r| r.numeric_key),
            (false, false) => records.sort_unstable_by_key(|r| r.numeric_key),
        }
    }

    /// Write header and records to a temporary file next to `output`, then
    /// move it into place
    fn write_sorted(
        &self,
        output: &Path,
        header: Option<&[u8]>,
        records: &[ParsedRecord<'_>],
    ) -> SinkResult<()> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(temp);

        if let Some(header) = header {
            writer.write_all(header)?;
            writer.write_all(b"\n")?;
        }
        for record in records {
            record.write_to(&mut writer, self.options.delimiter)?;
        }

        let temp = writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(output).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Upper bound on the number of lines in `data`
fn bytecount_lines(data: &[u8]) -> usize {
    let newlines = data.iter().filter(|&&b| b == b'\n').count();
    if data.last().map_or(false, |&b| b != b'\n') {
        newlines + 1
    } else {
        newlines
    }
}
