//! Output sinks and the CSV writer lifecycle

use crate::config::SinkConfig;
use crate::encoder::LineEncoder;
use crate::error::{SinkContext, SinkError, SinkResult};
use crate::field::{FieldSet, TaggedField};
use crate::post_process::{PostProcessOptions, PostProcessSummary, PostProcessor};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination that accepts field sets and persists them.
///
/// A sink is created once per run with the ordered field names, receives
/// one `write` per record and is closed exactly once.
pub trait Sink {
    /// Summary returned when the sink is closed
    type Summary;

    fn init(config: &SinkConfig, field_names: &[String]) -> SinkResult<Self>
    where
        Self: Sized;

    fn write(&mut self, record: &FieldSet) -> SinkResult<()>;

    fn close(&mut self) -> SinkResult<Self::Summary>;
}

/// What a closed CSV sink produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSummary {
    /// Primary output file, `None` when writing to stdout
    pub output: Option<PathBuf>,
    /// Number of records written
    pub records_written: usize,
    /// Result of the post-process sort, if it ran
    pub post_process: Option<PostProcessSummary>,
}

/// Comma-separated output with an optional sorted copy produced on close
pub struct CsvSink {
    config: SinkConfig,
    encoder: LineEncoder,
    field_names: Vec<String>,
    output: Option<Box<dyn Write>>,
    path: Option<PathBuf>,
    records_written: usize,
}

impl CsvSink {
    /// Open the destination and write the header row unless suppressed
    pub fn new(config: &SinkConfig, field_names: &[String]) -> SinkResult<Self> {
        config.validate()?;

        let encoder = LineEncoder::new(config.delimiter());
        let (mut output, path): (Box<dyn Write>, Option<PathBuf>) = if config.writing_to_stdout() {
            debug!("no output file selected, will use stdout");
            (Box::new(BufWriter::new(io::stdout())), None)
        } else {
            let name = config.output_file.as_deref().unwrap_or_default();
            let file = File::create(name).with_file_context(name)?;
            debug!("writing CSV output to {name}");
            (Box::new(BufWriter::new(file)), Some(PathBuf::from(name)))
        };

        if config.has_header() {
            debug!("writing header row with {} fields", field_names.len());
            encoder.write_header(&mut output, field_names)?;
            output.flush()?;
        }

        Ok(Self {
            config: config.clone(),
            encoder,
            field_names: field_names.to_vec(),
            output: Some(output),
            path,
            records_written: 0,
        })
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.output.is_none()
    }

    /// Append one record and flush it
    pub fn process(&mut self, record: &FieldSet) -> SinkResult<()> {
        let out = self.output.as_mut().ok_or(SinkError::Closed)?;
        self.encoder.write_record(out, record)?;
        self.records_written += 1;
        out.flush()
            .with_context(|| format!("flushing {}", describe(self.path.as_deref())))
    }

    /// Append one record delivered as numerically tagged fields.
    ///
    /// The whole record is converted before anything is written, so an
    /// unknown type tag leaves the output untouched.
    pub fn process_tagged(&mut self, fields: &[TaggedField<'_>]) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        let record = FieldSet::from_tagged(fields)?;
        self.process(&record)
    }

    /// Close the destination, then sort it into the processed file if enabled
    pub fn finish(&mut self) -> SinkResult<CloseSummary> {
        let mut output = self.output.take().ok_or(SinkError::Closed)?;
        output.flush()?;
        drop(output);
        info!(
            "{} records written to {}",
            self.records_written,
            describe(self.path.as_deref())
        );

        let post_process = match (&self.path, self.config.post_process_enabled()) {
            (Some(path), true) => {
                let options = PostProcessOptions::from_config(&self.config, self.records_written);
                let processed = Path::new(&self.config.processed_file);
                Some(PostProcessor::new(options).run(path, processed)?)
            }
            _ => None,
        };

        Ok(CloseSummary {
            output: self.path.clone(),
            records_written: self.records_written,
            post_process,
        })
    }
}

fn describe(path: Option<&Path>) -> String {
    path.map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
}

impl Sink for CsvSink {
    type Summary = CloseSummary;

    fn init(config: &SinkConfig, field_names: &[String]) -> SinkResult<Self> {
        CsvSink::new(config, field_names)
    }

    fn write(&mut self, record: &FieldSet) -> SinkResult<()> {
        self.process(record)
    }

    fn close(&mut self) -> SinkResult<CloseSummary> {
        self.finish()
    }
}
