//! CSV output sink for scan results
//!
//! Records (ordered, typed field sets) are written one per line as
//! comma-delimited text. On close the finished file can be re-read and its
//! data rows sorted by the numeric second column into a separate file.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

pub mod error;
pub mod config;

pub mod field;
pub mod binary;
pub mod encoder;
pub mod mapped;
pub mod writer;
pub mod post_process;

// Re-export commonly used types
pub use error::{SinkError, SinkResult};
pub use config::{SinkConfig, SinkConfigBuilder};
pub use field::{Field, FieldSet, FieldType, FieldValue, TaggedField};
pub use encoder::LineEncoder;
pub use writer::{CloseSummary, CsvSink, Sink};
pub use post_process::{ParsedRecord, PostProcessOptions, PostProcessSummary, PostProcessor};

/// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const FILE_FAILURE: i32 = 2;

/// Sort an existing CSV output file into `config.processed_file`.
///
/// `expected_records` limits how many data rows are consumed; `None` sorts
/// every row in the file.
pub fn sort_output_file(
    config: &SinkConfig,
    input: &std::path::Path,
    expected_records: Option<usize>,
) -> SinkResult<PostProcessSummary> {
    if config.processed_file.is_empty() {
        return Err(SinkError::conflicting_options(
            "post-processing requires a processed output file name",
        ));
    }
    let options = PostProcessOptions {
        expected_records,
        ..PostProcessOptions::from_config(config, 0)
    };
    PostProcessor::new(options).run(input, std::path::Path::new(&config.processed_file))
}
