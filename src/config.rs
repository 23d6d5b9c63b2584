//! Configuration management for the CSV sink

use crate::error::{SinkError, SinkResult};

/// Conventional name of the sorted secondary output
pub const DEFAULT_PROCESSED_FILE: &str = "output_processed.csv";

/// Sentinel output name meaning "write to standard output"
pub const STDOUT_SENTINEL: &str = "-";

/// Main configuration structure for the sink
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output file path (`None` or `-` means stdout)
    pub output_file: Option<String>,
    /// Do not write the header row
    pub no_header_row: bool,
    /// Field separator character
    pub field_separator: char,
    /// Run the post-process sort on close; `None` sorts named files and
    /// skips stdout
    pub post_process: Option<bool>,
    /// Destination of the sorted output
    pub processed_file: String,
    /// Keep input order among records with equal numeric keys
    pub stable: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            output_file: None,
            no_header_row: false,
            field_separator: ',',
            post_process: None,
            processed_file: DEFAULT_PROCESSED_FILE.to_string(),
            stable: false,
        }
    }
}

impl SinkConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_file(mut self, output_file: Option<String>) -> Self {
        self.output_file = output_file;
        self
    }

    pub fn with_no_header_row(mut self, no_header_row: bool) -> Self {
        self.no_header_row = no_header_row;
        self
    }

    pub fn with_field_separator(mut self, separator: char) -> Self {
        self.field_separator = separator;
        self
    }

    pub fn with_post_process(mut self, post_process: bool) -> Self {
        self.post_process = Some(post_process);
        self
    }

    pub fn with_processed_file(mut self, processed_file: String) -> Self {
        self.processed_file = processed_file;
        self
    }

    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> SinkResult<()> {
        if !self.field_separator.is_ascii()
            || self.field_separator == '\n'
            || self.field_separator == '\r'
            || self.field_separator == '"'
        {
            return Err(SinkError::invalid_field_separator(
                &self.field_separator.to_string(),
            ));
        }

        // The sorter re-reads the primary output from disk
        if self.post_process == Some(true) && self.writing_to_stdout() {
            return Err(SinkError::conflicting_options(
                "post-processing requires a named output file, not stdout",
            ));
        }

        if self.post_process_enabled() {
            if self.processed_file.is_empty() {
                return Err(SinkError::conflicting_options(
                    "post-processing requires a processed output file name",
                ));
            }
            if self.output_file.as_deref() == Some(self.processed_file.as_str()) {
                return Err(SinkError::conflicting_options(
                    "processed output must not overwrite the primary output",
                ));
            }
        }

        Ok(())
    }

    /// Check if writing to stdout
    pub fn writing_to_stdout(&self) -> bool {
        match self.output_file.as_deref() {
            None => true,
            Some(name) => name == STDOUT_SENTINEL,
        }
    }

    /// Whether closing the sink runs the post-process sort
    pub fn post_process_enabled(&self) -> bool {
        self.post_process.unwrap_or(!self.writing_to_stdout())
    }

    /// Whether the primary output starts with a header row
    pub fn has_header(&self) -> bool {
        !self.no_header_row
    }

    /// Separator as a single byte (validated to be ASCII)
    pub fn delimiter(&self) -> u8 {
        self.field_separator as u8
    }
}

/// Builder for sink configurations
pub struct SinkConfigBuilder {
    config: SinkConfig,
}

impl SinkConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: SinkConfig::default(),
        }
    }

    pub fn output_file(mut self, file: String) -> Self {
        self.config.output_file = Some(file);
        self
    }

    pub fn no_header_row(mut self) -> Self {
        self.config.no_header_row = true;
        self
    }

    pub fn field_separator(mut self, separator: char) -> Self {
        self.config.field_separator = separator;
        self
    }

    pub fn post_process(mut self) -> Self {
        self.config.post_process = Some(true);
        self
    }

    pub fn processed_file(mut self, file: String) -> Self {
        self.config.processed_file = file;
        self
    }

    pub fn stable(mut self) -> Self {
        self.config.stable = true;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> SinkResult<SinkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SinkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Common configuration presets
pub mod presets {
    use super::*;

    /// Stream records to stdout with a header, no post-processing
    pub fn stdout() -> SinkConfig {
        SinkConfig::default()
    }

    /// Write to `path` and sort into the conventional processed file on close
    pub fn sorted_file(path: &str) -> SinkConfig {
        SinkConfig::default()
            .with_output_file(Some(path.to_string()))
            .with_post_process(true)
    }

    /// Write to `path` without a header row
    pub fn headerless_file(path: &str) -> SinkConfig {
        SinkConfig::default()
            .with_output_file(Some(path.to_string()))
            .with_no_header_row(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SinkConfig::default();
        assert!(config.writing_to_stdout());
        assert!(config.has_header());
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.processed_file, DEFAULT_PROCESSED_FILE);
        assert!(!config.post_process_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SinkConfigBuilder::new()
            .output_file("scan.csv".to_string())
            .no_header_row()
            .post_process()
            .stable()
            .build()
            .expect("Failed to build test config");

        assert!(!config.writing_to_stdout());
        assert!(!config.has_header());
        assert!(config.post_process_enabled());
        assert!(config.stable);
    }

    #[test]
    fn test_stdout_sentinel() {
        let config = SinkConfig::default().with_output_file(Some("-".to_string()));
        assert!(config.writing_to_stdout());

        let config = SinkConfig::default().with_output_file(Some("out.csv".to_string()));
        assert!(!config.writing_to_stdout());
        assert!(config.post_process_enabled());

        let config = config.with_post_process(false);
        assert!(!config.post_process_enabled());
    }

    #[test]
    fn test_validate_post_process_to_stdout() {
        let config = SinkConfig {
            post_process: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SinkError::ConflictingOptions { .. })
        ));
    }

    #[test]
    fn test_validate_processed_same_as_primary() {
        let config = presets::sorted_file("scan.csv").with_processed_file("scan.csv".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_separator() {
        assert!(SinkConfig::default()
            .with_field_separator('"')
            .validate()
            .is_err());
        assert!(SinkConfig::default()
            .with_field_separator('é')
            .validate()
            .is_err());
        assert!(SinkConfig::default()
            .with_field_separator('\t')
            .validate()
            .is_ok());
    }

    #[test]
    fn test_presets() {
        let config = presets::sorted_file("scan.csv");
        assert!(config.post_process_enabled());
        assert!(config.validate().is_ok());

        let config = presets::headerless_file("scan.csv");
        assert!(!config.has_header());
        assert!(config.post_process_enabled());
    }
}
