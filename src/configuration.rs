use bon::bon;

/// Configuration struct containing options affecting how a debug session
/// behaves at runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeConfig {
    /// stop on the first statement of the program rather than running to the
    /// first breakpoint
    pub stop_on_entry: bool,
    /// enables debug logging
    pub debug_logging: bool,
    /// suppresses warnings
    pub quiet: bool,
}

#[bon]
impl RuntimeConfig {
    #[builder]
    pub fn new(
        stop_on_entry: bool,
        debug_logging: bool,
        quiet: bool,
    ) -> Self {
        Self {
            stop_on_entry,
            debug_logging,
            quiet,
        }
    }

    pub fn get_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            quiet: self.quiet,
            debug_logging: self.debug_logging,
        }
    }
}

/// Configuration struct describing what settings a logger should be created
/// with.
pub struct LoggingConfig {
    /// Whether or not to silence non-error messages. Will be overridden by
    /// `debug_logging` if set to true.
    pub quiet: bool,
    /// Whether or not to enable debug logging. If set to true, will override
    /// `quiet`.
    pub debug_logging: bool,
}
