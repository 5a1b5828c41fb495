use thiserror::Error;

/// A type alias for a result with a [BoxedTvmDbgError] as the error type
pub type TvmDbgResult<T> = Result<T, BoxedTvmDbgError>;

/// A wrapper type for [TvmDbgError]. This exists to allow a smaller return
/// size for results since the error type is large.
pub struct BoxedTvmDbgError(Box<TvmDbgError>);

impl BoxedTvmDbgError {
    /// Get a reference to the inner error
    pub fn inner(&self) -> &TvmDbgError {
        &self.0
    }
}

impl std::fmt::Display for BoxedTvmDbgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&*self.0, f)
    }
}

impl std::fmt::Debug for BoxedTvmDbgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)
    }
}

impl std::error::Error for BoxedTvmDbgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl std::ops::Deref for BoxedTvmDbgError {
    type Target = TvmDbgError;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<T> for BoxedTvmDbgError
where
    T: Into<TvmDbgError>,
{
    fn from(e: T) -> Self {
        Self(Box::new(T::into(e)))
    }
}

/// An enum representing the different types of errors that can occur while
/// preparing and driving a debug session
#[derive(Error)]
pub enum TvmDbgError {
    /// The transaction emulator reported an unsuccessful setup result. No
    /// stepping has happened when this is raised.
    #[error("transaction emulator setup failed with result code {0}")]
    PreparationFailed(i64),

    /// A call into the emulator bindings failed
    #[error("emulator call failed - {0}")]
    Emulator(String),

    /// The debug-info table produced by the compiler could not be parsed
    #[error("malformed debug info - {0}")]
    DebugInfoParse(#[from] serde_json::Error),

    /// A wrapper for IO errors
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// A stepping verb or inspection call arrived after the session was
    /// finalized
    #[error("debug session has already finished")]
    SessionFinished,

    /// A nonspecific error, used for arbitrary messages
    #[error("{0}")]
    GenericError(String),
}

// this is silly but needed to make the program print something sensible when
// returning a result from `main`
impl std::fmt::Debug for TvmDbgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)
    }
}
