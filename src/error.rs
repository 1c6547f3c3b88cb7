//! Error types for scanning, composing and construction.

use std::borrow::Cow;
use std::fmt;

use crate::mark::Mark;

/// Error raised by any stage of loading.
///
/// Each variant carries the same diagnostic shape: a human-readable
/// `problem` phrase with the mark where it was detected, plus an optional
/// "while scanning/composing/constructing X" `context` phrase with the mark
/// where that enclosing construct began. There is no partial-result
/// recovery; the first error aborts the current call.
#[derive(Debug)]
pub enum Error {
    /// Malformed token-level syntax (bad escape, bad directive,
    /// unterminated scalar, an indicator in the wrong context, a required
    /// simple key that never resolved).
    Scan {
        context: Option<(Cow<'static, str>, Mark)>,
        problem: Cow<'static, str>,
        mark: Mark,
    },
    /// The token stream does not form a well-formed node tree (undefined
    /// alias, duplicate anchor, unsupported directive, stray token).
    Compose {
        context: Option<(Cow<'static, str>, Mark)>,
        problem: Cow<'static, str>,
        mark: Mark,
    },
    /// A node could not be turned into a value (disallowed tag, malformed
    /// scalar lexical form, unconstructable recursive structure, malformed
    /// merge target).
    Construct {
        context: Option<(Cow<'static, str>, Mark)>,
        problem: Cow<'static, str>,
        mark: Mark,
    },
}

impl Error {
    /// A scan error at `mark` with no enclosing context.
    pub(crate) fn scan(problem: impl Into<Cow<'static, str>>, mark: Mark) -> Self {
        Error::Scan {
            context: None,
            problem: problem.into(),
            mark,
        }
    }

    /// A compose error at `mark` with no enclosing context.
    pub(crate) fn compose(problem: impl Into<Cow<'static, str>>, mark: Mark) -> Self {
        Error::Compose {
            context: None,
            problem: problem.into(),
            mark,
        }
    }

    /// A construction error at `mark` with no enclosing context.
    pub(crate) fn construct(problem: impl Into<Cow<'static, str>>, mark: Mark) -> Self {
        Error::Construct {
            context: None,
            problem: problem.into(),
            mark,
        }
    }

    /// Attach a "while …" context phrase and the mark where that construct
    /// began. Overwrites any previous context.
    pub(crate) fn with_context(
        mut self,
        what: impl Into<Cow<'static, str>>,
        context_mark: Mark,
    ) -> Self {
        match &mut self {
            Error::Scan { context, .. }
            | Error::Compose { context, .. }
            | Error::Construct { context, .. } => {
                *context = Some((what.into(), context_mark));
            }
        }
        self
    }

    /// The mark where the problem was detected.
    pub fn mark(&self) -> Mark {
        match self {
            Error::Scan { mark, .. }
            | Error::Compose { mark, .. }
            | Error::Construct { mark, .. } => *mark,
        }
    }

    /// The problem phrase without positional decoration.
    pub fn problem(&self) -> &str {
        match self {
            Error::Scan { problem, .. }
            | Error::Compose { problem, .. }
            | Error::Construct { problem, .. } => problem,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (context, problem, mark) = match self {
            Error::Scan { context, problem, mark }
            | Error::Compose { context, problem, mark }
            | Error::Construct { context, problem, mark } => (context, problem, mark),
        };
        if let Some((what, context_mark)) = context {
            write!(f, "while {what} at {context_mark}: ")?;
        }
        write!(f, "{problem} at {mark}")
    }
}

impl std::error::Error for Error {}
