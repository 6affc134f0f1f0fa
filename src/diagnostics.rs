//! Recoverable anomalies found while assembling a network.
//!
//! Every warning is logged when recorded and counted. A non-zero count blocks the
//! simulation (see [`crate::simulation::Simulation::run`]).
use std::fmt;

/// The reason a declaration or one of its fields was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A neuron or synapse name is already in use.
    DuplicateName,
    /// The source of a synapse is not a declared neuron.
    NoSuchSource,
    /// The destination of a synapse is neither a neuron nor a named synapse.
    NoSuchDestination,
    /// A synapse delay is negative.
    NegativeDelay,
    /// A synapse delay is not a finite number.
    InvalidDelay,
    /// A secondary synapse targets another secondary synapse.
    SecondaryTarget,
    /// A declaration starts with an unknown keyword.
    UnknownKeyword,
    /// A name was expected but something else was found.
    ExpectedName,
    /// A number was expected but something else was found.
    ExpectedNumber,
    /// A declaration carries trailing tokens.
    ExpectedNewline,
    /// The output is declared more than once.
    DuplicateOutput,
    /// The output interval is not a positive number.
    InvalidInterval,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WarningKind::DuplicateName => write!(f, "duplicate declaration"),
            WarningKind::NoSuchSource => write!(f, "no such source"),
            WarningKind::NoSuchDestination => write!(f, "no such destination"),
            WarningKind::NegativeDelay => write!(f, "illegal negative delay"),
            WarningKind::InvalidDelay => write!(f, "delay must be a finite number"),
            WarningKind::SecondaryTarget => write!(f, "destination is a secondary synapse"),
            WarningKind::UnknownKeyword => write!(f, "what is that"),
            WarningKind::ExpectedName => write!(f, "expected a name"),
            WarningKind::ExpectedNumber => write!(f, "expected a number"),
            WarningKind::ExpectedNewline => write!(f, "expected a newline"),
            WarningKind::DuplicateOutput => write!(f, "duplicate output declaration"),
            WarningKind::InvalidInterval => write!(f, "output interval must be positive"),
        }
    }
}

/// A recorded warning with the context in which it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    kind: WarningKind,
    context: String,
}

impl Warning {
    pub fn new(kind: WarningKind, context: impl Into<String>) -> Self {
        Warning {
            kind,
            context: context.into(),
        }
    }

    /// Returns the reason of the warning.
    pub fn kind(&self) -> WarningKind {
        self.kind
    }

    /// Returns the human-readable context of the warning.
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -- {}", self.context, self.kind)
    }
}

/// Collects the warnings of an assembly pass.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Record a warning and report it through the logger.
    pub fn warn(&mut self, kind: WarningKind, context: impl Into<String>) {
        let warning = Warning::new(kind, context);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Returns the number of recorded warnings.
    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Returns true if no warning was recorded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Returns the number of recorded warnings of the given kind.
    pub fn count_of(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// An iterator over the recorded warnings, in order of detection.
    pub fn iter(&self) -> impl Iterator<Item = &Warning> + '_ {
        self.warnings.iter()
    }
}
