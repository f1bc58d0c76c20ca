use std::fmt;

/// One named phase of the remote scrape/summarise computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    SourceSummary,
    TargetSummary,
    Emails,
}

impl Stage {
    /// All stages in declared order. Arrival order on the wire may differ.
    pub const ALL: [Stage; 3] = [Stage::SourceSummary, Stage::TargetSummary, Stage::Emails];

    /// Event name used on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Stage::SourceSummary => "sourceSummary",
            Stage::TargetSummary => "targetSummary",
            Stage::Emails => "emails",
        }
    }

    /// Maps a wire event name back to a stage. Unknown names yield `None`.
    pub fn from_wire_name(name: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.wire_name() == name)
    }

    /// The terminal stage ends the session once completed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Emails)
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::SourceSummary => "Source scraped & summarised",
            Stage::TargetSummary => "Target scraped & summarised",
            Stage::Emails => "Emails scraped",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Stage::SourceSummary => 0,
            Stage::TargetSummary => 1,
            Stage::Emails => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Decoded payload of a completed stage. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// Text summary for `sourceSummary` / `targetSummary`.
    Summary(String),
    /// Email addresses for `emails`, in the order received.
    Emails(Vec<String>),
}

impl StageResult {
    /// Whether this payload shape belongs to `stage`.
    pub fn fits(&self, stage: Stage) -> bool {
        match self {
            StageResult::Summary(_) => !stage.is_terminal(),
            StageResult::Emails(_) => stage.is_terminal(),
        }
    }

    pub fn as_summary(&self) -> Option<&str> {
        match self {
            StageResult::Summary(text) => Some(text),
            StageResult::Emails(_) => None,
        }
    }

    pub fn as_emails(&self) -> Option<&[String]> {
        match self {
            StageResult::Emails(emails) => Some(emails),
            StageResult::Summary(_) => None,
        }
    }
}
