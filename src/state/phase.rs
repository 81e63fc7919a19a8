/// Crawl phase definitions for the crawl state machine
///
/// The engine moves `Idle → Requesting → Merging → Checkpointing` and from
/// there either loops back to `Requesting` or stops in `Done` or `Failed`.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Nothing requested yet
    Idle,

    /// A page batch request is in flight (including retries and rate-limit waits)
    Requesting,

    /// The received batch is being folded into the crawl state
    Merging,

    /// Deciding whether to persist, continue or stop
    Checkpointing,

    /// The remote reported no further pages; final checkpoint written
    Done,

    /// Retry budget exhausted or cancelled; checkpoint written before stopping
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is part of the state machine
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Requesting)
                | (Self::Requesting, Self::Merging)
                | (Self::Requesting, Self::Failed)
                | (Self::Merging, Self::Checkpointing)
                | (Self::Checkpointing, Self::Requesting)
                | (Self::Checkpointing, Self::Done)
                | (Self::Checkpointing, Self::Failed)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Merging => "merging",
            Self::Checkpointing => "checkpointing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Requesting,
            Self::Merging,
            Self::Checkpointing,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
