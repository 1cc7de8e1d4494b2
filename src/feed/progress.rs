use tokio::sync::watch;

use crate::feed::model::FormatKind;

/// Pipeline stage reached by a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Parsing,
    Processing(FormatKind),
    Finishing,
    Done,
}

impl Stage {
    /// Fixed milestone for the stage, in `0.0..=1.0`.
    pub fn fraction(self) -> f32 {
        match self {
            Stage::Fetching => 0.0,
            Stage::Parsing => 0.3,
            Stage::Processing(_) => 0.5,
            Stage::Finishing => 0.8,
            Stage::Done => 1.0,
        }
    }

    pub fn label(self) -> String {
        match self {
            Stage::Fetching => "Fetching feed...".to_string(),
            Stage::Parsing => "Parsing feed...".to_string(),
            Stage::Processing(kind) => format!("Processing {kind} feed..."),
            Stage::Finishing => "Processing articles...".to_string(),
            Stage::Done => "Done".to_string(),
        }
    }
}

/// Advisory progress snapshot published while a feed is fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub fraction: f32,
    pub stage: Stage,
}

impl Progress {
    pub fn new(stage: Stage) -> Self {
        Self {
            fraction: stage.fraction(),
            stage,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(Stage::Fetching)
    }
}

/// Creates a progress channel starting at [`Stage::Fetching`].
pub fn channel() -> (watch::Sender<Progress>, watch::Receiver<Progress>) {
    watch::channel(Progress::default())
}

/// Publishes `stage` if a sender was supplied.
///
/// A dropped receiver is not an error: progress is advisory.
pub(crate) fn report(progress: Option<&watch::Sender<Progress>>, stage: Stage) {
    if let Some(tx) = progress {
        tx.send_replace(Progress::new(stage));
    }
}
