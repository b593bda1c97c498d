use thiserror::Error;

/// Failure taxonomy for one run.
///
/// Item-scoped variants (fetch, extraction, date) are contained to the item
/// they occurred on and never abort an iteration. `GraphWrite` is the one
/// systemic class: the controller stops looping but still reports the
/// partial event set already committed.
#[derive(Error, Debug)]
pub enum ChronicleError {
    #[error("Transient fetch error for {url}: {reason}")]
    TransientFetch { url: String, reason: String },

    #[error("Extraction parse error: {0}")]
    ExtractionParse(String),

    #[error("No resolvable date (explicit: {0:?})")]
    DateNormalization(Option<String>),

    #[error("Graph write error: {0}")]
    GraphWrite(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}
