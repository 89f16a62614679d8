/// Response normalization layer.
///
/// The generative model does not guarantee schema conformance, so every
/// payload it returns is coerced into the canonical records in
/// `crate::models` before anything downstream touches it. Parse or transport
/// failures are substituted from the fallback library, which keeps the
/// rendering path single and total.
pub mod campaign;
pub mod coerce;
pub mod decode;
pub mod errors;
pub mod fallback;
pub mod persona;

// Re-export the entry points most callers need
pub use self::campaign::normalize_campaign;
pub use self::errors::{EngineError, EngineResult};
pub use self::persona::normalize_persona;

/// Which path produced a step's data: a parsed model response or the
/// pre-authored fallback library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrigin {
    Parsed,
    FallbackSubstituted,
}

impl ResponseOrigin {
    pub fn used_fallback(&self) -> bool {
        matches!(self, ResponseOrigin::FallbackSubstituted)
    }
}
