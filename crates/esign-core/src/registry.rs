//! Provider capability registry
//!
//! Static mapping from a provider id to its display metadata and
//! completion semantics. A provider marked `synchronous` returns a
//! terminal result directly from submission (no polling, all signers
//! already signed); an asynchronous provider returns an initiated
//! workflow whose signers complete out-of-band.

use crate::error::UnsupportedProviderError;

/// Capability entry for one signing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Wire id, appears in API paths (`/api/{id}/sign`).
    pub id: &'static str,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Cosmetic symbol shown next to the name.
    pub symbol: &'static str,
    /// True when the submission response already reflects the terminal state.
    pub synchronous: bool,
}

/// All providers this client knows how to talk to.
const PROVIDERS: &[Provider] = &[
    Provider {
        id: "scrive",
        display_name: "Scrive",
        symbol: "✍",
        synchronous: false,
    },
    Provider {
        id: "docusign",
        display_name: "DocuSign",
        symbol: "📩",
        synchronous: false,
    },
    Provider {
        id: "selfsign",
        display_name: "Self-Sign",
        symbol: "🔏",
        synchronous: true,
    },
];

/// Look up a provider by id.
///
/// Unknown ids fail with [`UnsupportedProviderError`]; callers surface
/// this as "service not available".
pub fn provider(id: &str) -> Result<&'static Provider, UnsupportedProviderError> {
    PROVIDERS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| UnsupportedProviderError(id.to_string()))
}

/// Whether the given provider completes on submit.
pub fn is_synchronous(id: &str) -> Result<bool, UnsupportedProviderError> {
    provider(id).map(|p| p.synchronous)
}

/// Ids of every registered provider, in registry order.
pub fn known_ids() -> impl Iterator<Item = &'static str> {
    PROVIDERS.iter().map(|p| p.id)
}
