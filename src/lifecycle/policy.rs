// Commit-time preconditions. These sit on top of the engine: an edge can be
// valid in the graph and still be refused here until its artifacts exist.

use super::types::{AssetState, TransitionRequest};

/// Disposing an asset that is still in hand needs proof the media were wiped.
/// A lost asset cannot be wiped, so Lost -> Disposed is exempt.
pub fn requires_wipe_certificate(from: AssetState, to: AssetState) -> bool {
    to == AssetState::Disposed && from != AssetState::Lost
}

/// Returns the unmet precondition, if any, for committing `request` from `from`
pub fn unmet_precondition(from: AssetState, request: &TransitionRequest) -> Option<String> {
    if !requires_wipe_certificate(from, request.to_state) {
        return None;
    }

    match &request.wipe_certificate {
        None => Some(format!(
            "A wipe certificate is required before moving an asset from '{from}' to '{}'",
            request.to_state
        )),
        Some(cert) if cert.certificate_id.trim().is_empty() => {
            Some("Wipe certificate id must not be empty".to_string())
        }
        Some(_) => None,
    }
}
