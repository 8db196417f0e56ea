//! Rendering collaborator used by the search controller

use crate::types::{ResultSet, Severity};

/// Displays results and notices.
///
/// The controller calls these while holding its state lock, so
/// implementations must not call back into the controller.
pub trait Renderer: Send + Sync {
    /// Show a result set, replacing whatever was displayed.
    fn render(&self, results: &ResultSet);

    /// Show a one-line notice.
    fn render_notice(&self, message: &str, severity: Severity);

    /// Remove displayed results.
    fn clear(&self);
}
