//! Optional tool-schema filtering keyed on the latest user text.

use agentic_core::ToolSchema;

/// Narrows the tool schemas advertised to the LLM for one call, so agents
/// with large tool stores don't pay the full schema-token cost every turn.
///
/// No algorithm is prescribed here; this core only defines the seam. A
/// caller wanting semantic
/// retrieval over tool descriptions plugs it in here instead of the core
/// growing an embedding dependency.
pub trait ToolSearchStrategy: Send + Sync {
    /// Return the subset (or reordering) of `schemas` to advertise for this
    /// call, given the latest user message's text if one exists.
    fn filter(&self, schemas: Vec<ToolSchema>, latest_user_text: Option<&str>) -> Vec<ToolSchema>;
}

/// Advertises every registered tool, unfiltered — the default when an
/// `Agent` sets no [`ToolSearchStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AllTools;

impl ToolSearchStrategy for AllTools {
    fn filter(&self, schemas: Vec<ToolSchema>, _latest_user_text: Option<&str>) -> Vec<ToolSchema> {
        schemas
    }
}
