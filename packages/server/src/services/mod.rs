//! Mutation orchestrators: field assignment, association sets and media
//! side effects in a fixed order per entity type.

pub mod lecturer;
pub mod post;

/// Outcome of removing an entity whose media cleanup may have degraded.
#[derive(Debug, Clone, Default)]
pub struct Removed {
    pub warnings: Vec<String>,
}
