//! Collision and movement resolution.
//!
//! # Key Types
//!
//! - [`PathSegment`]: one tick's attempted horizontal movement
//! - [`Traversal`]: result of walking a path across sector portals
//! - [`CollisionInterval`] / [`ObjectHit`]: swept entity-vs-entity query
//! - [`MoveResult`]: outcome of the top-level movement resolver
//! - [`CollisionConfig`]: tuning knobs shared by all queries
//!
//! # Query lifecycle
//!
//! Every query is call-scoped: visited-wall tracking, paths and the
//! accumulated vertical band live in values created for the call and
//! returned with the result. A query issued from inside an effect
//! callback cannot corrupt the outer query.

mod intersect;
mod objects;
mod range;
mod resolver;
mod traversal;

pub use intersect::{intersect_wall, PathSegment};
pub use objects::{interval_query, CollisionInterval, ObjectHit};
pub use range::{propagate_effect, proximity_query, Visit};
pub use resolver::{
    resolve_move, CrossSide, CrossingSink, MoveOutcome, MoveResult, NullSink, ResolveMode,
    SlideResponse,
};
pub use traversal::{traverse, QueryContext, Traversal, TraversalOutcome, VerticalBand};

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed;

/// How the object interval query picks among overlapping candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectHitMode {
    /// Return the first overlap in sector list order. This is the historic
    /// behavior: with fast movers or stacked targets it can pick a farther
    /// target than the nearest. Kept as the default for compatibility.
    #[default]
    FirstMatch,
    /// Return the overlap with the smallest along-path projection.
    Closest,
}

/// Tuning values shared by traversal, range queries and the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Vertical bias applied to pit floors and exterior ceilings when
    /// computing the passable band across portals (world units).
    pub sky_height: Fixed,

    /// Minimum floor-to-ceiling opening a line-of-sight probe may pass
    /// through; smaller portal gaps block sight and area effects.
    pub min_opening: Fixed,

    /// Candidate selection mode for the object interval query.
    pub object_hit: ObjectHitMode,

    /// How far short of the hit point a partial slide stops.
    pub slide_backoff: Fixed,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            sky_height: Fixed::from_int(100),
            min_opening: Fixed::from_int(4),
            object_hit: ObjectHitMode::FirstMatch,
            slide_backoff: Fixed(0x1000), // 1/16 unit
        }
    }
}
