//! Sector Physics
//!
//! A deterministic movement-and-collision core for 2.5D "sector/portal"
//! worlds in the style of the classic sector-based shooters (Doom, Dark
//! Forces). The world is a set of polygonal floor regions (sectors) with
//! floor and ceiling heights, bounded by oriented walls; some walls are
//! solid, others adjoin a neighboring sector and admit movement and sight.
//!
//! Once per simulation tick per moving entity this crate answers: can this
//! entity travel from A to B without passing through solid geometry or
//! another entity; if not, where does it stop, which direction should it
//! slide, and which gameplay events (line crossings, explosions, proximity
//! triggers) must be raised as a result?
//!
//! # Architecture
//!
//! - **Fixed kernel** ([`fixed`]): Q16.16 arithmetic, 14-bit circular
//!   angles, approximate distance. All simulation math is fixed-point so
//!   results are identical across platforms.
//! - **Level model** ([`level`]): sectors, walls, adjoin/mirror portal
//!   references. Built once by a loader, read-mostly afterwards.
//! - **Collision** ([`collision`]): path/wall intersection, portal
//!   traversal, object interval queries, range/visibility sweeps, and the
//!   top-level movement resolver.
//!
//! # Design Principles
//!
//! 1. **Determinism**: same inputs always produce the same outputs; no
//!    hardware float in any tie-break-sensitive comparison
//! 2. **Call-scoped state**: every query carries its own scratch context,
//!    so a query issued from inside another query cannot corrupt it
//! 3. **Blocked is not an error**: blocked movement is an ordinary tagged
//!    outcome; only malformed adjacency data fails a call

pub mod collision;
pub mod entity;
pub mod fixed;
pub mod level;

// Re-export commonly used types
pub use collision::{
    propagate_effect, proximity_query, resolve_move, CollisionConfig, CollisionInterval,
    CrossSide, CrossingSink, MoveOutcome, MoveResult, NullSink, ObjectHit, ObjectHitMode,
    PathSegment, ResolveMode, SlideResponse, Traversal, TraversalOutcome, VerticalBand, Visit,
};
pub use entity::{Entity, EntityClass, EntityId, EntityTable};
pub use fixed::{dist_approx, Angle, Fixed, Vec2Fixed, Vec3Fixed};
pub use level::{AdjoinError, Level, SectorFlags, SectorId, WallFlags, WallId};
