//! Potentially visible set computation over a graph of convex regions.
//!
//! The pipeline is:
//! 1. [`RegionGraph::new`] validates the regions and finds which of them
//!    share portal area,
//! 2. [`determine_trivial_visibility`] flags every region and its direct
//!    neighbours,
//! 3. [`determine_ray_presampled_visibility`] optionally traces a few rays to
//!    cheaply find obviously visible pairs,
//! 4. [`build_pvs`] settles every remaining pair with portal frustum clipping.
//!
//! [`compute_pvs`] runs all of the above.

mod build_pvs;
mod error;
mod frustum;
mod matrix;
mod presample;
mod region;
mod resolve;
mod trivial;
mod world;


pub use build_pvs::*;
pub use error::*;
pub use frustum::*;
pub use matrix::*;
pub use presample::*;
pub use region::*;
pub use resolve::*;
pub use trivial::*;
pub use world::*;

pub use log;
pub use math;
