use thiserror::Error;

/// Malformed input, rejected before any visibility work starts
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PvsError {
    #[error("region {region} has no leaves")]
    EmptyRegion { region: usize },
    #[error("portal {portal} of region {region} has {count} vertices, at least 3 are required")]
    TooFewVertices {
        region: usize,
        portal: usize,
        count: usize,
    },
    #[error("portal {portal} of region {region} has no valid plane")]
    InvalidPlane { region: usize, portal: usize },
    #[error(
        "vertex {vertex} of portal {portal} in region {region} is {distance:.3} units off its plane"
    )]
    NotPlanar {
        region: usize,
        portal: usize,
        vertex: usize,
        distance: f64,
    },
}
