//! # palmtips
//!
//! Fingertip estimation from a 2D hand silhouette.
//!
//! This crate provides:
//! - **Hand Model**: a parametric open palm (rectangle plus five finger rays at
//!   configurable angles and length ratios) and a two-element side view
//! - **MAP Assignment**: matching convex-hull vertices of a silhouette to finger
//!   classes with a nearest-neighbour likelihood and flat-prior Bayes rule
//! - **Observation pipeline**: contour in, hypothesis and estimate layouts out
//!
//! ## Algorithm Overview
//!
//! 1. Build the palm frame from a palm center and height
//! 2. Cast each finger's ray from the palm base at its default angle; the
//!    hypothesis tip lies `length_ratio * height` along it
//! 3. Take the convex hull of the silhouette; vertices above the palm center
//!    are fingertip candidates
//! 4. For each class, weight candidates within the search radius of its
//!    hypothesis by `1 / (1 + d)`, normalize, and apply Bayes rule
//! 5. Every candidate votes for its best class; the strongest vote per class
//!    wins; a complete one-to-one match is the estimate
//!
//! ## Quick Start
//!
//! ```rust
//! use palmtips::{BayesianAssigner, AssignmentStrategy, Finger, HandConfig, PalmarHand, Pixel};
//!
//! let config = HandConfig::default();
//! let model = PalmarHand::new(Pixel::new(128, 128), 100.0, &config).unwrap();
//!
//! // Idealized tips at the default angles
//! let hypotheses = model.hypotheses();
//! assert_eq!(hypotheses[&Finger::Middle], Pixel::new(128, -10));
//!
//! // Observed candidates: here the hypotheses themselves plus an outlier
//! let mut candidates: Vec<Pixel> = hypotheses.values().copied().collect();
//! candidates.push(Pixel::new(400, 400));
//!
//! let estimate = BayesianAssigner::from_config(&config)
//!     .assign(&candidates, &hypotheses)
//!     .expect("all five fingers match");
//! assert_eq!(estimate.get(Finger::Thumb), Some(hypotheses[&Finger::Thumb]));
//! ```

mod assign;
mod config;
mod error;
mod geometry;
mod hand;
mod index;
mod observation;
mod types;

pub use assign::{
    AssignmentStrategy, BayesianAssigner, ExhaustiveAssigner, HandEstimate, PosteriorTable,
    Strategy,
};
pub use config::{FingerSpec, HandConfig, PalmarConfig, SideConfig};
pub use error::{Error, Result};
pub use geometry::{intersect_lines, rotate_point, segments_properly_intersect};
pub use hand::{
    BaseEdge, Finger, FingerClass, FingerGeometry, HandLayout, HandModel, PalmFrame, PalmarHand,
    SideFinger, SideHand,
};
pub use index::{KdTree, Neighbor};
pub use observation::{observe, observe_batch, CandidateSet, Frame, Observation, PalmEstimate};
pub use types::{Pixel, Point};
