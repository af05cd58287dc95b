//! Per-frame pipeline from a silhouette contour to a fingertip estimate.

use imageproc::geometry::convex_hull;
use imageproc::point::Point as HullPoint;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assign::{AssignmentStrategy, HandEstimate};
use crate::config::HandConfig;
use crate::error::{Error, Result};
use crate::hand::{Finger, HandLayout, PalmarHand};
use crate::types::Pixel;

/// Offset from the wrist contour point to the palm base, in pixels.
const WRIST_OFFSET: Pixel = Pixel::new(8, 10);

/// Convex-hull vertices of a silhouette lying above the palm center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet {
    points: Vec<Pixel>,
}

impl CandidateSet {
    /// Hull the contour and keep the distinct vertices strictly above
    /// `palm_center` (smaller y), in hull order.
    pub fn from_contour(contour: &[Pixel], palm_center: Pixel) -> Result<Self> {
        if contour.is_empty() {
            return Err(Error::InvalidInput("contour is empty".into()));
        }

        let outline: Vec<HullPoint<i32>> =
            contour.iter().map(|p| HullPoint::new(p.x, p.y)).collect();
        let hull = convex_hull(&outline[..]);

        let mut points: Vec<Pixel> = Vec::with_capacity(hull.len());
        for vertex in hull {
            let p = Pixel::new(vertex.x, vertex.y);
            if p.y < palm_center.y && !points.contains(&p) {
                points.push(p);
            }
        }

        debug!(
            "{} contour points, {} fingertip candidates above y = {}",
            contour.len(),
            points.len(),
            palm_center.y
        );
        Ok(Self { points })
    }

    pub fn from_points(points: Vec<Pixel>) -> Self {
        let mut unique: Vec<Pixel> = Vec::with_capacity(points.len());
        for p in points {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        Self { points: unique }
    }

    pub fn as_slice(&self) -> &[Pixel] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Palm center and height recovered from a contour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PalmEstimate {
    pub center: Pixel,
    pub height: f64,
}

impl PalmEstimate {
    /// Derive the palm frame from the center of the silhouette's enclosing
    /// circle.
    ///
    /// The lowest contour point directly below or above the circle center is
    /// taken as the wrist; the palm spans from the circle center down to it.
    pub fn from_contour(contour: &[Pixel], circle_center: Pixel) -> Result<Self> {
        if contour.is_empty() {
            return Err(Error::InvalidInput("contour is empty".into()));
        }

        let wrist = contour
            .iter()
            .filter(|p| p.x == circle_center.x)
            .max_by_key(|p| p.y)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "no contour point at x = {} below the enclosing circle center",
                    circle_center.x
                ))
            })?;

        let height = wrist.y - circle_center.y;
        if height <= 0 {
            return Err(Error::InvalidInput(format!(
                "wrist at {:?} is not below the enclosing circle center {:?}",
                wrist, circle_center
            )));
        }

        let base = Pixel::new(wrist.x - WRIST_OFFSET.x, wrist.y - WRIST_OFFSET.y);
        let center = Pixel::new(base.x, base.y - height / 2);

        Ok(Self {
            center,
            height: height as f64,
        })
    }
}

/// One frame's input: a silhouette and the palm frame estimated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub contour: Vec<Pixel>,
    pub palm_center: Pixel,
    pub palm_height: f64,
}

/// Everything computed for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub palm_center: Pixel,
    pub palm_height: f64,
    pub candidates: CandidateSet,
    /// The idealized hand at default angles.
    pub hypothesis: HandLayout<Finger>,
    /// The MAP estimate, if every finger was matched.
    pub estimate: Option<HandEstimate>,
    /// The hand redrawn through the estimated tips.
    pub estimate_layout: Option<HandLayout<Finger>>,
}

impl Observation {
    pub fn is_complete(&self) -> bool {
        self.estimate.is_some()
    }
}

/// Run the hand model and the assignment strategy on one silhouette.
pub fn observe<S: AssignmentStrategy>(
    contour: &[Pixel],
    palm_center: Pixel,
    palm_height: f64,
    config: &HandConfig,
    strategy: &S,
) -> Result<Observation> {
    let model = PalmarHand::new(palm_center, palm_height, config)?;
    let candidates = CandidateSet::from_contour(contour, palm_center)?;
    let hypothesis = model.layout()?;

    let estimate = strategy.assign(candidates.as_slice(), &model.hypotheses());
    let estimate_layout = match &estimate {
        Some(estimate) => Some(
            PalmarHand::with_estimate(palm_center, palm_height, config, estimate)?.layout()?,
        ),
        None => None,
    };

    Ok(Observation {
        palm_center,
        palm_height,
        candidates,
        hypothesis,
        estimate,
        estimate_layout,
    })
}

/// [`observe`] over independent frames in parallel. Results keep frame order.
pub fn observe_batch<S: AssignmentStrategy + Sync>(
    frames: &[Frame],
    config: &HandConfig,
    strategy: &S,
) -> Vec<Result<Observation>> {
    frames
        .par_iter()
        .map(|frame| {
            observe(
                &frame.contour,
                frame.palm_center,
                frame.palm_height,
                config,
                strategy,
            )
        })
        .collect()
}
