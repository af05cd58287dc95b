//! Parametric open-hand model.
//!
//! The palm is an axis-aligned rectangle hanging below its `peak` and above its
//! `base`. Every finger is a ray from the palm `base` at a configurable angle;
//! where that ray leaves the palm rectangle is the finger's base point, and
//! the finger box is an oriented quad from the base point towards the tip.
//!
//! Two variants share the frame: the five-finger palmar view ([`Finger`]) and
//! the edge-on side view ([`SideFinger`]). Both are [`HandModel`]s, selected by
//! the finger class type parameter.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::hash::Hash;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::assign::HandEstimate;
use crate::config::{FingerSpec, HandConfig};
use crate::error::{Error, Result};
use crate::geometry::{intersect_lines, rotate_point, segments_properly_intersect};
use crate::types::{Pixel, Point};

/// Which side(s) of the palm rectangle a finger ray is intersected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEdge {
    Top,
    Right,
    /// Top edge if the ray crosses it, otherwise the left edge.
    TopOrLeft,
    /// Top edge if the ray crosses it, otherwise the right edge.
    TopOrRight,
}

/// A named finger of one model variant.
pub trait FingerClass:
    Copy + Eq + Ord + Hash + fmt::Debug + Serialize + Send + Sync + 'static
{
    /// Every class of the variant, in canonical order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn base_edge(self) -> BaseEdge;

    fn spec(self, config: &HandConfig) -> FingerSpec;

    /// Palm width as a fraction of palm height for this variant.
    fn width_ratio(config: &HandConfig) -> f64;

    /// Half-thickness of a finger box for this variant.
    fn finger_width(config: &HandConfig) -> f64;
}

/// Fingers of the palmar (open palm, front view) model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
    Thumb,
}

impl FingerClass for Finger {
    const ALL: &'static [Self] = &[
        Finger::Pinky,
        Finger::Ring,
        Finger::Middle,
        Finger::Index,
        Finger::Thumb,
    ];

    fn name(self) -> &'static str {
        match self {
            Finger::Pinky => "pinky",
            Finger::Ring => "ring",
            Finger::Middle => "middle",
            Finger::Index => "index",
            Finger::Thumb => "thumb",
        }
    }

    fn base_edge(self) -> BaseEdge {
        match self {
            Finger::Pinky => BaseEdge::TopOrLeft,
            Finger::Ring | Finger::Middle => BaseEdge::Top,
            Finger::Index => BaseEdge::TopOrRight,
            Finger::Thumb => BaseEdge::Right,
        }
    }

    fn spec(self, config: &HandConfig) -> FingerSpec {
        let palmar = &config.palmar;
        match self {
            Finger::Pinky => palmar.pinky,
            Finger::Ring => palmar.ring,
            Finger::Middle => palmar.middle,
            Finger::Index => palmar.index,
            Finger::Thumb => palmar.thumb,
        }
    }

    fn width_ratio(config: &HandConfig) -> f64 {
        config.palmar.width_ratio
    }

    fn finger_width(config: &HandConfig) -> f64 {
        config.palmar.finger_width
    }
}

/// Elements of the side-view model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFinger {
    Finger,
    Thumb,
}

impl FingerClass for SideFinger {
    const ALL: &'static [Self] = &[SideFinger::Finger, SideFinger::Thumb];

    fn name(self) -> &'static str {
        match self {
            SideFinger::Finger => "finger",
            SideFinger::Thumb => "thumb",
        }
    }

    fn base_edge(self) -> BaseEdge {
        match self {
            SideFinger::Finger => BaseEdge::TopOrRight,
            SideFinger::Thumb => BaseEdge::Right,
        }
    }

    fn spec(self, config: &HandConfig) -> FingerSpec {
        match self {
            SideFinger::Finger => config.side.finger,
            SideFinger::Thumb => config.side.thumb,
        }
    }

    fn width_ratio(config: &HandConfig) -> f64 {
        config.side.width_ratio
    }

    fn finger_width(config: &HandConfig) -> f64 {
        config.side.finger_width
    }
}

/// The palm rectangle. All derived points are recomputed from `center` and
/// `height` on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PalmFrame {
    center: Pixel,
    height: f64,
    width: i32,
}

impl PalmFrame {
    /// Build a frame whose width is `width_ratio * height`, rounded to pixels.
    pub fn new(center: Pixel, height: f64, width_ratio: f64) -> Result<Self> {
        if !(height.is_finite() && height > 0.0) {
            return Err(Error::InvalidInput(format!(
                "palm height must be positive, got {height}"
            )));
        }
        if !(width_ratio.is_finite() && width_ratio > 0.0) {
            return Err(Error::InvalidInput(format!(
                "palm width ratio must be positive, got {width_ratio}"
            )));
        }
        let width = (width_ratio * height).round() as i32;
        if width <= 0 {
            return Err(Error::InvalidInput(format!(
                "palm of height {height} is too small to have a width"
            )));
        }
        Ok(Self {
            center,
            height,
            width,
        })
    }

    pub fn center(&self) -> Pixel {
        self.center
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// Top-center of the palm.
    pub fn peak(&self) -> Pixel {
        Pixel::new(
            self.center.x,
            (self.center.y as f64 - self.height / 2.0).round() as i32,
        )
    }

    /// Bottom-center of the palm; every finger ray starts here.
    pub fn base(&self) -> Pixel {
        Pixel::new(
            self.center.x,
            (self.center.y as f64 + self.height / 2.0).round() as i32,
        )
    }

    fn half_width(&self) -> f64 {
        self.width as f64 / 2.0
    }

    pub fn top_left(&self) -> Pixel {
        let peak = self.peak();
        Pixel::new((peak.x as f64 - self.half_width()).round() as i32, peak.y)
    }

    pub fn top_right(&self) -> Pixel {
        let peak = self.peak();
        Pixel::new((peak.x as f64 + self.half_width()).round() as i32, peak.y)
    }

    pub fn bottom_right(&self) -> Pixel {
        let base = self.base();
        Pixel::new((base.x as f64 + self.half_width()).round() as i32, base.y)
    }

    pub fn bottom_left(&self) -> Pixel {
        let base = self.base();
        Pixel::new((base.x as f64 - self.half_width()).round() as i32, base.y)
    }

    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Pixel; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }

    fn top_edge(&self) -> [Point; 2] {
        [self.top_left().to_point(), self.top_right().to_point()]
    }

    fn left_edge(&self) -> [Point; 2] {
        [self.top_left().to_point(), self.bottom_left().to_point()]
    }

    fn right_edge(&self) -> [Point; 2] {
        [self.top_right().to_point(), self.bottom_right().to_point()]
    }
}

/// Everything derived for one finger at one angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FingerGeometry {
    pub tip: Pixel,
    pub basepoint: Pixel,
    pub length: f64,
    /// Oriented finger quad: far-left, far-right, near-right, near-left.
    pub bounding_box: [Pixel; 4],
}

/// Full geometric description of a model instance, for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandLayout<F: FingerClass> {
    pub peak: Pixel,
    pub base: Pixel,
    pub top_left: Pixel,
    pub top_right: Pixel,
    pub bottom_right: Pixel,
    pub bottom_left: Pixel,
    pub fingers: BTreeMap<F, FingerGeometry>,
}

/// The hand model for one variant.
///
/// Without overrides every tip is the hypothesis `base + ratio * height * (cos θ, sin θ)`.
/// With overrides (a MAP estimate) the tips are taken verbatim and each box is
/// aligned with the observed base-point-to-tip direction.
#[derive(Debug, Clone)]
pub struct HandModel<F: FingerClass> {
    frame: PalmFrame,
    config: HandConfig,
    overrides: BTreeMap<F, Pixel>,
}

pub type PalmarHand = HandModel<Finger>;
pub type SideHand = HandModel<SideFinger>;

impl<F: FingerClass> HandModel<F> {
    pub fn new(center: Pixel, height: f64, config: &HandConfig) -> Result<Self> {
        config.validate()?;
        let frame = PalmFrame::new(center, height, F::width_ratio(config))?;
        Ok(Self {
            frame,
            config: *config,
            overrides: BTreeMap::new(),
        })
    }

    /// Build a model whose tips are the points of a MAP estimate.
    pub fn with_estimate(
        center: Pixel,
        height: f64,
        config: &HandConfig,
        estimate: &HandEstimate<F>,
    ) -> Result<Self> {
        let mut model = Self::new(center, height, config)?;
        model.overrides = estimate.iter().collect();
        Ok(model)
    }

    pub fn frame(&self) -> &PalmFrame {
        &self.frame
    }

    pub fn config(&self) -> &HandConfig {
        &self.config
    }

    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Default ray angle for a finger, in radians.
    pub fn default_theta(&self, finger: F) -> f64 {
        finger.spec(&self.config).theta()
    }

    /// The idealized tip at angle `theta`, ignoring overrides.
    pub fn hypothesis_tip(&self, finger: F, theta: f64) -> Pixel {
        let spec = finger.spec(&self.config);
        let reach = spec.length_ratio * self.frame.height;
        let (sin, cos) = theta.sin_cos();
        let base = self.frame.base().to_point();
        (base + Point::new(cos, sin) * reach).round()
    }

    /// Hypothesis tips for every finger at its default angle.
    pub fn hypotheses(&self) -> BTreeMap<F, Pixel> {
        F::ALL
            .iter()
            .map(|&finger| (finger, self.hypothesis_tip(finger, self.default_theta(finger))))
            .collect()
    }

    /// The tip used for all derived geometry: the override if present,
    /// otherwise the hypothesis.
    pub fn tip(&self, finger: F, theta: f64) -> Pixel {
        match self.overrides.get(&finger) {
            Some(&tip) => tip,
            None => self.hypothesis_tip(finger, theta),
        }
    }

    /// Where the ray from the palm base to the tip meets the palm boundary.
    pub fn basepoint(&self, finger: F, theta: f64) -> Result<Pixel> {
        self.basepoint_for_tip(finger, self.tip(finger, theta))
    }

    fn basepoint_for_tip(&self, finger: F, tip: Pixel) -> Result<Pixel> {
        let ray = [self.frame.base().to_point(), tip.to_point()];
        let top = self.frame.top_edge();
        let crosses_top = || segments_properly_intersect(top[0], top[1], ray[0], ray[1]);

        let edge = match finger.base_edge() {
            BaseEdge::Top => top,
            BaseEdge::Right => self.frame.right_edge(),
            BaseEdge::TopOrLeft => {
                if crosses_top() {
                    top
                } else {
                    debug!("{}: ray misses top edge, using left edge", finger.name());
                    self.frame.left_edge()
                }
            }
            BaseEdge::TopOrRight => {
                if crosses_top() {
                    top
                } else {
                    debug!("{}: ray misses top edge, using right edge", finger.name());
                    self.frame.right_edge()
                }
            }
        };

        Ok(intersect_lines(edge, ray)?.round())
    }

    /// Distance from base point to tip.
    pub fn length(&self, finger: F, theta: f64) -> Result<f64> {
        let tip = self.tip(finger, theta);
        let basepoint = self.basepoint_for_tip(finger, tip)?;
        Ok(basepoint.distance(&tip))
    }

    /// Oriented finger box. See [`FingerGeometry::bounding_box`] for vertex order.
    pub fn finger_box(&self, finger: F, theta: f64) -> Result<[Pixel; 4]> {
        Ok(self.geometry(finger, theta)?.bounding_box)
    }

    pub fn geometry(&self, finger: F, theta: f64) -> Result<FingerGeometry> {
        let tip = self.tip(finger, theta);
        let basepoint = self.basepoint_for_tip(finger, tip)?;
        let length = basepoint.distance(&tip);

        let direction = if self.overrides.contains_key(&finger) {
            let d = tip.to_point() - basepoint.to_point();
            d.y.atan2(d.x)
        } else {
            theta
        };

        Ok(FingerGeometry {
            tip,
            basepoint,
            length,
            bounding_box: self.oriented_box(basepoint, length, direction),
        })
    }

    /// Build an upright box of the finger's length on the base point, then
    /// swing it about the base point to point along `direction`.
    fn oriented_box(&self, basepoint: Pixel, length: f64, direction: f64) -> [Pixel; 4] {
        let half = F::finger_width(&self.config);
        let near = basepoint.to_point();
        let far = Point::new(near.x, near.y - length + 2.0);

        let upright = [
            Point::new(far.x - half, far.y),
            Point::new(far.x + half, far.y),
            Point::new(near.x + half, near.y),
            Point::new(near.x - half, near.y),
        ];

        // An upright box points along -y, i.e. angle -90 degrees.
        let rotation = direction + FRAC_PI_2;
        upright.map(|corner| rotate_point(corner, near, rotation).round())
    }

    /// Layout of every finger at its default angle.
    pub fn layout(&self) -> Result<HandLayout<F>> {
        let fingers = F::ALL
            .iter()
            .map(|&finger| Ok((finger, self.geometry(finger, self.default_theta(finger))?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(HandLayout {
            peak: self.frame.peak(),
            base: self.frame.base(),
            top_left: self.frame.top_left(),
            top_right: self.frame.top_right(),
            bottom_right: self.frame.bottom_right(),
            bottom_left: self.frame.bottom_left(),
            fingers,
        })
    }
}
