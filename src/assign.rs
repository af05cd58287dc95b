//! Matching observed fingertip candidates to finger classes.
//!
//! The default [`BayesianAssigner`] scores every (candidate, class) pair with a
//! nearest-neighbour likelihood around the class hypothesis, applies Bayes'
//! rule with flat priors, lets every candidate vote for its best class and
//! keeps the strongest vote per class. Only a complete one-to-one match of all
//! classes is reported; anything less is "no estimate".
//!
//! [`ExhaustiveAssigner`] is the older brute-force alternative: try every
//! subset of candidates and keep the one closest to the hypotheses.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use crate::config::HandConfig;
use crate::hand::{Finger, FingerClass};
use crate::index::KdTree;
use crate::types::{Pixel, Point};

/// A complete, injective finger → point assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HandEstimate<F: FingerClass = Finger> {
    points: BTreeMap<F, Pixel>,
}

impl<F: FingerClass> HandEstimate<F> {
    /// Accepts the map only if it covers every class and no two classes share
    /// a point.
    pub fn from_points(points: BTreeMap<F, Pixel>) -> Option<Self> {
        if F::ALL.iter().any(|finger| !points.contains_key(finger)) {
            return None;
        }
        let distinct: BTreeSet<Pixel> = points.values().copied().collect();
        if distinct.len() != points.len() {
            return None;
        }
        Some(Self { points })
    }

    pub fn get(&self, finger: F) -> Option<Pixel> {
        self.points.get(&finger).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, Pixel)> + '_ {
        self.points.iter().map(|(&finger, &point)| (finger, point))
    }

    pub fn points(&self) -> &BTreeMap<F, Pixel> {
        &self.points
    }
}

/// A way of turning candidates and hypotheses into an estimate.
pub trait AssignmentStrategy {
    fn assign<F: FingerClass>(
        &self,
        candidates: &[Pixel],
        hypotheses: &BTreeMap<F, Pixel>,
    ) -> Option<HandEstimate<F>>;
}

/// Likelihoods and posteriors for every (candidate, class) pair of one
/// observation.
#[derive(Debug, Clone)]
pub struct PosteriorTable<F: FingerClass> {
    candidates: usize,
    /// Row-major: `likelihoods[candidate * classes + class]`.
    likelihoods: Vec<f64>,
    class_prior: f64,
    candidate_prior: f64,
    _class: std::marker::PhantomData<F>,
}

impl<F: FingerClass> PosteriorTable<F> {
    fn class_slot(finger: F) -> usize {
        F::ALL
            .iter()
            .position(|&f| f == finger)
            .unwrap_or_else(|| unreachable!("{finger:?} is not listed in FingerClass::ALL"))
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates
    }

    /// `P(candidate | class)`.
    pub fn likelihood(&self, candidate: usize, finger: F) -> f64 {
        self.likelihoods[candidate * F::ALL.len() + Self::class_slot(finger)]
    }

    /// `P(class | candidate) = P(candidate | class) P(class) / P(candidate)`.
    pub fn posterior(&self, candidate: usize, finger: F) -> f64 {
        self.likelihood(candidate, finger) * self.class_prior / self.candidate_prior
    }

    /// The class with the highest non-zero posterior for this candidate.
    /// Earlier classes win ties.
    pub fn best_class(&self, candidate: usize) -> Option<(F, f64)> {
        let mut best: Option<(F, f64)> = None;
        for &finger in F::ALL {
            let p = self.posterior(candidate, finger);
            if p > best.map_or(0.0, |(_, bp)| bp) {
                best = Some((finger, p));
            }
        }
        best
    }
}

/// Nearest-neighbour weighted MAP assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesianAssigner {
    search_radius: f64,
}

impl BayesianAssigner {
    pub fn new(search_radius: f64) -> Self {
        Self { search_radius }
    }

    pub fn from_config(config: &HandConfig) -> Self {
        Self::new(config.search_radius)
    }

    pub fn search_radius(&self) -> f64 {
        self.search_radius
    }

    /// Score every candidate against every class hypothesis.
    ///
    /// For each class the candidates within the search radius of its
    /// hypothesis are weighted by `1 / (1 + d)` and normalized, so the
    /// likelihoods of one class sum to 1 (or 0 when nothing is in range).
    pub fn posteriors<F: FingerClass>(
        &self,
        candidates: &[Pixel],
        hypotheses: &BTreeMap<F, Pixel>,
    ) -> PosteriorTable<F> {
        let n = candidates.len();
        let classes = F::ALL.len();
        let mut likelihoods = vec![0.0; n * classes];

        let points: Vec<Point> = candidates.iter().map(|p| p.to_point()).collect();
        let index = KdTree::build(&points);

        for (slot, finger) in F::ALL.iter().enumerate() {
            let Some(hypothesis) = hypotheses.get(finger) else {
                continue;
            };
            let neighbors = index.nearest(hypothesis.to_point(), n, self.search_radius);
            let weights: Vec<f64> = neighbors.iter().map(|nb| 1.0 / (1.0 + nb.distance)).collect();
            let total: f64 = weights.iter().sum();
            for (nb, w) in neighbors.iter().zip(&weights) {
                likelihoods[nb.index * classes + slot] = w / total;
            }
            debug!(
                "{}: {} candidate(s) within {} of {:?}",
                finger.name(),
                neighbors.len(),
                self.search_radius,
                hypothesis
            );
        }

        PosteriorTable {
            candidates: n,
            likelihoods,
            class_prior: 1.0 / classes as f64,
            candidate_prior: if n == 0 { 1.0 } else { 1.0 / n as f64 },
            _class: std::marker::PhantomData,
        }
    }
}

impl Default for BayesianAssigner {
    fn default() -> Self {
        Self::from_config(&HandConfig::default())
    }
}

impl AssignmentStrategy for BayesianAssigner {
    fn assign<F: FingerClass>(
        &self,
        candidates: &[Pixel],
        hypotheses: &BTreeMap<F, Pixel>,
    ) -> Option<HandEstimate<F>> {
        let classes = F::ALL.len();
        if candidates.len() < classes {
            debug!(
                "only {} candidate(s) for {} classes, no estimate",
                candidates.len(),
                classes
            );
            return None;
        }

        let table = self.posteriors(candidates, hypotheses);

        let mut winners: BTreeMap<F, (usize, f64)> = BTreeMap::new();
        for candidate in 0..table.num_candidates() {
            let Some((finger, posterior)) = table.best_class(candidate) else {
                continue;
            };
            match winners.entry(finger) {
                Entry::Vacant(e) => {
                    e.insert((candidate, posterior));
                }
                Entry::Occupied(mut e) => {
                    let (held, held_posterior) = *e.get();
                    debug!(
                        "{}: candidates {} and {} collide ({:.4} vs {:.4})",
                        finger.name(),
                        held,
                        candidate,
                        held_posterior,
                        posterior
                    );
                    if posterior > held_posterior {
                        e.insert((candidate, posterior));
                    }
                }
            }
        }

        if winners.len() != classes {
            debug!("resolved {} of {} classes, no estimate", winners.len(), classes);
            return None;
        }

        HandEstimate::from_points(
            winners
                .into_iter()
                .map(|(finger, (candidate, _))| (finger, candidates[candidate]))
                .collect(),
        )
    }
}

/// Brute-force matching over every subset of candidates of the class count.
///
/// Each class takes the nearest subset member within the search radius; a
/// subset qualifies only if every class finds a distinct member, and the
/// qualifying subset with the smallest summed distance wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExhaustiveAssigner {
    search_radius: f64,
}

impl ExhaustiveAssigner {
    pub fn new(search_radius: f64) -> Self {
        Self { search_radius }
    }

    pub fn from_config(config: &HandConfig) -> Self {
        Self::new(config.search_radius)
    }
}

impl AssignmentStrategy for ExhaustiveAssigner {
    fn assign<F: FingerClass>(
        &self,
        candidates: &[Pixel],
        hypotheses: &BTreeMap<F, Pixel>,
    ) -> Option<HandEstimate<F>> {
        let classes = F::ALL.len();
        if candidates.len() < classes {
            return None;
        }

        let mut best: Option<(f64, BTreeMap<F, Pixel>)> = None;
        for_each_combination(candidates.len(), classes, |subset| {
            let points: Vec<Point> = subset.iter().map(|&i| candidates[i].to_point()).collect();
            let index = KdTree::build(&points);

            let mut total = 0.0;
            let mut chosen = BTreeMap::new();
            let mut used = BTreeSet::new();
            for finger in F::ALL {
                let Some(hypothesis) = hypotheses.get(finger) else {
                    return;
                };
                let Some(nearest) = index
                    .nearest(hypothesis.to_point(), 1, self.search_radius)
                    .first()
                    .copied()
                else {
                    return;
                };
                if !used.insert(nearest.index) {
                    return;
                }
                total += nearest.distance;
                chosen.insert(*finger, candidates[subset[nearest.index]]);
            }

            if best.as_ref().map_or(true, |(score, _)| total < *score) {
                best = Some((total, chosen));
            }
        });

        match best {
            Some((total, points)) => {
                debug!("exhaustive match with total distance {total:.3}");
                HandEstimate::from_points(points)
            }
            None => {
                debug!("no subset of {} candidates matched every class", candidates.len());
                None
            }
        }
    }
}

/// Strategy selected at run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Bayesian(BayesianAssigner),
    Exhaustive(ExhaustiveAssigner),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Bayesian(BayesianAssigner::default())
    }
}

impl AssignmentStrategy for Strategy {
    fn assign<F: FingerClass>(
        &self,
        candidates: &[Pixel],
        hypotheses: &BTreeMap<F, Pixel>,
    ) -> Option<HandEstimate<F>> {
        match self {
            Strategy::Bayesian(s) => s.assign(candidates, hypotheses),
            Strategy::Exhaustive(s) => s.assign(candidates, hypotheses),
        }
    }
}

/// Calls `f` with every `k`-element subset of `0..n` in lexicographic order.
fn for_each_combination<G: FnMut(&[usize])>(n: usize, k: usize, mut f: G) {
    if k > n {
        return;
    }
    let mut subset: Vec<usize> = (0..k).collect();
    loop {
        f(&subset);

        // Advance the rightmost position that still has room.
        let Some(i) = (0..k).rev().find(|&i| subset[i] < n - k + i) else {
            return;
        };
        subset[i] += 1;
        for j in i + 1..k {
            subset[j] = subset[j - 1] + 1;
        }
    }
}
