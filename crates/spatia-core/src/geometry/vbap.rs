//! VBAP simplex layouts
//!
//! A simplex is a pair (2-D) or triangle (3-D) of adjacent speakers with the
//! inverse of the matrix whose rows are their unit vectors. For a source
//! direction `p` the gains are `g = p * L^-1`; a simplex is active when all
//! gains are non-negative.

use super::hull::triangulate_hull;
use super::speaker::SpeakerArrayGeometry;
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, ConfigResult};
use crate::types::Position;

/// Determinant below which a speaker basis is considered singular
const DET_EPS: f64 = 1e-9;

/// Tolerance for gains at simplex boundaries
const GAIN_EPS: f64 = -1e-9;

/// Horizontal speaker pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplex2d {
    pub c1: usize,
    pub c2: usize,
    inv: [[f64; 2]; 2],
}

impl Simplex2d {
    fn new(c1: usize, c2: usize, p1: Position, p2: Position) -> ConfigResult<Self> {
        let det = p1.x * p2.y - p2.x * p1.y;
        if det.abs() < DET_EPS {
            return Err(ConfigError::DegenerateSimplex {
                first: c1,
                second: c2,
            });
        }
        let d = 1.0 / det;
        Ok(Self {
            c1,
            c2,
            inv: [[d * p2.y, -d * p1.y], [-d * p2.x, d * p1.x]],
        })
    }

    /// Normalised gains for direction `p`, if `p` lies within the pair
    pub fn gains(&self, p: &Position) -> Option<[f64; 2]> {
        let g1 = p.x * self.inv[0][0] + p.y * self.inv[1][0];
        let g2 = p.x * self.inv[0][1] + p.y * self.inv[1][1];
        if g1 < GAIN_EPS || g2 < GAIN_EPS {
            return None;
        }
        let (g1, g2) = (g1.max(0.0), g2.max(0.0));
        let norm = (g1 * g1 + g2 * g2).sqrt();
        if norm <= 0.0 {
            return None;
        }
        Some([g1 / norm, g2 / norm])
    }
}

/// 2-D VBAP layout: adjacent pairs of a horizontal ring
#[derive(Debug, Clone)]
pub struct Vbap2dLayout {
    simplices: Vec<Simplex2d>,
    channels: usize,
}

impl Vbap2dLayout {
    /// Build pairs of azimuth-adjacent speakers
    ///
    /// Requires at least three speakers, all on the horizontal plane, with
    /// every azimuth-adjacent pair less than 180 degrees apart so that each
    /// direction falls into exactly one pair.
    pub fn build(geometry: &SpeakerArrayGeometry) -> ConfigResult<Self> {
        let n = geometry.len();
        if n < 3 {
            return Err(ConfigError::TooFewChannels {
                algorithm: "vbap2d",
                required: 3,
                actual: n,
            });
        }
        for (index, spk) in geometry.iter().enumerate() {
            if spk.unit_vector.z.abs() > 1e-6 {
                return Err(ConfigError::ElevatedSpeaker {
                    index,
                    elevation_deg: spk.el.to_degrees(),
                });
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            geometry[a]
                .unit_vector
                .azim()
                .total_cmp(&geometry[b].unit_vector.azim())
        });

        let mut simplices = Vec::with_capacity(n);
        for k in 0..n {
            let c1 = order[k];
            let c2 = order[(k + 1) % n];
            let a1 = geometry[c1].unit_vector.azim();
            let mut a2 = geometry[c2].unit_vector.azim();
            if (a2 - a1).abs() < 1e-9 {
                return Err(ConfigError::DegenerateSimplex {
                    first: c1,
                    second: c2,
                });
            }
            if a2 < a1 {
                a2 += 2.0 * std::f64::consts::PI;
            }
            if a2 - a1 >= std::f64::consts::PI - 1e-9 {
                return Err(ConfigError::SpeakerGap {
                    first: c1,
                    second: c2,
                    degrees: (a2 - a1).to_degrees(),
                });
            }
            simplices.push(Simplex2d::new(
                c1,
                c2,
                geometry[c1].unit_vector,
                geometry[c2].unit_vector,
            )?);
        }
        log::debug!("VBAP 2-D layout: {} pairs for {} speakers", simplices.len(), n);
        Ok(Self {
            simplices,
            channels: n,
        })
    }

    pub fn simplices(&self) -> &[Simplex2d] {
        &self.simplices
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Write per-speaker gains for direction `p` into `gains`
    ///
    /// The first matching pair wins; on a shared speaker both neighbours
    /// yield the same result. Directions outside all pairs give silence.
    pub fn compute_gains(&self, p: &Position, gains: &mut [f64]) {
        gains.iter_mut().for_each(|g| *g = 0.0);
        let p = Position::new(p.x, p.y, 0.0).normal();
        for s in &self.simplices {
            if let Some([g1, g2]) = s.gains(&p) {
                gains[s.c1] = g1;
                gains[s.c2] = g2;
                return;
            }
        }
    }
}

/// Speaker triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplex3d {
    pub c1: usize,
    pub c2: usize,
    pub c3: usize,
    inv: [[f64; 3]; 3],
}

impl Simplex3d {
    fn new(c: [usize; 3], l: [Position; 3]) -> Option<Self> {
        let m = [
            [l[0].x, l[0].y, l[0].z],
            [l[1].x, l[1].y, l[1].z],
            [l[2].x, l[2].y, l[2].z],
        ];
        let det = m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        if det.abs() < DET_EPS {
            return None;
        }
        let d = 1.0 / det;
        let inv = [
            [
                (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * d,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * d,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * d,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * d,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * d,
                (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * d,
            ],
            [
                (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * d,
                (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * d,
                (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * d,
            ],
        ];
        Some(Self {
            c1: c[0],
            c2: c[1],
            c3: c[2],
            inv,
        })
    }

    /// Normalised gains for direction `p`, if `p` lies within the triangle
    pub fn gains(&self, p: &Position) -> Option<[f64; 3]> {
        let v = [p.x, p.y, p.z];
        let mut g = [0.0; 3];
        for (i, gi) in g.iter_mut().enumerate() {
            *gi = (0..3).map(|j| v[j] * self.inv[j][i]).sum();
            if *gi < GAIN_EPS {
                return None;
            }
            *gi = gi.max(0.0);
        }
        let norm = g.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 0.0 {
            return None;
        }
        Some([g[0] / norm, g[1] / norm, g[2] / norm])
    }
}

/// 3-D VBAP layout: triangles of the convex hull of speaker directions
#[derive(Debug, Clone)]
pub struct Vbap3dLayout {
    simplices: Vec<Simplex3d>,
    channels: usize,
}

impl Vbap3dLayout {
    /// Triangulate the speaker directions
    ///
    /// Requires at least four non-coplanar speakers. Hull faces whose plane
    /// passes through the array centre (e.g. the base of a dome) cannot be
    /// inverted and are skipped with a warning.
    pub fn build(
        geometry: &SpeakerArrayGeometry,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<Self> {
        let n = geometry.len();
        if n < 4 {
            return Err(ConfigError::TooFewChannels {
                algorithm: "vbap3d",
                required: 4,
                actual: n,
            });
        }
        let dirs = geometry.unit_vectors();
        let triangles = triangulate_hull(&dirs)?;

        let mut simplices = Vec::with_capacity(triangles.len());
        let mut skipped = 0usize;
        for t in triangles {
            match Simplex3d::new(t, [dirs[t[0]], dirs[t[1]], dirs[t[2]]]) {
                Some(s) => simplices.push(s),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            diagnostics.warn(
                "vbap3d",
                format!(
                    "{} hull faces pass through the array centre, directions behind them are silent",
                    skipped
                ),
            );
        }
        if simplices.is_empty() {
            return Err(ConfigError::InvalidHull(
                "no invertible speaker triangles".to_string(),
            ));
        }
        log::debug!(
            "VBAP 3-D layout: {} triangles for {} speakers",
            simplices.len(),
            n
        );
        Ok(Self {
            simplices,
            channels: n,
        })
    }

    pub fn simplices(&self) -> &[Simplex3d] {
        &self.simplices
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Write per-speaker gains for direction `p` into `gains`
    pub fn compute_gains(&self, p: &Position, gains: &mut [f64]) {
        gains.iter_mut().for_each(|g| *g = 0.0);
        let p = p.normal();
        for s in &self.simplices {
            if let Some([g1, g2, g3]) = s.gains(&p) {
                gains[s.c1] = g1;
                gains[s.c2] = g2;
                gains[s.c3] = g3;
                return;
            }
        }
    }
}
