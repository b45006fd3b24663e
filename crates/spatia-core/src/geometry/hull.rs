//! Convex hull triangulation of speaker directions
//!
//! Speaker counts are small (tens of channels) and the hull is computed once
//! per configuration, so a supporting-plane search is used: every plane
//! through three points that has all other points on one side is a hull
//! face. Faces with more than three coplanar members are fan-triangulated.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Position;

const PLANE_EPS: f64 = 1e-9;

/// Triangulate the convex hull of `points`
///
/// Returns triangles as index triples into `points`. Fails with
/// [`ConfigError::FlatLayout`] if all points are coplanar.
pub fn triangulate_hull(points: &[Position]) -> ConfigResult<Vec<[usize; 3]>> {
    let n = points.len();
    if n < 4 {
        return Err(ConfigError::TooFewChannels {
            algorithm: "convex hull",
            required: 4,
            actual: n,
        });
    }
    if is_flat(points) {
        return Err(ConfigError::FlatLayout);
    }

    let mut seen_faces: HashSet<Vec<usize>> = HashSet::new();
    let mut triangles = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let nrm = (points[j] - points[i]).cross(&(points[k] - points[i]));
                if nrm.norm() < PLANE_EPS {
                    continue;
                }
                let nrm = nrm.normal();

                let mut above = false;
                let mut below = false;
                let mut members = Vec::new();
                for (m, p) in points.iter().enumerate() {
                    let d = nrm.dot(&(*p - points[i]));
                    if d > PLANE_EPS {
                        above = true;
                    } else if d < -PLANE_EPS {
                        below = true;
                    } else {
                        members.push(m);
                    }
                    if above && below {
                        break;
                    }
                }
                if above && below {
                    continue;
                }
                if !seen_faces.insert(members.clone()) {
                    continue;
                }
                let outward = if above { -nrm } else { nrm };
                fan_triangulate(points, &members, outward, &mut triangles);
            }
        }
    }

    if triangles.len() < 4 {
        return Err(ConfigError::InvalidHull(format!(
            "only {} faces found",
            triangles.len()
        )));
    }
    Ok(triangles)
}

/// True if no point lies off the plane of any non-degenerate triple
fn is_flat(points: &[Position]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let nrm = (points[j] - points[i]).cross(&(points[k] - points[i]));
                if nrm.norm() < PLANE_EPS {
                    continue;
                }
                let nrm = nrm.normal();
                return points
                    .iter()
                    .all(|p| nrm.dot(&(*p - points[i])).abs() <= PLANE_EPS);
            }
        }
    }
    // all points collinear or coincident
    true
}

/// Order the members of a planar face by angle and emit a triangle fan
fn fan_triangulate(
    points: &[Position],
    members: &[usize],
    outward: Position,
    triangles: &mut Vec<[usize; 3]>,
) {
    if members.len() == 3 {
        triangles.push([members[0], members[1], members[2]]);
        return;
    }
    let centroid = members
        .iter()
        .fold(Position::default(), |acc, &m| acc + points[m])
        * (1.0 / members.len() as f64);
    let u = (points[members[0]] - centroid).normal();
    let v = outward.cross(&u);

    let mut ordered: Vec<(f64, usize)> = members
        .iter()
        .map(|&m| {
            let d = points[m] - centroid;
            (v.dot(&d).atan2(u.dot(&d)), m)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first = ordered[0].1;
    for w in ordered[1..].windows(2) {
        let (b, c) = (w[0].1, w[1].1);
        let area = (points[b] - points[first]).cross(&(points[c] - points[first]));
        if area.norm() > PLANE_EPS {
            triangles.push([first, b, c]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octahedron() -> Vec<Position> {
        vec![
            Position::new(1.0, 0.0, 0.0),
            Position::new(0.0, 1.0, 0.0),
            Position::new(-1.0, 0.0, 0.0),
            Position::new(0.0, -1.0, 0.0),
            Position::new(0.0, 0.0, 1.0),
            Position::new(0.0, 0.0, -1.0),
        ]
    }

    #[test]
    fn test_octahedron_has_eight_faces() {
        let tris = triangulate_hull(&octahedron()).unwrap();
        assert_eq!(tris.len(), 8);
        // every triangle uses exactly one pole
        for t in &tris {
            let poles = t.iter().filter(|&&i| i >= 4).count();
            assert_eq!(poles, 1);
        }
    }

    #[test]
    fn test_cube_faces_are_split() {
        let mut pts = Vec::new();
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    pts.push(Position::new(x, y, z));
                }
            }
        }
        let tris = triangulate_hull(&pts).unwrap();
        // six square faces, two triangles each
        assert_eq!(tris.len(), 12);
    }

    #[test]
    fn test_flat_layout_rejected() {
        let ring: Vec<Position> = (0..8)
            .map(|k| Position::from_sphere_deg(1.0, 45.0 * k as f64, 0.0))
            .collect();
        assert_eq!(triangulate_hull(&ring), Err(ConfigError::FlatLayout));
    }

    #[test]
    fn test_too_few_points() {
        let pts = vec![Position::FRONT; 3];
        assert!(matches!(
            triangulate_hull(&pts),
            Err(ConfigError::TooFewChannels { required: 4, .. })
        ));
    }
}
