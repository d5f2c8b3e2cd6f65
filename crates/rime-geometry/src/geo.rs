//! Mesh-generator script: channel layout and control-point edits.
//!
//! The script lists the wall control points first (`Point(1)` to
//! `Point(N)`), then one centreline point per section boundary. The
//! channel is split into sections wherever the wall stops descending, and
//! each section is meshed as a transfinite block.

use crate::error::{GeometryError, GeometryResult};
use rime_core::{WallProfile, gradient};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cell counts across (`vertical`) and along (`horizontal`) the channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshDivisions {
    #[serde(default = "default_vertical")]
    pub vertical: usize,
    #[serde(default = "default_horizontal")]
    pub horizontal: usize,
}

fn default_vertical() -> usize {
    86
}

fn default_horizontal() -> usize {
    216
}

impl Default for MeshDivisions {
    fn default() -> Self {
        Self {
            vertical: default_vertical(),
            horizontal: default_horizontal(),
        }
    }
}

/// `Point(index) = {x, y, z, lc};`
#[derive(Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub lc: f64,
}

/// A generated channel script.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelGeo {
    pub script: String,
    /// Wall point indices (0-based) where sections start and end.
    pub section_bounds: Vec<usize>,
    /// Mesh vertices across the channel in every section.
    pub points_per_column: usize,
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Indices where the wall stops descending, bracketed by both ends.
fn section_bounds(y: &[f64]) -> GeometryResult<Vec<usize>> {
    let index: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    let slope = gradient(y, &index)?;
    let mut bounds = vec![0];
    for i in 0..slope.len() - 1 {
        if sign(slope[i]) == -1 && sign(slope[i + 1]) != -1 {
            bounds.push(i + 1);
        }
    }
    bounds.push(y.len() - 1);
    Ok(bounds)
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the extruded, transfinite channel script for `wall`.
pub fn write_channel_geo(wall: &WallProfile, divisions: &MeshDivisions) -> GeometryResult<ChannelGeo> {
    if divisions.vertical < 2 || divisions.horizontal < 2 {
        return Err(GeometryError::InvalidInput {
            what: format!(
                "mesh divisions must be at least 2, got {} x {}",
                divisions.vertical, divisions.horizontal
            ),
        });
    }

    let (x, y) = (wall.x(), wall.y());
    let n = x.len();
    let bounds = section_bounds(y)?;
    let sections = bounds.len() - 1;
    let points_per_column = (divisions.vertical as f64 / sections as f64).round_ties_even() as usize;
    if points_per_column < 2 {
        return Err(GeometryError::InvalidInput {
            what: format!(
                "{} vertical divisions cannot cover {sections} sections",
                divisions.vertical
            ),
        });
    }

    let mut out = vec!["SetFactory(\"OpenCASCADE\");".to_string()];
    for (i, (xi, yi)) in x.iter().zip(y).enumerate() {
        out.push(format!("Point({}) = {{{xi}, {yi}, 0, 1.0}};", i + 1));
    }

    let centreline: Vec<usize> = (0..=sections).map(|i| n + 1 + i).collect();
    for (i, &p) in centreline.iter().enumerate() {
        out.push(format!("Point({p}) = {{{}, 0, 0, 1.0}};", x[bounds[i]]));
    }

    let wall_curves: Vec<usize> = (1..=sections).collect();
    for (i, &c) in wall_curves.iter().enumerate() {
        let first = bounds[i] + 1;
        let last = bounds[i + 1] + 1;
        out.push(format!("Spline({c}) = {{{}}};", join(first..=last)));
    }

    let verticals: Vec<usize> = (0..=sections).map(|i| sections + i + 1).collect();
    for (i, &l) in verticals.iter().enumerate() {
        let wall_point = if i == 0 {
            1
        } else if i == sections {
            n
        } else {
            bounds[i] + 1
        };
        out.push(format!("Line({l}) = {{{}, {wall_point}}};", centreline[i]));
    }

    let bases: Vec<usize> = (0..sections)
        .map(|i| wall_curves.len() + verticals.len() + i + 1)
        .collect();
    for (i, &l) in bases.iter().enumerate() {
        out.push(format!("Line({l}) = {{{}, {}}};", centreline[i], centreline[i + 1]));
    }

    let span = bounds[sections] as f64;
    for i in 0..sections {
        let surface = i + 1;
        out.push(format!(
            "Curve Loop({surface}) = {{{}, -{}, -{}, {}}};",
            wall_curves[i],
            verticals[i + 1],
            bases[i],
            verticals[i]
        ));
        out.push(format!("Plane Surface({surface}) = {{{surface}}};"));

        let along = (divisions.horizontal as f64 * (bounds[i + 1] - bounds[i]) as f64 / span)
            .round_ties_even() as usize;
        let grading = if i == 0 {
            "Progression 0.995"
        } else if i == sections - 1 {
            "Progression 1.005"
        } else {
            "Bump 0.93"
        };
        for curve in [wall_curves[i], bases[i]] {
            out.push(format!("Transfinite Curve {{{curve}}} = {along} Using {grading};"));
        }
        for curve in [verticals[i + 1], verticals[i]] {
            out.push(format!(
                "Transfinite Curve {{{curve}}} = {points_per_column} Using Progression 0.935;"
            ));
        }
        out.push(format!("Transfinite Surface {{{surface}}};"));
        out.push(format!("Recombine Surface {{{surface}}};"));
    }

    out.push(format!(
        "out[] = Extrude {{0, 0, 1}} {{Surface{{{}}}; Layers{{1}}; Recombine;}};",
        join(1..=sections)
    ));

    let mut volumes = Vec::new();
    let mut outerwall = Vec::new();
    let mut symmetry = Vec::new();
    let mut lateral = vec!["1".to_string()];
    let mut outlet = Vec::new();
    for i in 0..sections {
        let base = 6 * i;
        volumes.push(if i == 0 {
            format!("out[{}]", base + 1)
        } else {
            (i + 1).to_string()
        });
        if i == sections - 1 {
            outlet.push(format!("out[{}]", base + 3));
        }
        outerwall.push(format!("out[{}]", base + 2));
        symmetry.push(format!("out[{}]", base + 4));
        lateral.push(format!("out[{base}]"));
        if i >= 1 {
            lateral.push(format!("out[{}]", base + 1));
        }
    }
    out.push(format!("Physical Volume(\"fluid\") = {{{}}};", join(volumes)));
    out.push("Physical Surface(\"inlet\") = {out[5]};".to_string());
    out.push(format!("Physical Surface(\"outlet\") = {{{}}};", join(outlet)));
    out.push(format!("Physical Surface(\"outerwall\") = {{{}}};", join(outerwall)));
    out.push(format!(
        "Physical Surface(\"longitudinal_symmetry\") = {{{}}};",
        join(symmetry)
    ));
    out.push(format!("Physical Surface(\"lateral_sides\") = {{{}}};", join(lateral)));

    let mut script = out.join("\n");
    script.push('\n');
    Ok(ChannelGeo {
        script,
        section_bounds: bounds,
        points_per_column,
    })
}

/// Split a `Point(...) = {...};` line into its index and coordinate tokens.
fn point_tokens(line: &str) -> Option<Result<(usize, Vec<&str>), String>> {
    let rest = line.trim_start().strip_prefix("Point(")?;
    let parsed = (|| -> Result<(usize, Vec<&str>), String> {
        let (index, rest) = rest
            .split_once(')')
            .ok_or_else(|| "missing ')'".to_string())?;
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("bad point index '{index}'"))?;
        let body = rest
            .split_once('{')
            .and_then(|(_, b)| b.split_once('}'))
            .map(|(b, _)| b)
            .ok_or_else(|| "missing '{...}'".to_string())?;
        let tokens: Vec<&str> = body.split(',').map(str::trim).collect();
        if tokens.len() < 3 {
            return Err(format!("expected at least 3 coordinates, got {}", tokens.len()));
        }
        Ok((index, tokens))
    })();
    Some(parsed)
}

fn number(token: &str, line: usize) -> GeometryResult<f64> {
    token.parse::<f64>().map_err(|_| GeometryError::Malformed {
        line,
        what: format!("'{token}' is not a number"),
    })
}

/// Every point definition in the script, in file order.
pub fn parse_points(script: &str) -> GeometryResult<Vec<GeoPoint>> {
    let mut points = Vec::new();
    for (i, line) in script.lines().enumerate() {
        let Some(parsed) = point_tokens(line) else {
            continue;
        };
        let (index, tokens) = parsed.map_err(|what| GeometryError::Malformed { line: i + 1, what })?;
        points.push(GeoPoint {
            index,
            x: number(tokens[0], i + 1)?,
            y: number(tokens[1], i + 1)?,
            z: number(tokens[2], i + 1)?,
            lc: match tokens.get(3) {
                Some(t) => number(t, i + 1)?,
                None => 1.0,
            },
        });
    }
    Ok(points)
}

/// Replace the `y` of the first `heights.len()` points. All other text is
/// kept as is.
pub fn update_point_heights(script: &str, heights: &[f64]) -> GeometryResult<String> {
    let mut out = String::with_capacity(script.len());
    let mut next = 0;
    for (i, line) in script.split_inclusive('\n').enumerate() {
        if next < heights.len() {
            if let Some(parsed) = point_tokens(line) {
                let (index, tokens) =
                    parsed.map_err(|what| GeometryError::Malformed { line: i + 1, what })?;
                number(tokens[1], i + 1)?;
                let mut coords: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
                coords[1] = heights[next].to_string();
                let newline = if line.ends_with('\n') { "\n" } else { "" };
                out.push_str(&format!("Point({index}) = {{{}}};{newline}", coords.join(", ")));
                next += 1;
                continue;
            }
        }
        out.push_str(line);
    }
    if next < heights.len() {
        return Err(GeometryError::InvalidInput {
            what: format!(
                "script has {next} points but {} heights were given",
                heights.len()
            ),
        });
    }
    Ok(out)
}

/// [`update_point_heights`] on a file, rewriting it in place.
pub fn update_geo_file(path: &Path, heights: &[f64]) -> GeometryResult<()> {
    let io = |source| GeometryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let script = fs::read_to_string(path).map_err(io)?;
    let updated = update_point_heights(&script, heights)?;
    fs::write(path, updated).map_err(io)
}
