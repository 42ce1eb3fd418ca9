//! Line series: conversion, simplification and gap filling.

use super::Point;

/// Map time-ordered `(x, y)` pairs to points, keeping their order.
pub fn to_points<I>(series: I) -> Vec<Point>
where
    I: IntoIterator<Item = (i64, f64)>,
{
    series
        .into_iter()
        .map(|(x, y)| Point::new(x as f64, y))
        .collect()
}

/// Ramer-Douglas-Peucker line simplification.
///
/// Keeps the endpoints and every point farther than `epsilon` from the line
/// through the endpoints of its span, recursing into both halves. Collinear
/// input collapses to its two endpoints.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    // Explicit stack of spans instead of recursion
    let mut spans = vec![(0, points.len() - 1)];
    while let Some((first, last)) = spans.pop() {
        if last <= first + 1 {
            continue;
        }
        let (index, distance) = farthest_point(points, first, last);
        if distance > epsilon {
            keep[index] = true;
            spans.push((first, index));
            spans.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

fn farthest_point(points: &[Point], first: usize, last: usize) -> (usize, f64) {
    let (start, end) = (points[first], points[last]);
    let mut best = (first, 0.0);
    for (offset, point) in points[first + 1..last].iter().enumerate() {
        let distance = perpendicular_distance(*point, start, end);
        if distance > best.1 {
            best = (first + 1 + offset, distance);
        }
    }
    best
}

/// Distance from `point` to the line through `a` and `b`.
///
/// Uses the two-point form so vertical lines need no slope; when `a == b`
/// this is the distance to `a`.
fn perpendicular_distance(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (point.x - a.x).hypot(point.y - a.y);
    }
    (dy * point.x - dx * point.y + b.x * a.y - b.y * a.x).abs() / length
}

/// Insert `replacement` points into gaps wider than `accuracy`.
///
/// Filler points sit every `accuracy` after the point opening the gap, so an
/// offline period draws as a flat line at `replacement`.
pub fn fill_missing(points: &[Point], accuracy: i64, replacement: f64) -> Vec<Point> {
    if accuracy <= 0 {
        return points.to_vec();
    }
    let step = accuracy as f64;
    let mut filled = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            let previous = points[i - 1];
            if point.x - previous.x > step {
                let mut x = previous.x + step;
                while x < point.x {
                    filled.push(Point::new(x, replacement));
                    x += step;
                }
            }
        }
        filled.push(*point);
    }
    filled
}
