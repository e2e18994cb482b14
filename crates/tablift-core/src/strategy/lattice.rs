use std::collections::BTreeMap;

use crate::extraction::{PageContent, Segment, Word};
use crate::strategy::append_text;
use crate::strategy::stream::cluster_rows;

/// Ruling positions closer than this (points) are the same line, and
/// segments closer than this touch.
const SNAP_TOLERANCE: f32 = 3.0;

/// Find tables bounded by ruling lines and return their raw cell grids,
/// top to bottom then left to right.
pub fn find_tables(page: &PageContent, segments: &[Segment]) -> Vec<Vec<Vec<String>>> {
    let mut found: Vec<(f32, f32, Vec<Vec<String>>)> = Vec::new();

    for component in connected_components(segments) {
        let ys = merge_positions(
            component
                .iter()
                .filter(|s| s.is_horizontal())
                .map(|s| s.y0),
        );
        let xs = merge_positions(component.iter().filter(|s| s.is_vertical()).map(|s| s.x0));

        if xs.len() < 2 || ys.len() < 2 || (xs.len() - 1) * (ys.len() - 1) < 2 {
            continue;
        }

        let grid = fill_cells(&page.words, &xs, &ys);
        if grid.iter().flatten().any(|cell| !cell.is_empty()) {
            found.push((ys[0], xs[0], grid));
        }
    }

    found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    found.into_iter().map(|(_, _, grid)| grid).collect()
}

fn touches(a: &Segment, b: &Segment) -> bool {
    a.x0 - SNAP_TOLERANCE <= b.x1
        && b.x0 - SNAP_TOLERANCE <= a.x1
        && a.y0 - SNAP_TOLERANCE <= b.y1
        && b.y0 - SNAP_TOLERANCE <= a.y1
}

/// Group segments that touch, directly or through other segments.
fn connected_components(segments: &[Segment]) -> Vec<Vec<Segment>> {
    let mut parent: Vec<usize> = (0..segments.len()).collect();
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if touches(&segments[i], &segments[j]) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<Segment>> = BTreeMap::new();
    for (i, segment) in segments.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(*segment);
    }
    groups.into_values().collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}

/// Sorted distinct positions, collapsing values within the snap tolerance.
fn merge_positions(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.collect();
    sorted.sort_by(f32::total_cmp);

    let mut merged: Vec<f32> = Vec::new();
    for v in sorted {
        match merged.last() {
            Some(last) if v - last <= SNAP_TOLERANCE => {}
            _ => merged.push(v),
        }
    }
    merged
}

fn locate(bounds: &[f32], v: f32) -> Option<usize> {
    bounds.windows(2).position(|w| v >= w[0] && v < w[1])
}

/// Place each word into the cell containing its center, in reading order.
fn fill_cells(words: &[Word], xs: &[f32], ys: &[f32]) -> Vec<Vec<String>> {
    let mut grid = vec![vec![String::new(); xs.len() - 1]; ys.len() - 1];
    for line in cluster_rows(words) {
        for word in line {
            let col = locate(xs, word.bbox.center_x());
            let row = locate(ys, word.bbox.center_y());
            if let (Some(row), Some(col)) = (row, col) {
                append_text(&mut grid[row][col], &word.text);
            }
        }
    }
    grid
}
