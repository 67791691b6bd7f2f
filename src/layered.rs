//! Deterministic left-to-right layered drawing (ranks, barycenter ordering, coordinates).

use std::collections::VecDeque;

use crate::config::LayoutConfig;
use crate::layout::{LayeredLayout, Point, Size};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sugiyama;

impl LayeredLayout for Sugiyama {
    fn centers(&self, sizes: &[Size], edges: &[(usize, usize)], config: &LayoutConfig) -> Vec<Point> {
        if sizes.is_empty() {
            return Vec::new();
        }
        let graph = Adjacency::new(sizes.len(), edges);
        let ranks = assign_ranks(&graph);
        let mut order = rank_buckets(&ranks);
        minimize_crossings(&mut order, &graph, &ranks, config.sweeps);
        assign_coordinates(&order, sizes, config)
    }
}

struct Adjacency {
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl Adjacency {
    fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut succ = vec![Vec::new(); n];
        let mut pred = vec![Vec::new(); n];
        for &(s, t) in edges {
            if s < n && t < n && s != t {
                succ[s].push(t);
                pred[t].push(s);
            }
        }
        Self { succ, pred }
    }
}

/// Longest-path ranking via Kahn's algorithm. Nodes caught in a cycle keep
/// the rank reached before the cycle was detected.
fn assign_ranks(graph: &Adjacency) -> Vec<usize> {
    let n = graph.succ.len();
    let mut indegree: Vec<usize> = graph.pred.iter().map(Vec::len).collect();
    let mut rank = vec![0; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
    while let Some(u) = queue.pop_front() {
        for &v in &graph.succ[u] {
            rank[v] = rank[v].max(rank[u] + 1);
            indegree[v] -= 1;
            if indegree[v] == 0 {
                queue.push_back(v);
            }
        }
    }
    rank
}

fn rank_buckets(ranks: &[usize]) -> Vec<Vec<usize>> {
    let count = ranks.iter().max().map_or(0, |r| r + 1);
    let mut buckets = vec![Vec::new(); count];
    for (v, &r) in ranks.iter().enumerate() {
        buckets[r].push(v);
    }
    buckets
}

fn positions(order: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut pos = vec![0; n];
    for rank in order {
        for (i, &v) in rank.iter().enumerate() {
            pos[v] = i;
        }
    }
    pos
}

/// Reorders `order[r]` by the mean position of each node's neighbours in the
/// adjacent rank `other`. Nodes without such neighbours keep their position.
fn reorder_rank(
    order: &mut [Vec<usize>],
    r: usize,
    other: usize,
    neighbours: &[Vec<usize>],
    ranks: &[usize],
    pos: &mut [usize],
) {
    let mut keyed: Vec<(f64, usize)> = order[r]
        .iter()
        .map(|&v| {
            let adjacent: Vec<usize> = neighbours[v].iter().copied().filter(|&u| ranks[u] == other).collect();
            let key = if adjacent.is_empty() {
                pos[v] as f64
            } else {
                adjacent.iter().map(|&u| pos[u] as f64).sum::<f64>() / adjacent.len() as f64
            };
            (key, v)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    order[r] = keyed.into_iter().map(|(_, v)| v).collect();
    for (i, &v) in order[r].iter().enumerate() {
        pos[v] = i;
    }
}

/// Crossings between all pairs of adjacent ranks.
fn count_crossings(order: &[Vec<usize>], graph: &Adjacency, ranks: &[usize]) -> usize {
    let pos = positions(order, ranks.len());
    let mut total = 0;
    for r in 0..order.len().saturating_sub(1) {
        let mut segments = Vec::new();
        for &u in &order[r] {
            for &v in &graph.succ[u] {
                if ranks[v] == r + 1 {
                    segments.push((pos[u], pos[v]));
                }
            }
        }
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}

fn minimize_crossings(order: &mut Vec<Vec<usize>>, graph: &Adjacency, ranks: &[usize], sweeps: usize) {
    let mut best = order.clone();
    let mut best_crossings = count_crossings(order, graph, ranks);
    let mut pos = positions(order, ranks.len());
    for _ in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        for r in 1..order.len() {
            reorder_rank(order, r, r - 1, &graph.pred, ranks, &mut pos);
        }
        for r in (0..order.len().saturating_sub(1)).rev() {
            reorder_rank(order, r, r + 1, &graph.succ, ranks, &mut pos);
        }
        let crossings = count_crossings(order, graph, ranks);
        if crossings < best_crossings {
            best_crossings = crossings;
            best.clone_from(order);
        }
    }
    *order = best;
}

fn assign_coordinates(order: &[Vec<usize>], sizes: &[Size], config: &LayoutConfig) -> Vec<Point> {
    let mut centers = vec![Point::default(); sizes.len()];
    let mut x = 0.0;
    for rank in order {
        let width = rank.iter().map(|&v| sizes[v].width).fold(0.0, f64::max);
        let height: f64 = rank.iter().map(|&v| sizes[v].height).sum::<f64>()
            + config.node_sep * rank.len().saturating_sub(1) as f64;
        let mut top = -height / 2.0;
        for &v in rank {
            centers[v] = Point { x: x + width / 2.0, y: top + sizes[v].height / 2.0 };
            top += sizes[v].height + config.node_sep;
        }
        x += width + config.rank_sep;
    }

    // Shift so the drawing starts at the origin.
    let min_x = centers.iter().zip(sizes).map(|(c, s)| c.x - s.width / 2.0).fold(f64::INFINITY, f64::min);
    let min_y = centers.iter().zip(sizes).map(|(c, s)| c.y - s.height / 2.0).fold(f64::INFINITY, f64::min);
    for c in &mut centers {
        c.x -= min_x;
        c.y -= min_y;
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(n: usize) -> Vec<Size> {
        vec![Size { width: 10.0, height: 10.0 }; n]
    }

    #[test]
    fn ranks_follow_longest_path() {
        let graph = Adjacency::new(4, &[(0, 1), (1, 2), (0, 2), (3, 2)]);
        assert_eq!(assign_ranks(&graph), vec![0, 1, 2, 0]);
    }

    #[test]
    fn barycenter_sweep_removes_a_crossing() {
        // 0 -> 3 and 1 -> 2 cross in input order.
        let edges = [(0, 3), (1, 2)];
        let graph = Adjacency::new(4, &edges);
        let ranks = assign_ranks(&graph);
        let mut order = rank_buckets(&ranks);
        assert_eq!(count_crossings(&order, &graph, &ranks), 1);
        minimize_crossings(&mut order, &graph, &ranks, 4);
        assert_eq!(count_crossings(&order, &graph, &ranks), 0);
    }

    #[test]
    fn siblings_are_separated_by_node_sep() {
        let config = LayoutConfig { node_sep: 5.0, rank_sep: 30.0, sweeps: 4 };
        let centers = Sugiyama.centers(&unit(3), &[(0, 1), (0, 2)], &config);
        assert_eq!(centers[0], Point { x: 5.0, y: 12.5 });
        assert_eq!(centers[1], Point { x: 45.0, y: 5.0 });
        assert_eq!(centers[2], Point { x: 45.0, y: 20.0 });
    }

    #[test]
    fn cycles_do_not_hang() {
        let centers = Sugiyama.centers(&unit(3), &[(0, 1), (1, 2), (2, 1)], &LayoutConfig::default());
        assert_eq!(centers.len(), 3);
    }

    #[test]
    fn empty_graph_has_no_points() {
        assert!(Sugiyama.centers(&[], &[], &LayoutConfig::default()).is_empty());
    }
}
