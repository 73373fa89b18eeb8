//! Justified-grid row-break optimisation (spec section 4.9 steps 1-5).
//!
//! Grounded on `original_source/src/internal/grid_layout.py`'s
//! `create_graph`/`generate_grid`: a DAG with out-degree 3 (`i -> i+1,
//! i+2, i+3`), weighted by `(MAX_ROW_HEIGHT - row_height)^2`, solved by
//! shortest path from `0` to a sentinel end node. SPEC_FULL.md / spec.md
//! section 9 calls for hand-rolled Dijkstra rather than a graph-library
//! dependency, since the 3-out-degree structure makes a generic library
//! pure overhead.

const MAX_ROW_HEIGHT: f64 = 1000.0;

/// One row of the chosen layout: the half-open image index range
/// `[start, end)` and its rendered height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub start: usize,
    pub end: usize,
    pub height_px: u32,
}

/// `row_height(i, j) = canvas_width / sum(w_k / h_k for k in [i, j))`
/// (spec section 4.9 step 3).
fn row_height(dims: &[(u32, u32)], start: usize, end: usize, canvas_width: u32) -> f64 {
    let ratio_sum: f64 = dims[start..end].iter().map(|&(w, h)| w as f64 / h as f64).sum();
    canvas_width as f64 / ratio_sum
}

fn edge_cost(dims: &[(u32, u32)], start: usize, end: usize, canvas_width: u32) -> f64 {
    let height = row_height(dims, start, end, canvas_width);
    (MAX_ROW_HEIGHT - height).powi(2)
}

/// Compute the optimal row breakdown for `dims` (one `(width, height)` per
/// input image — no sentinel needed, the caller doesn't supply one).
/// Returns `None` if `dims` is empty.
pub fn optimal_rows(dims: &[(u32, u32)], canvas_width: u32) -> Option<Vec<Row>> {
    if dims.is_empty() {
        return None;
    }
    let n = dims.len();

    // Dijkstra over nodes 0..=n, where node n is the sentinel "past the
    // last image" end node (spec section 4.9 step 1's `(0, 0)` sentinel
    // is folded into this index-based formulation rather than an actual
    // zero-sized entry).
    let mut dist = vec![f64::INFINITY; n + 1];
    let mut prev = vec![usize::MAX; n + 1];
    let mut visited = vec![false; n + 1];
    dist[0] = 0.0;

    for _ in 0..=n {
        let Some(u) = (0..=n)
            .filter(|&v| !visited[v] && dist[v].is_finite())
            .min_by(|&a, &b| dist[a].partial_cmp(&dist[b]).unwrap().then(a.cmp(&b)))
        else {
            break;
        };
        if u == n {
            break;
        }
        visited[u] = true;

        for v in (u + 1)..=(u + 3).min(n) {
            let cost = edge_cost(dims, u, v, canvas_width);
            let candidate = dist[u] + cost;
            // Tie-break toward lower node order: strictly-less keeps the
            // earliest-discovered (lowest `u`) predecessor on ties (spec
            // section 4.9, "Tie-break").
            if candidate < dist[v] {
                dist[v] = candidate;
                prev[v] = u;
            }
        }
    }

    if !dist[n].is_finite() {
        return None;
    }

    let mut path = vec![n];
    let mut cur = n;
    while cur != 0 {
        let p = prev[cur];
        if p == usize::MAX {
            return None;
        }
        path.push(p);
        cur = p;
    }
    path.reverse();

    let rows = path
        .windows(2)
        .map(|w| {
            let (start, end) = (w[0], w[1]);
            let height_px = row_height(dims, start, end, canvas_width).floor() as u32;
            Row { start, end, height_px }
        })
        .collect();
    Some(rows)
}

/// Canvas width = floor(mean input width * 1.5) (spec section 4.9 step 2).
pub fn canvas_width(dims: &[(u32, u32)]) -> u32 {
    let mean_w: f64 = dims.iter().map(|&(w, _)| w as f64).sum::<f64>() / dims.len() as f64;
    (mean_w * 1.5) as u32
}
