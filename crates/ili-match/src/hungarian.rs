// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rectangular minimum-cost assignment via the Hungarian algorithm with
//! potentials (Jonker-Volgenant style shortest augmenting paths).
//!
//! Runs in O(rows² · cols) and returns exactly `min(rows, cols)` pairs.

use ili_core::IliError;

/// Solves the minimum-cost assignment over a row-major `rows x cols` cost
/// matrix. Returns `(row, col)` pairs sorted by row index.
///
/// Costs must be finite; infeasible cells should carry a large finite
/// penalty so the caller can filter the resulting pairs afterwards.
pub fn minimum_cost_assignment(
    costs: &[f64],
    rows: usize,
    cols: usize,
) -> Result<Vec<(usize, usize)>, IliError> {
    if costs.len() != rows * cols {
        return Err(IliError::invalid_input(format!(
            "cost matrix length {} does not match {rows}x{cols}",
            costs.len()
        )));
    }
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }
    if costs.iter().any(|c| !c.is_finite()) {
        return Err(IliError::numerical_issue(
            "assignment costs must be finite",
        ));
    }

    // The potentials formulation needs rows <= cols; transpose otherwise.
    if rows > cols {
        let mut transposed = vec![0.0; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                transposed[c * rows + r] = costs[r * cols + c];
            }
        }
        let mut pairs: Vec<(usize, usize)> = solve(&transposed, cols, rows)
            .into_iter()
            .map(|(r, c)| (c, r))
            .collect();
        pairs.sort_unstable();
        return Ok(pairs);
    }

    Ok(solve(costs, rows, cols))
}

/// Core solver; requires `rows <= cols`. Indices are 1-based internally,
/// with row 0 and column 0 as sentinels.
fn solve(costs: &[f64], rows: usize, cols: usize) -> Vec<(usize, usize)> {
    let mut u = vec![0.0; rows + 1];
    let mut v = vec![0.0; cols + 1];
    // p[j] is the row currently assigned to column j (0 = unassigned).
    let mut p = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for i in 1..=rows {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=cols {
                if used[j] {
                    continue;
                }
                let reduced = costs[(i0 - 1) * cols + (j - 1)] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=cols {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Augment along the recorded path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = (1..=cols)
        .filter(|&j| p[j] != 0)
        .map(|j| (p[j] - 1, j - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}
