// Dense linear algebra helpers shared by spectral layout and centrality

/// Dense row-major square matrix
pub type Matrix = Vec<Vec<f64>>;

pub fn zeros(n: usize) -> Matrix {
    vec![vec![0.0; n]; n]
}

pub fn identity(n: usize) -> Matrix {
    let mut m = zeros(n);
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

/// y = A x
pub fn mat_vec(a: &Matrix, x: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(x).map(|(aij, xj)| aij * xj).sum())
        .collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Scale to unit Euclidean length; returns false for the zero vector
pub fn normalize_l2(v: &mut [f64]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    true
}

/// Scale so the entries sum to one; returns false when the sum is zero
pub fn normalize_l1(v: &mut [f64]) -> bool {
    let sum: f64 = v.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= sum);
    true
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues in ascending order and the matching unit eigenvectors,
/// `vectors[k]` belonging to `values[k]`.
pub fn symmetric_eigen(matrix: &Matrix) -> (Vec<f64>, Vec<Vec<f64>>) {
    const MAX_SWEEPS: usize = 100;
    let n = matrix.len();
    let mut a = matrix.clone();
    let mut v = identity(n);

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < 1e-22 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[i][i].total_cmp(&a[j][j]));

    let values = order.iter().map(|&k| a[k][k]).collect();
    let vectors = order.iter()
        .map(|&k| (0..n).map(|row| v[row][k]).collect())
        .collect();
    (values, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_eigen_diagonalises() {
        let m = vec![
            vec![2.0, 1.0, 0.0],
            vec![1.0, 2.0, 1.0],
            vec![0.0, 1.0, 2.0],
        ];
        let (values, vectors) = symmetric_eigen(&m);
        let expected = [2.0 - 2f64.sqrt(), 2.0, 2.0 + 2f64.sqrt()];
        for (got, want) in values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
        for (value, vector) in values.iter().zip(&vectors) {
            let av = mat_vec(&m, vector);
            for (x, y) in av.iter().zip(vector) {
                assert!((x - value * y).abs() < 1e-9);
            }
            assert!((l2_norm(vector) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        assert!(normalize_l2(&mut v));
        assert!((v[0] - 0.6).abs() < 1e-12);

        let mut z = vec![0.0, 0.0];
        assert!(!normalize_l1(&mut z));
    }
}
