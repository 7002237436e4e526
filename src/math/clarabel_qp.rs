// src/math/clarabel_qp.rs

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::math::error::SolverError;
use crate::math::qp::{QpProblem, QpSolution, QpSolver};

/// Clarabel（内点法）による二次計画ソルバ
///
/// `l ≤ Az ≤ u` を Clarabel の `Az + s = b, s ∈ K` 形式に並べ替えて解く。
/// 呼び出しごとに問題を組み直すので、呼び出し間の状態は持たない。
pub struct ClarabelSolver {
    settings: DefaultSettings<f64>,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver::new(DefaultSettings {
            verbose: false,
            ..DefaultSettings::default()
        })
    }
}

impl ClarabelSolver {
    pub fn new(settings: DefaultSettings<f64>) -> Self {
        ClarabelSolver { settings }
    }
}

/// 密行列をCSC形式に変換する
///
/// # 引数
/// - `m`: 変換元の行列
/// - `upper_only`: 上三角部分だけを取り出すか（目的関数の P 用）
///
/// # 戻り値
/// - 非ゼロ要素だけを持つCSC行列
fn to_csc(m: &DMatrix<f64>, upper_only: bool) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(m.ncols() + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..m.ncols() {
        let rows = if upper_only { (j + 1).min(m.nrows()) } else { m.nrows() };
        for i in 0..rows {
            let v = m[(i, j)];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(m.nrows(), m.ncols(), colptr, rowval, nzval)
}

/// 円錐形式の制約 `Az + s = b`（等式行が先、不等式行が後）
struct ConicConstraints {
    a: DMatrix<f64>,
    b: Vec<f64>,
    equalities: usize,
    inequalities: usize,
}

impl ConicConstraints {
    /// 区間制約を等式（ゼロ錐）と片側不等式（非負錐）に分ける
    ///
    /// 上下限が等しい行は等式、有限の上限は `a·z ≤ u`、有限の下限は `−a·z ≤ −l` になる。
    fn from_problem(problem: &QpProblem) -> Self {
        let mut equality_rows = Vec::new();
        let mut inequality_rows = Vec::new();
        for (i, (&lo, &hi)) in problem.l.iter().zip(problem.u.iter()).enumerate() {
            if lo == hi && lo.is_finite() {
                equality_rows.push(i);
                continue;
            }
            if hi.is_finite() {
                inequality_rows.push((i, 1.0, hi));
            }
            if lo.is_finite() {
                inequality_rows.push((i, -1.0, -lo));
            }
        }

        let rows = equality_rows.len() + inequality_rows.len();
        let mut a = DMatrix::<f64>::zeros(rows, problem.num_variables());
        let mut b = Vec::with_capacity(rows);
        for (r, &i) in equality_rows.iter().enumerate() {
            a.row_mut(r).copy_from(&problem.a.row(i));
            b.push(problem.u[i]);
        }
        for (k, &(i, sign, bound)) in inequality_rows.iter().enumerate() {
            a.row_mut(equality_rows.len() + k)
                .copy_from(&(problem.a.row(i) * sign));
            b.push(bound);
        }

        ConicConstraints {
            a,
            b,
            equalities: equality_rows.len(),
            inequalities: inequality_rows.len(),
        }
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::with_capacity(2);
        if self.equalities > 0 {
            cones.push(SupportedConeT::ZeroConeT(self.equalities));
        }
        if self.inequalities > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(self.inequalities));
        }
        cones
    }
}

impl QpSolver for ClarabelSolver {
    fn solve(&mut self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        problem.check_dimensions()?;
        problem.check_finite()?;

        let p = to_csc(&problem.p, true);
        let constraints = ConicConstraints::from_problem(problem);
        let a = to_csc(&constraints.a, false);
        let q: Vec<f64> = problem.q.iter().copied().collect();
        let cones = constraints.cones();

        let mut solver = DefaultSolver::new(&p, &q, &a, &constraints.b, &cones, self.settings.clone());
        solver.solve();

        let solution = &solver.solution;
        let iterations = solution.iterations as usize;
        match solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                debug!(iterations, status = ?solution.status, "Clarabelの反復が終了しました");
                let x = DVector::from_column_slice(&solution.x);
                if x.iter().all(|v| v.is_finite()) {
                    Ok(QpSolution { x, iterations })
                } else {
                    Err(SolverError::NonFinite)
                }
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => {
                Err(SolverError::NotConverged { iterations })
            }
            SolverStatus::PrimalInfeasible
            | SolverStatus::DualInfeasible
            | SolverStatus::AlmostPrimalInfeasible
            | SolverStatus::AlmostDualInfeasible => Err(SolverError::Infeasible),
            other => Err(SolverError::Numerical {
                status: format!("{:?}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// min (x-1)² + (y-2)²  s.t.  x + y ≤ 1  →  (0, 1)
    fn halfplane_problem() -> QpProblem {
        QpProblem {
            p: DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 2.0]),
            q: DVector::from_vec(vec![-2.0, -4.0]),
            a: DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
            l: DVector::from_vec(vec![f64::NEG_INFINITY]),
            u: DVector::from_vec(vec![1.0]),
        }
    }

    #[test]
    fn test_inequality_constrained() {
        let sol = ClarabelSolver::default().solve(&halfplane_problem()).unwrap();
        assert_abs_diff_eq!(sol.x[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sol.x[1], 1.0, epsilon = 1e-6);
    }

    /// min x² + y²  s.t.  x + y = 1, 0 ≤ x ≤ 0.2  →  (0.2, 0.8)
    #[test]
    fn test_equality_and_box() {
        let problem = QpProblem {
            p: DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 2.0]),
            q: DVector::zeros(2),
            a: DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 0.0]),
            l: DVector::from_vec(vec![1.0, 0.0]),
            u: DVector::from_vec(vec![1.0, 0.2]),
        };
        let sol = ClarabelSolver::default().solve(&problem).unwrap();
        assert_abs_diff_eq!(sol.x[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(sol.x[1], 0.8, epsilon = 1e-6);
        assert!(problem.max_violation(&sol.x) < 1e-6);
    }

    /// x ≥ 1 かつ x ≤ 0 は実行不能
    #[test]
    fn test_infeasible() {
        let problem = QpProblem {
            p: DMatrix::identity(1, 1),
            q: DVector::zeros(1),
            a: DMatrix::from_row_slice(2, 1, &[1.0, 1.0]),
            l: DVector::from_vec(vec![1.0, f64::NEG_INFINITY]),
            u: DVector::from_vec(vec![f64::INFINITY, 0.0]),
        };
        assert_eq!(ClarabelSolver::default().solve(&problem), Err(SolverError::Infeasible));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut problem = halfplane_problem();
        problem.q[0] = f64::NAN;
        assert_eq!(ClarabelSolver::default().solve(&problem), Err(SolverError::NonFinite));

        let mut problem = halfplane_problem();
        problem.l = DVector::from_vec(vec![0.0, 0.0]);
        assert!(matches!(
            ClarabelSolver::default().solve(&problem),
            Err(SolverError::DimensionMismatch { .. })
        ));
    }

    /// 等式行は1行、両側有限の区間は2行、片側だけの区間は1行になる
    #[test]
    fn test_conic_rows() {
        let problem = QpProblem {
            p: DMatrix::identity(2, 2),
            q: DVector::zeros(2),
            a: DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]),
            l: DVector::from_vec(vec![2.0, -1.0, f64::NEG_INFINITY]),
            u: DVector::from_vec(vec![2.0, 1.0, 5.0]),
        };
        let c = ConicConstraints::from_problem(&problem);
        assert_eq!(c.equalities, 1);
        assert_eq!(c.inequalities, 3);
        assert_eq!(c.b, vec![2.0, 1.0, 1.0, 5.0]);
        assert_eq!(c.a.row(2)[1], -1.0);
        assert_eq!(c.cones().len(), 2);
    }

    #[test]
    fn test_csc_upper_triangle() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 2.0]);
        let csc = to_csc(&m, true);
        assert_eq!(csc.colptr, vec![0, 1, 3]);
        assert_eq!(csc.rowval, vec![0, 0, 1]);
        assert_eq!(csc.nzval, vec![4.0, 1.0, 2.0]);
    }
}
