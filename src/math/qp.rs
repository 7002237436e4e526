// src/math/qp.rs

use nalgebra::{DMatrix, DVector};

use crate::math::error::SolverError;

/// 二次計画問題
///
/// ```text
/// minimize    ½ zᵀ P z + qᵀ z
/// subject to  l ≤ A z ≤ u
/// ```
///
/// 等式制約は `l[i] == u[i]` の行で表す。
#[derive(Debug, Clone, PartialEq)]
pub struct QpProblem {
    pub p: DMatrix<f64>,
    pub q: DVector<f64>,
    pub a: DMatrix<f64>,
    pub l: DVector<f64>,
    pub u: DVector<f64>,
}

impl QpProblem {
    /// 変数の数
    pub fn num_variables(&self) -> usize {
        self.q.len()
    }

    /// 制約の数
    pub fn num_constraints(&self) -> usize {
        self.l.len()
    }

    /// 行列とベクトルの次元が整合しているか確認する
    pub fn check_dimensions(&self) -> Result<(), SolverError> {
        let n = self.num_variables();
        let m = self.num_constraints();
        let consistent = self.p.nrows() == n
            && self.p.ncols() == n
            && self.a.nrows() == m
            && self.a.ncols() == n
            && self.u.len() == m;
        if consistent {
            Ok(())
        } else {
            Err(SolverError::DimensionMismatch { n, m })
        }
    }

    /// P, q, A が有限で、境界に NaN が無いことを確認する（境界の ±∞ は許す）
    pub fn check_finite(&self) -> Result<(), SolverError> {
        let finite = self.p.iter().all(|v| v.is_finite())
            && self.a.iter().all(|v| v.is_finite())
            && self.q.iter().all(|v| v.is_finite())
            && self.l.iter().chain(self.u.iter()).all(|v| !v.is_nan());
        if finite {
            Ok(())
        } else {
            Err(SolverError::NonFinite)
        }
    }

    /// 目的関数値 ½ zᵀPz + qᵀz
    pub fn objective(&self, z: &DVector<f64>) -> f64 {
        0.5 * z.dot(&(&self.p * z)) + self.q.dot(z)
    }

    /// 制約違反量の最大値（無限大ノルム）
    pub fn max_violation(&self, z: &DVector<f64>) -> f64 {
        let az = &self.a * z;
        az.iter()
            .zip(self.l.iter().zip(self.u.iter()))
            .map(|(v, (lo, hi))| (lo - v).max(v - hi).max(0.0))
            .fold(0.0, f64::max)
    }
}

/// ソルバが返す解
#[derive(Debug, Clone, PartialEq)]
pub struct QpSolution {
    pub x: DVector<f64>,
    pub iterations: usize,
}

/// QPソルバの共通インターフェース
///
/// 制御器は問題の組み立てだけを担当し、解法は外部ライブラリを包んだ実装に任せる。
pub trait QpSolver {
    fn solve(&mut self, problem: &QpProblem) -> Result<QpSolution, SolverError>;
}

impl<S: QpSolver + ?Sized> QpSolver for Box<S> {
    fn solve(&mut self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        (**self).solve(problem)
    }
}
