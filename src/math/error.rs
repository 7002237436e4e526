// src/math/error.rs

use thiserror::Error;

/// QPソルバのエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("{iterations} 回の反復で収束しませんでした")]
    NotConverged { iterations: usize },

    #[error("問題が実行不能です")]
    Infeasible,

    #[error("数値的な理由で解けませんでした: {status}")]
    Numerical { status: String },

    #[error("問題の次元が一致しません: 変数 {n}, 制約 {m}")]
    DimensionMismatch { n: usize, m: usize },

    #[error("非有限の値が含まれています")]
    NonFinite,
}
