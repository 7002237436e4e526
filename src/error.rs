// src/error.rs

use thiserror::Error;

/// シミュレーション全体で呼び出し元へ返すエラー
#[derive(Error, Debug)]
pub enum SimError {
    #[error("未対応の積分法です: {0}")]
    UnknownIntegrator(String),

    #[error("設定値 `{field}` が不正です: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("ステップ {step} で制御器が不正な制御入力を返しました")]
    MalformedControl { step: usize },

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAMLの読み込みに失敗しました: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSONの書き出しに失敗しました: {0}")]
    Json(#[from] serde_json::Error),
}
