// src/simulation/load_parameters.rs

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_yaml::from_reader;

use crate::config::{Scenario, SimConfig};
use crate::error::SimError;

/// シミュレーション設定の読み込み
///
/// 記載の無いキーは既定値で補う。範囲チェックは `SimConfig::validate` で行う。
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimConfig, SimError> {
    let file = File::open(path)?;
    let config: SimConfig = from_reader(file)?;
    Ok(config)
}

/// シナリオの読み込み
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, SimError> {
    let file = File::open(path)?;
    let scenario: Scenario = from_reader(file)?;
    Ok(scenario)
}

/// 実行時の設定をフラットなJSONとして保存する
pub fn save_config_snapshot<P: AsRef<Path>>(path: P, config: &SimConfig) -> Result<(), SimError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, config)?;
    Ok(())
}
