// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/config.rs - 检测配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{path::PathBuf, str::FromStr};

use serde::Serialize;
use tracing::warn;

use crate::model::{FISH_CONFIDENCE_THRESHOLD, FISH_IOU_THRESHOLD, FISH_MAX_DETECTIONS};

pub const CONFIDENCE_ENV: &str = "YUYAN_CONFIDENCE";
pub const IOU_THRESHOLD_ENV: &str = "YUYAN_IOU_THRESHOLD";
pub const MAX_DETECTIONS_ENV: &str = "YUYAN_MAX_DETECTIONS";
pub const MODEL_PATH_ENV: &str = "YUYAN_MODEL_PATH";
pub const STAGING_DIR_ENV: &str = "YUYAN_STAGING_DIR";
pub const INTRA_THREADS_ENV: &str = "YUYAN_INTRA_THREADS";

/// 推理运行时的算子内线程数
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// 检测配置
///
/// 阈值默认取与导出模型配套的常量；类别数与锚点数由模型输出形状决定，不在此配置。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorConfig {
  /// 置信度阈值 (0.0 - 1.0)
  pub confidence_threshold: f32,
  /// NMS IoU 阈值 (0.0 - 1.0)
  pub iou_threshold: f32,
  /// 每张图片最多保留的检测框数量
  pub max_detections: usize,
  /// 最高优先级的模型文件路径
  pub model_path: Option<PathBuf>,
  /// 暂存目录，缺省为平台缓存目录
  pub staging_dir: Option<PathBuf>,
  /// 推理运行时的算子内线程数
  pub intra_threads: usize,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: FISH_CONFIDENCE_THRESHOLD,
      iou_threshold: FISH_IOU_THRESHOLD,
      max_detections: FISH_MAX_DETECTIONS,
      model_path: None,
      staging_dir: None,
      intra_threads: DEFAULT_INTRA_THREADS,
    }
  }
}

impl DetectorConfig {
  /// 从环境变量读取配置，未设置或格式错误的项使用默认值
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = Self::default();

    Self {
      confidence_threshold: parse_or(
        &lookup,
        CONFIDENCE_ENV,
        defaults.confidence_threshold,
      ),
      iou_threshold: parse_or(&lookup, IOU_THRESHOLD_ENV, defaults.iou_threshold),
      max_detections: parse_or(&lookup, MAX_DETECTIONS_ENV, defaults.max_detections),
      model_path: lookup(MODEL_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from),
      staging_dir: lookup(STAGING_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from),
      intra_threads: parse_or(&lookup, INTRA_THREADS_ENV, defaults.intra_threads),
    }
  }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
  F: Fn(&str) -> Option<String>,
  T: FromStr + Copy,
{
  match lookup(key) {
    Some(value) => value.trim().parse().unwrap_or_else(|_| {
      warn!("环境变量 {}={} 格式错误，使用默认值", key, value);
      default
    }),
    None => default,
  }
}
