// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use url::Url;

use yuyan::config::DetectorConfig;

/// Yuyan 鱼类检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub detector: DetectorArgs,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 检测一张或多张图像
  Detect {
    /// 输入图像（文件路径或 file:// URI），可重复
    #[arg(long, value_name = "SOURCE", required = true, num_args = 1..)]
    input: Vec<String>,
    /// 输出位置: stdout: 或 file:///path/report.jsonl
    #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
    output: Url,
  },
  /// 对同一张图像重复推理，统计平均耗时
  Bench {
    /// 输入图像（文件路径或 file:// URI）
    #[arg(long, value_name = "SOURCE")]
    input: String,
    /// 重复次数
    #[arg(long, default_value = "100", value_name = "COUNT")]
    repeat: usize,
    /// 输出位置: stdout: 或 file:///path/report.jsonl
    #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
    output: Url,
  },
  /// 查找并加载模型，打印模型诊断信息
  Info,
}

/// 覆盖环境变量配置的检测参数
#[derive(ClapArgs, Debug, Default)]
pub struct DetectorArgs {
  /// 模型文件路径，优先于所有默认查找位置
  #[arg(long, global = true, value_name = "FILE")]
  pub model: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, global = true, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, global = true, value_name = "THRESHOLD")]
  pub iou_threshold: Option<f32>,

  /// 每张图像最多保留的检测框数量
  #[arg(long, global = true, value_name = "COUNT")]
  pub max_detections: Option<usize>,

  /// 推理运行时的算子内线程数
  #[arg(long, global = true, value_name = "COUNT")]
  pub threads: Option<usize>,
}

impl DetectorArgs {
  pub fn apply(&self, mut config: DetectorConfig) -> DetectorConfig {
    if let Some(model) = &self.model {
      config.model_path = Some(model.clone());
    }
    if let Some(confidence) = self.confidence {
      config.confidence_threshold = confidence;
    }
    if let Some(iou_threshold) = self.iou_threshold {
      config.iou_threshold = iou_threshold;
    }
    if let Some(max_detections) = self.max_detections {
      config.max_detections = max_detections;
    }
    if let Some(threads) = self.threads {
      config.intra_threads = threads;
    }
    config
  }
}
