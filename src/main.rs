// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use yuyan::{
  FromUrl,
  config::DetectorConfig,
  detector::FishDetector,
  model::OnnxRuntime,
  output::JsonLinesOutput,
  task::{OneShotTask, RepeatShotTask, Task},
};

use crate::args::{Args, Command};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = args.detector.apply(DetectorConfig::from_env());

  info!("置信度阈值: {}", config.confidence_threshold);
  info!("NMS 阈值: {}", config.iou_threshold);
  info!("最大检测数: {}", config.max_detections);
  info!("推理线程数: {}", config.intra_threads);
  if let Some(model) = &config.model_path {
    info!("模型文件路径: {}", model.display());
  }

  let detector = FishDetector::with_runtime(OnnxRuntime::from_config(&config), config);

  match args.command {
    Command::Detect { input, output } => {
      let output = JsonLinesOutput::from_url(&output)?;
      OneShotTask.run_task(input, detector, output)?;
    }
    Command::Bench {
      input,
      repeat,
      output,
    } => {
      let output = JsonLinesOutput::from_url(&output)?;
      RepeatShotTask::new(repeat).run_task([input], detector, output)?;
    }
    Command::Info => {
      if let Err(e) = detector.session().load() {
        error!("{}", e);
      }
      let info = detector.model_debug_info();
      println!("{}", serde_json::to_string_pretty(&info)?);
    }
  }

  Ok(())
}
