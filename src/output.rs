// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/output.rs - 输出定义
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

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::{input::ImageFileInput, model::BoundingBox};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod json_lines;
pub use self::json_lines::JsonLinesOutput;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无效的输出 URI: {0}")]
  InvalidUri(String),
}

/// 一次检测的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detections {
  pub boxes: Vec<BoundingBox>,
  pub elapsed: Duration,
}

/// 每张图片一行的检测报告
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport<'a> {
  pub image: String,
  pub width: u32,
  pub height: u32,
  pub boxes: &'a [BoundingBox],
  pub elapsed_ms: f64,
}

impl<'a> DetectReport<'a> {
  pub fn new(frame: &ImageFileInput, result: &'a Detections) -> Self {
    Self {
      image: frame.path().display().to_string(),
      width: frame.width(),
      height: frame.height(),
      boxes: &result.boxes,
      elapsed_ms: result.elapsed.as_micros() as f64 / 1000.0,
    }
  }
}
