// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/runtime.rs - 推理后端抽象
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

use std::path::Path;

use thiserror::Error;

use crate::frame::TensorShapeError;

#[derive(Error, Debug)]
pub enum RuntimeError {
  #[error("模型文件读取错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("模型文件为空 (0 字节)")]
  EmptyModel,
  #[error("推理后端错误: {0}")]
  Backend(String),
  #[error("输出张量形状错误: {0}")]
  OutputShape(#[from] TensorShapeError),
}

/// 原生推理运行时，负责把模型文件加载为可执行的模型句柄
pub trait InferenceRuntime: Send + Sync {
  type Model: LoadedModel;

  fn load(&self, path: &Path) -> Result<Self::Model, RuntimeError>;
}

/// 已加载的模型句柄
///
/// 输入为 NHWC 浮点数据及其形状，输出为展平后的第一个输出张量。
/// 同一句柄上不支持并发执行，调用方需要串行化 `run`。
pub trait LoadedModel: Send {
  fn run(&mut self, input: &[f32], shape: [usize; 4]) -> Result<Vec<f32>, RuntimeError>;
}
