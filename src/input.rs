// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/input.rs - 图像输入与预处理
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

use thiserror::Error;

use crate::frame::TensorShapeError;

mod preprocess;
mod read_image_file;

pub use self::preprocess::preprocess;
pub use self::read_image_file::{ImageFileInput, resolve_image_location};

/// 预处理各步骤的错误，每一步有独立的错误类型
#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("无效的图像 URI: {0}")]
  InvalidUri(String),
  #[error("不支持的 URI 方案 '{0}'，只支持本地文件")]
  UnsupportedScheme(String),
  #[error("无法打开图像文件: {0}")]
  Open(#[from] std::io::Error),
  #[error("无法解码图像文件: {0}")]
  Decode(#[from] image::ImageError),
  #[error("无法将 {width}x{height} 的图像缩放到 {size}x{size}")]
  Resize { width: u32, height: u32, size: usize },
  #[error("RGB 数据长度不匹配: 期望 {expected}, 实际 {actual}")]
  Rgb { expected: usize, actual: usize },
  #[error("归一化失败: {0}")]
  Normalize(#[from] TensorShapeError),
}
