// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/error.rs - 检测错误
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

use std::{
  fmt::Write,
  path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
  input::PreprocessError,
  model::{RuntimeError, SearchedLocation},
};

#[derive(Error, Debug)]
pub enum DetectionError {
  #[error("{}", model_not_found_message(.file_name, .searched))]
  ModelNotFound {
    file_name: String,
    searched: Vec<SearchedLocation>,
  },
  #[error("{}", model_load_failed_message(.path, .source, .searched))]
  ModelLoadFailed {
    path: PathBuf,
    source: RuntimeError,
    searched: Vec<SearchedLocation>,
  },
  #[error("图像预处理失败: {0}")]
  PreprocessingFailed(#[from] PreprocessError),
  #[error("推理失败: {0}")]
  InferenceFailed(RuntimeError),
}

impl DetectionError {
  /// 加载失败时检查过的位置
  pub fn searched_locations(&self) -> &[SearchedLocation] {
    match self {
      DetectionError::ModelNotFound { searched, .. }
      | DetectionError::ModelLoadFailed { searched, .. } => searched,
      _ => &[],
    }
  }
}

fn model_not_found_message(file_name: &str, searched: &[SearchedLocation]) -> String {
  search_log_message(
    &format!("未找到模型文件 {}，已检查以下位置:", file_name),
    file_name,
    searched,
  )
}

fn model_load_failed_message(
  path: &Path,
  source: &RuntimeError,
  searched: &[SearchedLocation],
) -> String {
  let file_name = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string());
  search_log_message(
    &format!(
      "模型加载失败: {}: {}\n模型文件可能已损坏或与运行时不兼容，已检查以下位置:",
      path.display(),
      source
    ),
    &file_name,
    searched,
  )
}

/// 标题、检查过的位置列表与放置模型的指引
fn search_log_message(header: &str, file_name: &str, searched: &[SearchedLocation]) -> String {
  let mut message = format!("{}\n", header);
  if searched.is_empty() {
    message.push_str("  (没有可用的候选位置)\n");
  }
  for location in searched {
    let _ = write!(
      message,
      "  - {} [{}]",
      location.path.display(),
      if location.exists { "存在" } else { "不存在" }
    );
    if let Some(error) = &location.error {
      let _ = write!(message, " ({})", error);
    }
    message.push('\n');
  }
  let _ = write!(
    message,
    "请将 {} 复制到上述任一位置（推荐应用私有数据目录），\
     或通过环境变量 YUYAN_MODEL_DIR / YUYAN_MODEL_PATH 或 --model 参数指定模型位置，\
     然后重新加载模型。",
    file_name
  );
  message
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_message_lists_every_location() {
    let err = DetectionError::ModelNotFound {
      file_name: "fish.onnx".to_string(),
      searched: vec![
        SearchedLocation {
          path: PathBuf::from("/data/fish.onnx"),
          exists: false,
          error: None,
        },
        SearchedLocation {
          path: PathBuf::from("/sdcard/Download/fish.onnx"),
          exists: false,
          error: Some("permission denied".to_string()),
        },
      ],
    };

    let message = err.to_string();
    assert!(message.contains("/data/fish.onnx [不存在]"));
    assert!(message.contains("/sdcard/Download/fish.onnx [不存在] (permission denied)"));
    assert!(message.contains("YUYAN_MODEL_DIR"));
    assert_eq!(err.searched_locations().len(), 2);
  }

  #[test]
  fn load_failure_message_keeps_search_log() {
    let err = DetectionError::ModelLoadFailed {
      path: PathBuf::from("/data/models/fish.onnx"),
      source: RuntimeError::Backend("bad graph".to_string()),
      searched: vec![
        SearchedLocation {
          path: PathBuf::from("/sdcard/Documents/fish.onnx"),
          exists: false,
          error: None,
        },
        SearchedLocation {
          path: PathBuf::from("/data/models/fish.onnx"),
          exists: true,
          error: None,
        },
      ],
    };

    let message = err.to_string();
    assert!(message.starts_with("模型加载失败: /data/models/fish.onnx: "));
    assert!(message.contains("bad graph"));
    assert!(message.contains("/sdcard/Documents/fish.onnx [不存在]"));
    assert!(message.contains("/data/models/fish.onnx [存在]"));
    assert!(message.contains("请将 fish.onnx 复制到"));
    assert!(message.contains("YUYAN_MODEL_DIR"));
  }
}
