// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/locator.rs - 模型文件查找
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
  fs::File,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, info, warn};

/// 应用目录名，取自包名
const APP_DIR_NAME: &str = env!("CARGO_PKG_NAME");
/// 覆盖模型目录的环境变量
pub const MODEL_DIR_ENV: &str = "YUYAN_MODEL_DIR";

/// 一个候选模型位置
pub trait CandidateLocation: Send + Sync {
  /// 用于日志的描述
  fn describe(&self) -> String;

  /// 解析出候选路径，平台目录未知时返回 `None`
  fn resolve(&self, file_name: &str) -> Option<PathBuf>;
}

/// 固定路径，直接指向模型文件
#[derive(Debug, Clone)]
pub struct FixedPath(pub PathBuf);

impl CandidateLocation for FixedPath {
  fn describe(&self) -> String {
    format!("指定路径 {}", self.0.display())
  }

  fn resolve(&self, _file_name: &str) -> Option<PathBuf> {
    Some(self.0.clone())
  }
}

/// 由环境变量指定的目录
#[derive(Debug, Clone)]
pub struct EnvDirectory {
  pub var: String,
}

impl Default for EnvDirectory {
  fn default() -> Self {
    Self {
      var: MODEL_DIR_ENV.to_string(),
    }
  }
}

impl CandidateLocation for EnvDirectory {
  fn describe(&self) -> String {
    format!("环境变量 {}", self.var)
  }

  fn resolve(&self, file_name: &str) -> Option<PathBuf> {
    let dir = std::env::var_os(&self.var)?;
    if dir.is_empty() {
      return None;
    }
    Some(PathBuf::from(dir).join(file_name))
  }
}

/// 应用私有数据目录 `<data_local_dir>/yuyan/models`
#[derive(Debug, Clone, Default)]
pub struct AppDataDirectory;

impl CandidateLocation for AppDataDirectory {
  fn describe(&self) -> String {
    "应用私有数据目录".to_string()
  }

  fn resolve(&self, file_name: &str) -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME).join("models").join(file_name))
  }
}

/// 共享文档目录 `<document_dir>/yuyan`
#[derive(Debug, Clone, Default)]
pub struct DocumentDirectory;

impl CandidateLocation for DocumentDirectory {
  fn describe(&self) -> String {
    "共享文档目录".to_string()
  }

  fn resolve(&self, file_name: &str) -> Option<PathBuf> {
    dirs::document_dir().map(|dir| dir.join(APP_DIR_NAME).join(file_name))
  }
}

/// 下载目录
#[derive(Debug, Clone, Default)]
pub struct DownloadDirectory;

impl CandidateLocation for DownloadDirectory {
  fn describe(&self) -> String {
    "下载目录".to_string()
  }

  fn resolve(&self, file_name: &str) -> Option<PathBuf> {
    dirs::download_dir().map(|dir| dir.join(file_name))
  }
}

/// 当前工作目录下的 `models/`
#[derive(Debug, Clone, Default)]
pub struct WorkingDirectory;

impl CandidateLocation for WorkingDirectory {
  fn describe(&self) -> String {
    "工作目录".to_string()
  }

  fn resolve(&self, file_name: &str) -> Option<PathBuf> {
    std::env::current_dir()
      .ok()
      .map(|dir| dir.join("models").join(file_name))
  }
}

/// 文件探测，便于测试时替换为假的文件系统
pub trait FileProbe: Send + Sync {
  /// 路径是否为可读的普通文件；`Ok(false)` 表示不存在
  fn is_readable_file(&self, path: &Path) -> std::io::Result<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl FileProbe for LocalFileSystem {
  fn is_readable_file(&self, path: &Path) -> std::io::Result<bool> {
    let metadata = match std::fs::metadata(path) {
      Ok(metadata) => metadata,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
      Err(e) => return Err(e),
    };

    if !metadata.is_file() {
      return Ok(false);
    }

    File::open(path)?;
    Ok(true)
  }
}

/// 一次查找中检查过的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchedLocation {
  pub path: PathBuf,
  pub exists: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocateOutcome {
  pub found: Option<PathBuf>,
  pub searched: Vec<SearchedLocation>,
}

/// 按优先级依次在候选位置中查找模型文件
pub struct ModelLocator {
  file_name: String,
  candidates: Vec<Box<dyn CandidateLocation>>,
  probe: Box<dyn FileProbe>,
}

impl ModelLocator {
  pub fn new(file_name: impl Into<String>, candidates: Vec<Box<dyn CandidateLocation>>) -> Self {
    Self {
      file_name: file_name.into(),
      candidates,
      probe: Box::new(LocalFileSystem),
    }
  }

  /// 平台默认的查找顺序：
  /// 环境变量目录 → 应用私有目录 → 共享文档目录 → 下载目录 → 工作目录
  pub fn platform_default(file_name: impl Into<String>) -> Self {
    Self::new(
      file_name,
      vec![
        Box::new(EnvDirectory::default()),
        Box::new(AppDataDirectory),
        Box::new(DocumentDirectory),
        Box::new(DownloadDirectory),
        Box::new(WorkingDirectory),
      ],
    )
  }

  pub fn with_probe(mut self, probe: impl FileProbe + 'static) -> Self {
    self.probe = Box::new(probe);
    self
  }

  /// 插入一个最高优先级的候选位置
  pub fn prepend(mut self, candidate: impl CandidateLocation + 'static) -> Self {
    self.candidates.insert(0, Box::new(candidate));
    self
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  /// 检查全部候选位置，返回第一个存在的路径及完整的检查记录
  ///
  /// 单个位置的 I/O 错误只会被记录并视为不存在。
  pub fn locate(&self) -> LocateOutcome {
    let mut outcome = LocateOutcome::default();

    for candidate in &self.candidates {
      let Some(path) = candidate.resolve(&self.file_name) else {
        debug!("{} 不可用，跳过", candidate.describe());
        continue;
      };

      let (exists, error) = match self.probe.is_readable_file(&path) {
        Ok(exists) => (exists, None),
        Err(e) => {
          warn!("检查模型位置 {} 失败: {}", path.display(), e);
          (false, Some(e.to_string()))
        }
      };
      debug!(
        "检查 {}: {} ({})",
        candidate.describe(),
        path.display(),
        if exists { "存在" } else { "不存在" }
      );

      if exists && outcome.found.is_none() {
        info!("找到模型文件: {}", path.display());
        outcome.found = Some(path.clone());
      }
      outcome.searched.push(SearchedLocation {
        path,
        exists,
        error,
      });
    }

    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  struct FakeFileSystem {
    files: HashSet<PathBuf>,
    broken: HashSet<PathBuf>,
  }

  impl FileProbe for FakeFileSystem {
    fn is_readable_file(&self, path: &Path) -> std::io::Result<bool> {
      if self.broken.contains(path) {
        return Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied"));
      }
      Ok(self.files.contains(path))
    }
  }

  fn fixed(paths: &[&str]) -> Vec<Box<dyn CandidateLocation>> {
    paths
      .iter()
      .map(|p| Box::new(FixedPath(PathBuf::from(p))) as Box<dyn CandidateLocation>)
      .collect()
  }

  #[test]
  fn first_existing_candidate_wins_and_all_are_recorded() {
    let fs = FakeFileSystem {
      files: ["/b/model.onnx", "/c/model.onnx"].iter().map(PathBuf::from).collect(),
      broken: HashSet::new(),
    };
    let locator = ModelLocator::new(
      "model.onnx",
      fixed(&["/a/model.onnx", "/b/model.onnx", "/c/model.onnx"]),
    )
    .with_probe(fs);

    let outcome = locator.locate();
    assert_eq!(outcome.found, Some(PathBuf::from("/b/model.onnx")));
    let flags: Vec<bool> = outcome.searched.iter().map(|s| s.exists).collect();
    assert_eq!(flags, vec![false, true, true]);
  }

  #[test]
  fn probe_errors_count_as_missing() {
    let fs = FakeFileSystem {
      files: ["/b/model.onnx"].iter().map(PathBuf::from).collect(),
      broken: ["/a/model.onnx"].iter().map(PathBuf::from).collect(),
    };
    let locator =
      ModelLocator::new("model.onnx", fixed(&["/a/model.onnx", "/b/model.onnx"])).with_probe(fs);

    let outcome = locator.locate();
    assert_eq!(outcome.found, Some(PathBuf::from("/b/model.onnx")));
    assert!(!outcome.searched[0].exists);
    assert!(outcome.searched[0].error.is_some());
  }

  #[test]
  fn unresolvable_candidates_are_skipped() {
    let locator = ModelLocator::new(
      "model.onnx",
      vec![Box::new(EnvDirectory {
        var: "YUYAN_TEST_UNSET_MODEL_DIR".to_string(),
      })],
    );
    let outcome = locator.locate();
    assert!(outcome.found.is_none());
    assert!(outcome.searched.is_empty());
  }

  #[test]
  fn local_file_system_ignores_directories() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("model.onnx");
    std::fs::write(&file, b"onnx").unwrap();

    let probe = LocalFileSystem;
    assert!(probe.is_readable_file(&file).unwrap());
    assert!(!probe.is_readable_file(dir.path()).unwrap());
    assert!(!probe.is_readable_file(&dir.path().join("missing.onnx")).unwrap());
  }

  #[test]
  fn prepended_candidate_has_highest_priority() {
    let fs = FakeFileSystem {
      files: ["/a/model.onnx", "/override.onnx"].iter().map(PathBuf::from).collect(),
      broken: HashSet::new(),
    };
    let locator = ModelLocator::new("model.onnx", fixed(&["/a/model.onnx"]))
      .prepend(FixedPath(PathBuf::from("/override.onnx")))
      .with_probe(fs);

    assert_eq!(locator.locate().found, Some(PathBuf::from("/override.onnx")));
  }
}
