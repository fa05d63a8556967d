// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/stager.rs - 模型文件暂存
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
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

/// 把模型复制到私有目录后再加载，避免共享存储上的权限问题
#[derive(Debug, Clone)]
pub struct ModelStager {
  staging_dir: PathBuf,
}

impl ModelStager {
  pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
    Self {
      staging_dir: staging_dir.into(),
    }
  }

  /// `<cache_dir>/yuyan/staged`，缓存目录未知时使用系统临时目录
  pub fn platform_default() -> Self {
    let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    Self::new(base.join(env!("CARGO_PKG_NAME")).join("staged"))
  }

  pub fn staging_dir(&self) -> &Path {
    &self.staging_dir
  }

  /// 返回可供运行时加载的路径
  ///
  /// 暂存失败时返回原路径，不向调用方报告错误。
  pub fn stage(&self, source: &Path) -> PathBuf {
    match self.try_stage(source) {
      Ok(staged) => {
        info!("模型已暂存: {} -> {}", source.display(), staged.display());
        staged
      }
      Err(e) => {
        warn!("模型暂存失败，直接使用原路径 {}: {}", source.display(), e);
        source.to_path_buf()
      }
    }
  }

  fn try_stage(&self, source: &Path) -> std::io::Result<PathBuf> {
    let file_name = source
      .file_name()
      .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "模型路径没有文件名"))?;
    let staged = self.staging_dir.join(file_name);

    if same_file(source, &staged) {
      debug!("模型已位于暂存目录: {}", staged.display());
      return Ok(staged);
    }

    match fs::remove_file(&staged) {
      Ok(()) => debug!("删除旧的暂存文件: {}", staged.display()),
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => return Err(e),
    }

    fs::create_dir_all(&self.staging_dir)?;
    let bytes = fs::copy(source, &staged)?;
    debug!(
      "复制模型文件 {:.2} MB",
      bytes as f64 / (1024.0 * 1024.0)
    );

    Ok(staged)
  }
}

fn same_file(a: &Path, b: &Path) -> bool {
  match (fs::canonicalize(a), fs::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}
