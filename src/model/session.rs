// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/session.rs - 推理会话
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
  path::PathBuf,
  sync::{Mutex, MutexGuard, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
  config::DetectorConfig,
  error::DetectionError,
  frame::{InputTensor, OutputTensor},
  model::{
    FISH_MODEL_FILE_NAME, FixedPath, InferenceRuntime, LoadedModel, ModelLocator, ModelStager,
    RuntimeError, SearchedLocation,
  },
};

/// 模型加载状态的诊断快照
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelDebugInfo {
  pub model_file_name: String,
  pub is_loaded: bool,
  pub loaded_location: Option<PathBuf>,
  pub staged_location: Option<PathBuf>,
  pub loaded_at: Option<DateTime<Utc>>,
  pub searched_locations: Vec<SearchedLocation>,
}

/// 持有原生模型句柄的推理会话
///
/// 加载、重新加载与推理共用同一把锁，因此同一句柄上同时只有一个 `run`，
/// 与 `reload` 竞争的 `run` 要么在旧句柄上完成，要么在重新加载之后执行。
pub struct InferenceSession<R: InferenceRuntime> {
  runtime: R,
  locator: ModelLocator,
  stager: ModelStager,
  /// `None` 即未加载
  state: Mutex<Option<R::Model>>,
  debug_info: RwLock<ModelDebugInfo>,
}

impl<R: InferenceRuntime> InferenceSession<R> {
  pub fn new(runtime: R, locator: ModelLocator, stager: ModelStager) -> Self {
    let debug_info = ModelDebugInfo {
      model_file_name: locator.file_name().to_string(),
      ..Default::default()
    };

    Self {
      runtime,
      locator,
      stager,
      state: Mutex::new(None),
      debug_info: RwLock::new(debug_info),
    }
  }

  /// 按配置使用平台默认的查找顺序和暂存目录
  pub fn with_config(runtime: R, config: &DetectorConfig) -> Self {
    let mut locator = ModelLocator::platform_default(FISH_MODEL_FILE_NAME);
    if let Some(path) = &config.model_path {
      locator = locator.prepend(FixedPath(path.clone()));
    }
    let stager = match &config.staging_dir {
      Some(dir) => ModelStager::new(dir),
      None => ModelStager::platform_default(),
    };
    debug!("模型暂存目录: {}", stager.staging_dir().display());

    Self::new(runtime, locator, stager)
  }

  pub fn is_loaded(&self) -> bool {
    self.lock_state().is_some()
  }

  /// 加载模型，已加载时不做任何事
  pub fn load(&self) -> Result<(), DetectionError> {
    let mut state = self.lock_state();
    if state.is_none() {
      *state = Some(self.load_model()?);
    }
    Ok(())
  }

  /// 丢弃当前句柄并重新加载，用于程序启动后才放置模型文件的情况
  pub fn reload(&self) -> Result<(), DetectionError> {
    let mut state = self.lock_state();
    info!("重新加载模型");
    self.discard_locked(&mut state);
    *state = Some(self.load_model()?);
    Ok(())
  }

  /// 丢弃当前句柄，下次推理时重新加载
  pub fn invalidate(&self) {
    let mut state = self.lock_state();
    self.discard_locked(&mut state);
  }

  /// 执行一次推理，未加载时先加载
  ///
  /// 推理失败只影响本次调用，不改变已加载的状态。
  pub fn run<const S: usize, const C: usize, const N: usize>(
    &self,
    input: &InputTensor<S>,
  ) -> Result<OutputTensor<C, N>, DetectionError> {
    let mut state = self.lock_state();
    let model = match &mut *state {
      Some(model) => model,
      slot @ None => slot.insert(self.load_model()?),
    };

    debug!("执行模型推理");
    let raw = model
      .run(input.as_slice(), input.shape())
      .map_err(DetectionError::InferenceFailed)?;

    OutputTensor::try_from(raw)
      .map_err(|e| DetectionError::InferenceFailed(RuntimeError::OutputShape(e)))
  }

  /// 诊断信息，只读取缓存的状态，不触发任何 I/O
  pub fn model_debug_info(&self) -> ModelDebugInfo {
    self
      .debug_info
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn lock_state(&self) -> MutexGuard<'_, Option<R::Model>> {
    self.state.lock().unwrap_or_else(|poisoned| {
      warn!("推理会话锁已中毒，继续使用当前状态");
      poisoned.into_inner()
    })
  }

  fn discard_locked(&self, state: &mut Option<R::Model>) {
    *state = None;
    let mut info = self.debug_info.write().unwrap_or_else(PoisonError::into_inner);
    info.is_loaded = false;
    info.loaded_location = None;
    info.staged_location = None;
    info.loaded_at = None;
  }

  /// 查找、暂存并加载模型，调用方需持有状态锁
  fn load_model(&self) -> Result<R::Model, DetectionError> {
    let outcome = self.locator.locate();
    {
      let mut info = self.debug_info.write().unwrap_or_else(PoisonError::into_inner);
      info.searched_locations = outcome.searched.clone();
    }

    let Some(source) = outcome.found else {
      error!("未找到模型文件 {}", self.locator.file_name());
      return Err(DetectionError::ModelNotFound {
        file_name: self.locator.file_name().to_string(),
        searched: outcome.searched,
      });
    };

    let staged = self.stager.stage(&source);

    let model = check_model_file(&staged)
      .and_then(|()| self.runtime.load(&staged))
      .map_err(|e| {
        error!("模型加载失败 {}: {}", staged.display(), e);
        DetectionError::ModelLoadFailed {
          path: source.clone(),
          source: e,
          searched: outcome.searched.clone(),
        }
      })?;

    let mut info = self.debug_info.write().unwrap_or_else(PoisonError::into_inner);
    info.is_loaded = true;
    info.loaded_location = Some(source);
    info.staged_location = Some(staged);
    info.loaded_at = Some(Utc::now());
    info!("模型加载完成");

    Ok(model)
  }
}

/// 拒绝空文件，空文件交给运行时只会得到难以理解的错误
fn check_model_file(path: &std::path::Path) -> Result<(), RuntimeError> {
  let size = std::fs::metadata(path)?.len();
  if size == 0 {
    return Err(RuntimeError::EmptyModel);
  }
  debug!("模型文件大小: {:.2} MB", size as f64 / (1024.0 * 1024.0));
  Ok(())
}
