// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理后端
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
  path::Path,
  sync::{Arc, OnceLock},
};

use ndarray::ArrayView4;
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use tracing::{debug, info};

use crate::{
  config::{DEFAULT_INTRA_THREADS, DetectorConfig},
  model::{InferenceRuntime, InferenceSession, LoadedModel, RuntimeError},
};

fn backend<E: std::fmt::Display>(e: E) -> RuntimeError {
  RuntimeError::Backend(e.to_string())
}

/// 基于 ONNX Runtime 的 CPU 推理后端
#[derive(Debug, Clone)]
pub struct OnnxRuntime {
  intra_threads: usize,
}

impl Default for OnnxRuntime {
  fn default() -> Self {
    Self {
      intra_threads: DEFAULT_INTRA_THREADS,
    }
  }
}

impl OnnxRuntime {
  pub fn from_config(config: &DetectorConfig) -> Self {
    Self::default().with_intra_threads(config.intra_threads)
  }

  pub fn with_intra_threads(mut self, threads: usize) -> Self {
    self.intra_threads = threads.max(1);
    self
  }
}

impl InferenceRuntime for OnnxRuntime {
  type Model = OnnxModel;

  fn load(&self, path: &Path) -> Result<Self::Model, RuntimeError> {
    info!(
      "创建 ONNX Runtime 推理会话: {} (线程数 {})",
      path.display(),
      self.intra_threads
    );
    let session = Session::builder()
      .map_err(backend)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(backend)?
      .with_intra_threads(self.intra_threads)
      .map_err(backend)?
      .commit_from_file(path)
      .map_err(backend)?;

    debug!("模型输入数量: {}", session.inputs.len());
    debug!("模型输出数量: {}", session.outputs.len());

    Ok(OnnxModel { session })
  }
}

pub struct OnnxModel {
  session: Session,
}

impl LoadedModel for OnnxModel {
  fn run(&mut self, input: &[f32], shape: [usize; 4]) -> Result<Vec<f32>, RuntimeError> {
    let array = ArrayView4::from_shape(shape, input).map_err(backend)?;
    let input_tensor = TensorRef::from_array_view(array).map_err(backend)?;

    let outputs = self
      .session
      .run(ort::inputs![input_tensor])
      .map_err(backend)?;

    let (output_shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(backend)?;
    debug!("模型输出形状: {:?}", output_shape);

    Ok(data.to_vec())
  }
}

static SHARED_SESSION: OnceLock<Arc<InferenceSession<OnnxRuntime>>> = OnceLock::new();

/// 进程内共享的推理会话
///
/// 首次调用时按环境变量配置创建，模型本身在第一次检测时才加载。
pub fn shared_session() -> Arc<InferenceSession<OnnxRuntime>> {
  SHARED_SESSION
    .get_or_init(|| {
      let config = DetectorConfig::from_env();
      Arc::new(InferenceSession::with_config(
        OnnxRuntime::from_config(&config),
        &config,
      ))
    })
    .clone()
}
