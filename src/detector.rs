// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/detector.rs - 鱼类检测器
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

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info};

use crate::{
  config::DetectorConfig,
  error::DetectionError,
  frame::OutputTensor,
  input::{ImageFileInput, preprocess},
  model::{
    BoundingBox, FISH_ANCHOR_NUM, FISH_CLASS_NUM, FISH_INPUT_SIZE, InferenceRuntime,
    InferenceSession, ModelDebugInfo, decode_output, non_max_suppression,
  },
};

/// 对单张图像做检测
pub trait Detect<Input> {
  type Error;
  fn detect(&self, input: &Input) -> Result<Vec<BoundingBox>, Self::Error>;
}

/// 完整的检测流水线：预处理、推理、解码、NMS
pub struct FishDetector<R: InferenceRuntime> {
  session: Arc<InferenceSession<R>>,
  config: DetectorConfig,
}

impl<R: InferenceRuntime> Clone for FishDetector<R> {
  fn clone(&self) -> Self {
    Self {
      session: self.session.clone(),
      config: self.config.clone(),
    }
  }
}

impl<R: InferenceRuntime> FishDetector<R> {
  pub fn new(session: Arc<InferenceSession<R>>, config: DetectorConfig) -> Self {
    Self { session, config }
  }

  /// 按配置创建独占的推理会话
  pub fn with_runtime(runtime: R, config: DetectorConfig) -> Self {
    let session = Arc::new(InferenceSession::with_config(runtime, &config));
    Self::new(session, config)
  }

  pub fn session(&self) -> &Arc<InferenceSession<R>> {
    &self.session
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  /// 读取路径或 `file://` URI 指向的图像并检测
  pub fn run_detection(&self, location: &str) -> Result<Vec<BoundingBox>, DetectionError> {
    let input = ImageFileInput::from_location(location)?;
    self.detect_image(input.image())
  }

  /// 返回按置信度降序排列、坐标归一化到原图宽高的检测框
  pub fn detect_image(&self, image: &DynamicImage) -> Result<Vec<BoundingBox>, DetectionError> {
    let tensor = preprocess::<FISH_INPUT_SIZE>(image)?;
    let output: OutputTensor<FISH_CLASS_NUM, FISH_ANCHOR_NUM> = self.session.run(&tensor)?;

    let candidates = decode_output(
      &output,
      FISH_INPUT_SIZE,
      self.config.confidence_threshold,
    );
    debug!("置信度过滤后候选框数量: {}", candidates.len());

    let mut selected = non_max_suppression(candidates, self.config.iou_threshold);
    selected.truncate(self.config.max_detections);
    info!("检测到 {} 条鱼", selected.len());

    Ok(selected.into_iter().map(BoundingBox::from).collect())
  }

  pub fn model_debug_info(&self) -> ModelDebugInfo {
    self.session.model_debug_info()
  }

  /// 重新查找并加载模型
  pub fn reload(&self) -> Result<(), DetectionError> {
    self.session.reload()
  }
}

impl<R: InferenceRuntime> Detect<DynamicImage> for FishDetector<R> {
  type Error = DetectionError;

  fn detect(&self, input: &DynamicImage) -> Result<Vec<BoundingBox>, Self::Error> {
    self.detect_image(input)
  }
}

#[cfg(feature = "onnx_runtime")]
impl FishDetector<crate::model::OnnxRuntime> {
  /// 使用进程内共享的推理会话
  pub fn shared(config: DetectorConfig) -> Self {
    Self::new(crate::model::shared_session(), config)
  }
}
