// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model.rs - 模型
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

use serde::{Deserialize, Serialize};

/// 模型文件名，模型不随程序分发，需要另行放置到设备上
pub const FISH_MODEL_FILE_NAME: &str = "fish_detector.onnx";
/// 模型输入边长 S，输入为 S×S 的 RGB 图像
pub const FISH_INPUT_SIZE: usize = 256;
/// 类别数 C
pub const FISH_CLASS_NUM: usize = 4;
/// 锚点数 N，对应 256 输入下步长 8/16/32 的三个检测头 (32² + 16² + 8²)
pub const FISH_ANCHOR_NUM: usize = 1344;
pub const FISH_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const FISH_IOU_THRESHOLD: f32 = 0.45;
/// 单张图片最多保留的检测框数量
pub const FISH_MAX_DETECTIONS: usize = 300;

/// 归一化到原图宽高的检测框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
  pub confidence: f32,
}

impl BoundingBox {
  pub fn area(&self) -> f32 {
    (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
  }

  pub fn iou(&self, other: &BoundingBox) -> f32 {
    iou(&self.corners(), &other.corners())
  }

  pub fn corners(&self) -> [f32; 4] {
    [self.x1, self.y1, self.x2, self.y2]
  }

  /// 换算为原图上的像素坐标 `[x1, y1, x2, y2]`，用于裁剪
  pub fn to_pixel_rect(&self, width: u32, height: u32) -> [u32; 4] {
    let w = width as f32;
    let h = height as f32;
    [
      ((self.x1 * w).floor() as u32).min(width),
      ((self.y1 * h).floor() as u32).min(height),
      ((self.x2 * w).floor() as u32).min(width),
      ((self.y2 * h).floor() as u32).min(height),
    ]
  }

  /// 在给定尺寸的原图上裁剪结果是否为空
  pub fn is_empty_at(&self, width: u32, height: u32) -> bool {
    let [x1, y1, x2, y2] = self.to_pixel_rect(width, height);
    x2 <= x1 || y2 <= y1
  }
}

impl From<RawDetection> for BoundingBox {
  fn from(raw: RawDetection) -> Self {
    let [x1, y1, x2, y2] = raw.bbox;
    BoundingBox {
      x1,
      y1,
      x2,
      y2,
      confidence: raw.confidence.clamp(0.0, 1.0),
    }
  }
}

/// 解码得到、尚未经过 NMS 的候选框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
  pub confidence: f32,
}

/// 计算两个角点形式矩形的 IoU，并集面积为 0 时返回 0
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

mod decode;
mod locator;
mod nms;
#[cfg(feature = "onnx_runtime")]
mod onnx;
mod runtime;
mod session;
mod stager;

pub use self::decode::{CoordinateScale, decode_output, detect_coordinate_scale};
pub use self::locator::{
  AppDataDirectory, CandidateLocation, DocumentDirectory, DownloadDirectory, EnvDirectory,
  FileProbe, FixedPath, LocalFileSystem, LocateOutcome, MODEL_DIR_ENV, ModelLocator,
  SearchedLocation, WorkingDirectory,
};
pub use self::nms::non_max_suppression;
#[cfg(feature = "onnx_runtime")]
pub use self::onnx::{OnnxModel, OnnxRuntime, shared_session};
pub use self::runtime::{InferenceRuntime, LoadedModel, RuntimeError};
pub use self::session::{InferenceSession, ModelDebugInfo};
pub use self::stager::ModelStager;
