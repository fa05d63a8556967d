// 该文件是 Yuyan （鱼眼） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use tracing::debug;

use crate::model::{RawDetection, iou};

/// 贪心非极大值抑制
///
/// 按置信度降序（稳定排序，同分保持原顺序）依次选取候选框，
/// 并丢弃与已选框 IoU ≥ `iou_threshold` 的其余候选框。
pub fn non_max_suppression(
  mut detections: Vec<RawDetection>,
  iou_threshold: f32,
) -> Vec<RawDetection> {
  let before = detections.len();
  detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut result = Vec::with_capacity(detections.len());

  while !detections.is_empty() {
    let best = detections.remove(0);
    detections.retain(|det| iou(&best.bbox, &det.bbox) < iou_threshold);
    result.push(best);
  }

  debug!("NMS: {} -> {}", before, result.len());
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(bbox: [f32; 4], confidence: f32) -> RawDetection {
    RawDetection { bbox, confidence }
  }

  #[test]
  fn overlapping_duplicate_keeps_higher_confidence() {
    let a = det([0.10, 0.10, 0.50, 0.50], 0.6);
    let b = det([0.11, 0.11, 0.51, 0.51], 0.8);
    assert!(iou(&a.bbox, &b.bbox) > 0.85);

    let kept = non_max_suppression(vec![a, b], 0.45);
    assert_eq!(kept, vec![b]);
  }

  #[test]
  fn disjoint_boxes_are_sorted_by_confidence() {
    let a = det([0.0, 0.0, 0.2, 0.2], 0.3);
    let b = det([0.5, 0.5, 0.7, 0.7], 0.9);
    let c = det([0.0, 0.6, 0.3, 0.9], 0.5);

    let kept = non_max_suppression(vec![a, b, c], 0.45);
    assert_eq!(kept, vec![b, c, a]);
  }

  #[test]
  fn iou_at_threshold_is_suppressed() {
    // 交集 0.5，并集 1.5 → IoU = 1/3
    let a = det([0.0, 0.0, 1.0, 1.0], 0.9);
    let b = det([0.5, 0.0, 1.5, 1.0], 0.8);
    let threshold = iou(&a.bbox, &b.bbox);

    assert_eq!(non_max_suppression(vec![a, b], threshold), vec![a]);
    assert_eq!(non_max_suppression(vec![a, b], threshold + 1e-3).len(), 2);
  }

  #[test]
  fn ties_keep_input_order() {
    let a = det([0.0, 0.0, 0.1, 0.1], 0.5);
    let b = det([0.5, 0.5, 0.6, 0.6], 0.5);
    assert_eq!(non_max_suppression(vec![a, b], 0.45), vec![a, b]);
    assert_eq!(non_max_suppression(vec![b, a], 0.45), vec![b, a]);
  }

  #[test]
  fn suppression_is_idempotent_and_keeps_the_best() {
    let mut candidates = Vec::new();
    for i in 0..40 {
      let offset = (i % 7) as f32 * 0.06;
      let shift = (i / 7) as f32 * 0.09;
      let confidence = 0.25 + ((i * 37) % 71) as f32 / 100.0;
      candidates.push(det(
        [offset, shift, offset + 0.3, shift + 0.25],
        confidence,
      ));
    }
    let best = candidates
      .iter()
      .copied()
      .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
      .unwrap();

    let once = non_max_suppression(candidates.clone(), 0.45);
    let twice = non_max_suppression(once.clone(), 0.45);

    assert!(once.len() <= candidates.len());
    assert_eq!(once[0], best);
    assert_eq!(once, twice);
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert!(non_max_suppression(Vec::new(), 0.45).is_empty());
  }
}
