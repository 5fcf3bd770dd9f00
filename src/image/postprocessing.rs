use crate::config::DetectionConfig;
use crate::detection::{BoundingBox, Detection};
use crate::models::labels::ClassLabels;
use crate::utils::error::DetectError;
use crate::Result;
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};

/// YOLO输出解码器
///
/// 支持 Ultralytics 导出的 `[1, 4 + C, N]` 以及转置后的 `[1, N, 4 + C]`，
/// 每个候选为 `cx, cy, w, h, score_0 .. score_{C-1}`，坐标为输入像素。
pub struct YoloDecoder<'a> {
    params: &'a DetectionConfig,
    labels: &'a ClassLabels,
}

impl<'a> YoloDecoder<'a> {
    pub fn new(params: &'a DetectionConfig, labels: &'a ClassLabels) -> Self {
        Self { params, labels }
    }

    /// 解码原始输出张量
    pub fn decode(&self, output: ArrayViewD<'_, f32>) -> Result<Vec<Detection>> {
        let shape = output.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(DetectError::Inference(format!(
                "Unsupported detection output shape: {:?}, expected [1, 4+C, N] or [1, N, 4+C]",
                shape
            )));
        }

        let preds = output
            .index_axis_move(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| DetectError::Inference(format!("Invalid output tensor: {}", e)))?;

        // 属性维度（4 + 类别数）总是小于候选数
        let preds = if shape[1] <= shape[2] { preds } else { preds.reversed_axes() };

        if preds.nrows() <= 4 {
            return Err(DetectError::Inference(format!(
                "Detection output has no class scores: {:?}",
                shape
            )));
        }

        let candidates = self.collect_candidates(&preds);
        tracing::debug!("{} candidates above confidence threshold", candidates.len());

        let size = self.params.input_size as f32;
        let detections = non_max_suppression(candidates, self.params.iou_threshold)
            .into_iter()
            .take(self.params.max_detections)
            .map(|mut detection| {
                detection.bbox = detection.bbox.clamp(size, size);
                detection
            })
            .filter(|detection| detection.bbox.area() > 0.0)
            .collect();

        Ok(detections)
    }

    /// 过滤低置信度候选，每个候选只保留得分最高的类别
    fn collect_candidates(&self, preds: &ArrayView2<'_, f32>) -> Vec<Detection> {
        let mut candidates = Vec::new();

        for column in preds.axis_iter(Axis(1)) {
            let best = column
                .iter()
                .skip(4)
                .enumerate()
                .fold(None, |best: Option<(usize, f32)>, (class_id, &score)| match best {
                    Some((_, best_score)) if best_score >= score => best,
                    _ => Some((class_id, score)),
                });

            let Some((class_id, confidence)) = best else {
                continue;
            };
            // NaN 得分会绕过阈值比较
            if !confidence.is_finite() || confidence < self.params.conf_threshold {
                continue;
            }

            candidates.push(Detection {
                bbox: BoundingBox::from_center(column[0], column[1], column[2], column[3]),
                class_id,
                class_name: self.labels.name(class_id),
                confidence,
            });
        }

        candidates
    }
}

/// 按类别的非极大值抑制，结果按置信度降序
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}
