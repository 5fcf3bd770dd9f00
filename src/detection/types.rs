use serde::Serialize;
use std::path::PathBuf;

/// 轴对齐边界框，坐标为帧内像素 (x1, y1) 左上角，(x2, y2) 右下角
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// 由中心点和宽高构造
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// 交并比
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = BoundingBox {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
        .area();

        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// 裁剪到 width x height 的帧内
    pub fn clamp(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }
}

/// 单个目标的检测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
}

impl Detection {
    /// 标注文字
    pub fn label(&self) -> String {
        format!("{} {:.2}", self.class_name, self.confidence)
    }
}

/// 单张图像的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// 已写出标注图像
    Annotated {
        output_path: PathBuf,
        detections: usize,
    },
    /// 无法解码为图像，未写出任何文件
    Unreadable { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::from_center(50.0, 50.0, 20.0, 20.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BoundingBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 };
        let b = BoundingBox { x1: 20.0, y1: 20.0, x2: 30.0, y2: 30.0 };
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = BoundingBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0 };
        let b = BoundingBox { x1: 5.0, y1: 0.0, x2: 15.0, y2: 10.0 };
        // 交集50，并集150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let b = BoundingBox { x1: -5.0, y1: 10.0, x2: 700.0, y2: 650.0 }.clamp(640.0, 640.0);
        assert_eq!(b, BoundingBox { x1: 0.0, y1: 10.0, x2: 640.0, y2: 640.0 });
    }

    #[test]
    fn label_includes_name_and_confidence() {
        let d = Detection {
            bbox: BoundingBox::from_center(1.0, 1.0, 2.0, 2.0),
            class_id: 0,
            class_name: "person".to_string(),
            confidence: 0.876,
        };
        assert_eq!(d.label(), "person 0.88");
    }
}
