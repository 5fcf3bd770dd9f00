use crate::utils::error::DetectError;
use crate::Result;
use std::path::Path;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// 类别ID到名称的映射
#[derive(Debug, Clone)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// 内置COCO 80类
    pub fn coco() -> Self {
        Self::from_names(COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    /// 从标签文件加载，每行一个类别名，忽略空行
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DetectError::ModelLoad(format!("Failed to read labels {}: {}", path.display(), e))
        })?;

        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(DetectError::ModelLoad(format!(
                "Labels file {} contains no class names",
                path.display()
            )));
        }

        Ok(Self::from_names(names))
    }

    /// 类别名称，超出范围时返回 `class_<id>`
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
