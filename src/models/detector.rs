use crate::config::DetectionConfig;
use crate::detection::Detection;
use crate::image::{ImagePreprocessor, YoloDecoder};
use crate::models::labels::ClassLabels;
use crate::utils::error::DetectError;
use crate::{Config, Result};
use image::RgbImage;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;

/// 目标检测器接口
///
/// 实现必须可在线程间共享；推理不改变对外可见的状态。
pub trait ObjectDetector: Send + Sync {
    /// 在 `input_size() x input_size()` 的RGB帧上推理
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>>;

    fn name(&self) -> &str;

    fn input_size(&self) -> u32;

    fn num_classes(&self) -> usize;
}

pub struct YoloDetector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    params: DetectionConfig,
    labels: ClassLabels,
}

impl YoloDetector {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.exists() {
            return Err(DetectError::ModelLoad(format!(
                "Detection model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading detection model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| DetectError::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(optimization_level(config.onnx_config.optimization_level))
            .map_err(|e| DetectError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(|e| DetectError::ModelLoad(format!("Failed to set intra threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| {
                DetectError::ModelLoad(format!(
                    "Failed to load detection model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DetectError::ModelLoad("Detection model has no inputs".to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| DetectError::ModelLoad("Detection model has no outputs".to_string()))?;

        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Detection output[{}]: '{}'", i, output.name);
        }
        tracing::info!("Detection model input: '{}', output: '{}'", input_name, output_name);

        let labels = match &config.labels_path {
            Some(path) => ClassLabels::from_file(path)?,
            None => ClassLabels::coco(),
        };
        tracing::info!("Loaded {} class labels", labels.len());

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            params: config.detection_config.clone(),
            labels,
        })
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let size = self.params.input_size;
        if frame.dimensions() != (size, size) {
            return Err(DetectError::InvalidInput(format!(
                "Expected {}x{} frame, got {}x{}",
                size,
                size,
                frame.width(),
                frame.height()
            )));
        }

        let input_tensor = Tensor::from_array(ImagePreprocessor::to_nchw_tensor(frame))?;

        // 推理 - 立即提取数据避免生命周期冲突
        let prediction = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    return Err(DetectError::Inference(format!(
                        "Output '{}' not found in model outputs",
                        self.output_name
                    )));
                }
            }
        };

        let detections = YoloDecoder::new(&self.params, &self.labels).decode(prediction.view())?;
        tracing::debug!("Detected {} objects", detections.len());

        Ok(detections)
    }

    fn name(&self) -> &str {
        "yolo-onnx"
    }

    fn input_size(&self) -> u32 {
        self.params.input_size
    }

    fn num_classes(&self) -> usize {
        self.labels.len()
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
