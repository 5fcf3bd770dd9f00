use crate::models::{ObjectDetector, YoloDetector};
use crate::utils::error::DetectError;
use crate::{Config, Result};
use std::sync::Arc;

/// 模型上下文：启动时加载一次，之后只读共享
pub struct ModelManager {
    detector: Arc<dyn ObjectDetector>,
    config: Config,
}

impl ModelManager {
    /// 加载配置中的检测模型
    pub fn load(config: Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let detector = Arc::new(YoloDetector::new(&config)?);

        tracing::info!("Model manager initialized successfully");
        Ok(Self::with_detector(config, detector))
    }

    /// 使用已构造的检测器
    pub fn with_detector(config: Config, detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector, config }
    }

    /// 获取检测器引用
    pub fn detector(&self) -> Arc<dyn ObjectDetector> {
        Arc::clone(&self.detector)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        let expected = self.config.detection_config.input_size;
        if self.detector.input_size() != expected {
            return Err(DetectError::ModelLoad(format!(
                "Detector expects {}px input, configured frame is {}px",
                self.detector.input_size(),
                expected
            )));
        }
        if self.detector.num_classes() == 0 {
            return Err(DetectError::ModelLoad("Detector has no classes".to_string()));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            detector: self.detector.name().to_string(),
            model_path: self.config.model_path.display().to_string(),
            input_size: self.detector.input_size(),
            num_classes: self.detector.num_classes(),
            conf_threshold: self.config.detection_config.conf_threshold,
            iou_threshold: self.config.detection_config.iou_threshold,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub detector: String,
    pub model_path: String,
    pub input_size: u32,
    pub num_classes: usize,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
