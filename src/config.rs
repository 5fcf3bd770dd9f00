use crate::utils::error::DetectError;
use crate::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 检测模型文件路径
    pub model_path: PathBuf,

    /// 类别标签文件（每行一个类别名），缺省时使用内置COCO类别
    pub labels_path: Option<PathBuf>,

    /// 上传文件目录
    pub upload_dir: PathBuf,

    /// 标注结果输出目录
    pub output_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 检测参数
    pub detection_config: DetectionConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// 模型输入边长（正方形）
    pub input_size: u32,

    /// 置信度阈值
    pub conf_threshold: f32,

    /// NMS IoU阈值
    pub iou_threshold: f32,

    /// 单张图像最多保留的检测数
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            return Err(DetectError::Config("workers must be at least 1".to_string()));
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            max_request_size: 50 * 1024 * 1024,               // 50MB
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            labels_path: None,
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
            workers,
            dev_mode,
            onnx_config,
            detection_config: DetectionConfig::default(),
            server_config,
        })
    }

    pub fn with_labels(mut self, labels_path: Option<PathBuf>) -> Self {
        self.labels_path = labels_path;
        self
    }

    /// 设置检测阈值，两个阈值都必须在 [0, 1] 内
    pub fn with_thresholds(mut self, conf_threshold: f32, iou_threshold: f32) -> Result<Self> {
        for (name, value) in [("confidence", conf_threshold), ("iou", iou_threshold)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectError::Config(format!(
                    "{} threshold must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        self.detection_config.conf_threshold = conf_threshold;
        self.detection_config.iou_threshold = iou_threshold;
        Ok(self)
    }

    /// 创建上传目录和输出目录（已存在时不报错）
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
            tracing::debug!("Directory ready: {}", dir.display());
        }
        Ok(())
    }

    /// 上传文件的存储路径
    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    /// 标注结果的存储路径
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new(
            "127.0.0.1:0".to_string(),
            "last.onnx",
            "uploads",
            "static/outputs",
            Some(2),
            false,
        )
        .unwrap()
    }

    #[test]
    fn defaults_follow_detection_contract() {
        let config = config();
        assert_eq!(config.detection_config.input_size, 640);
        assert_eq!(config.workers, 2);
        assert_eq!(config.server_config.request_timeout, 60);
        assert!(config.labels_path.is_none());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        assert!(config().with_thresholds(1.5, 0.5).is_err());
        assert!(config().with_thresholds(0.5, -0.1).is_err());
        let config = config().with_thresholds(0.4, 0.5).unwrap();
        assert_eq!(config.detection_config.conf_threshold, 0.4);
        assert_eq!(config.detection_config.iou_threshold, 0.5);
    }

    #[test]
    fn rejects_zero_workers() {
        let result = Config::new("127.0.0.1:0".into(), "m", "u", "o", Some(0), false);
        assert!(result.is_err());
    }

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let config = Config::new(
            "127.0.0.1:0".into(),
            "m",
            root.path().join("uploads"),
            root.path().join("static/outputs"),
            Some(1),
            true,
        )
        .unwrap();

        config.ensure_directories().unwrap();
        config.ensure_directories().unwrap();

        assert!(config.upload_dir.is_dir());
        assert!(config.output_dir.is_dir());
        assert_eq!(config.output_path("a.png"), root.path().join("static/outputs/a.png"));
    }
}
