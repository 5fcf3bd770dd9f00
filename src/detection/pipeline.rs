use crate::detection::ProcessOutcome;
use crate::image::{Annotator, ImageLoader};
use crate::models::ModelManager;
use crate::utils::error::DetectError;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 单张图像处理流水线：解码 → 缩放 → 检测 → 标注 → 写出
pub struct ImageProcessor {
    models: Arc<ModelManager>,
    annotator: Annotator,
}

impl ImageProcessor {
    pub fn new(models: Arc<ModelManager>) -> Result<Self> {
        Ok(Self {
            models,
            annotator: Annotator::new()?,
        })
    }

    /// 处理 `input` 并把标注结果写到 `output`（格式由扩展名决定）
    ///
    /// 无法解码的输入返回 `ProcessOutcome::Unreadable` 且不写文件；
    /// 推理失败和写文件失败作为错误返回。
    pub fn process(&self, input: &Path, output: &Path) -> Result<ProcessOutcome> {
        let start_time = Instant::now();

        let image = match ImageLoader::from_path(input) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Unable to read image {}: {}", input.display(), e);
                return Ok(ProcessOutcome::Unreadable {
                    reason: e.to_string(),
                });
            }
        };

        let detector = self.models.detector();
        let mut frame = ImageLoader::resize_to_frame(&image, detector.input_size());

        let detections = detector.detect(&frame)?;
        self.annotator.annotate(&mut frame, &detections);

        frame.save(output).map_err(|e| match e {
            image::ImageError::IoError(e) => DetectError::Io(e),
            e => DetectError::ImageProcessing(format!(
                "Failed to encode {}: {}",
                output.display(),
                e
            )),
        })?;

        tracing::info!(
            "Processed and saved: {} (detections={}, time={:.3}s)",
            output.display(),
            detections.len(),
            start_time.elapsed().as_secs_f32()
        );

        Ok(ProcessOutcome::Annotated {
            output_path: output.to_path_buf(),
            detections: detections.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};
    use crate::models::ObjectDetector;
    use crate::Config;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDetector {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ObjectDetector for CountingDetector {
        fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(frame.dimensions(), (640, 640));
            if self.fail {
                return Err(DetectError::Inference("boom".to_string()));
            }
            Ok(vec![Detection {
                bbox: BoundingBox { x1: 10.0, y1: 40.0, x2: 200.0, y2: 300.0 },
                class_id: 1,
                class_name: "thing".to_string(),
                confidence: 0.75,
            }])
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn input_size(&self) -> u32 {
            640
        }

        fn num_classes(&self) -> usize {
            2
        }
    }

    fn processor(fail: bool) -> (ImageProcessor, Arc<CountingDetector>) {
        let config = Config::new("127.0.0.1:0".into(), "m", "u", "o", Some(1), false).unwrap();
        let detector = Arc::new(CountingDetector {
            calls: AtomicUsize::new(0),
            fail,
        });
        let models = Arc::new(ModelManager::with_detector(config, detector.clone()));
        (ImageProcessor::new(models).unwrap(), detector)
    }

    #[test]
    fn output_is_always_640_square() {
        let (processor, detector) = processor(false);
        let dir = tempfile::tempdir().unwrap();

        for (i, (w, h)) in [(1280u32, 720u32), (37, 90)].into_iter().enumerate() {
            let input = dir.path().join(format!("in{}.png", i));
            let output = dir.path().join(format!("annotated_in{}.jpg", i));
            RgbImage::from_pixel(w, h, Rgb([120, 130, 140])).save(&input).unwrap();

            let outcome = processor.process(&input, &output).unwrap();

            assert_eq!(
                outcome,
                ProcessOutcome::Annotated { output_path: output.clone(), detections: 1 }
            );
            let written = image::open(&output).unwrap();
            assert_eq!((written.width(), written.height()), (640, 640));
        }
        assert_eq!(detector.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn corrupt_input_writes_nothing() {
        let (processor, detector) = processor(false);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        let output = dir.path().join("annotated_broken.png");
        std::fs::write(&input, b"\x89PNG but not really").unwrap();

        let outcome = processor.process(&input, &output).unwrap();

        assert!(matches!(outcome, ProcessOutcome::Unreadable { .. }));
        assert!(!output.exists());
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inference_failure_propagates() {
        let (processor, _) = processor(true);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ok.png");
        let output = dir.path().join("annotated_ok.png");
        RgbImage::new(10, 10).save(&input).unwrap();

        let result = processor.process(&input, &output);

        assert!(matches!(result, Err(DetectError::Inference(_))));
        assert!(!output.exists());
    }

    #[test]
    fn write_failure_propagates() {
        let (processor, _) = processor(false);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ok.png");
        RgbImage::new(10, 10).save(&input).unwrap();
        let output = dir.path().join("missing_dir").join("annotated_ok.png");

        assert!(matches!(
            processor.process(&input, &output),
            Err(DetectError::Io(_))
        ));
    }

    #[test]
    fn unencodable_output_is_processing_error() {
        let (processor, _) = processor(false);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ok.png");
        RgbImage::new(10, 10).save(&input).unwrap();
        let output = dir.path().join("annotated_ok.unknownformat");

        let result = processor.process(&input, &output);

        assert!(matches!(result, Err(DetectError::ImageProcessing(_))));
        assert!(!output.exists());
    }
}
