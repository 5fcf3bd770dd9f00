use crate::detection::Detection;
use crate::utils::error::DetectError;
use crate::Result;
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

// 标注渲染常量
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_PADDING: i32 = 4;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// 按类别取色的调色板
const PALETTE: [[u8; 3]; 21] = [
    [0xA3, 0x51, 0xFB],
    [0xFF, 0x40, 0x40],
    [0xFF, 0xA1, 0xA0],
    [0xFF, 0x76, 0x33],
    [0xFF, 0xB6, 0x33],
    [0xD1, 0xD4, 0x35],
    [0x4C, 0xFB, 0x12],
    [0x94, 0xCF, 0x1A],
    [0x40, 0xDE, 0x8A],
    [0x1B, 0x96, 0x40],
    [0x00, 0xD6, 0xC1],
    [0x2E, 0x9C, 0xAA],
    [0x00, 0xC4, 0xFF],
    [0x36, 0x47, 0x97],
    [0x66, 0x75, 0xFF],
    [0x00, 0x19, 0xEF],
    [0x86, 0x3A, 0xFF],
    [0x53, 0x00, 0x87],
    [0xCD, 0x3A, 0xFF],
    [0xFF, 0x97, 0xCA],
    [0xFF, 0x39, 0xC9],
];

static FONT_DATA: &[u8] = include_bytes!("../../assets/font.ttf");

/// 检测结果绘制器：先画所有边框，再画所有标签
pub struct Annotator {
    font: FontRef<'static>,
    scale: PxScale,
}

impl Annotator {
    pub fn new() -> Result<Self> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| DetectError::Internal(format!("Failed to load embedded font: {}", e)))?;

        Ok(Self {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
        })
    }

    pub fn color_for(class_id: usize) -> Rgb<u8> {
        Rgb(PALETTE[class_id % PALETTE.len()])
    }

    pub fn annotate(&self, frame: &mut RgbImage, detections: &[Detection]) {
        for detection in detections {
            self.draw_box(frame, detection);
        }
        for detection in detections {
            self.draw_label(frame, detection);
        }
    }

    fn draw_box(&self, frame: &mut RgbImage, detection: &Detection) {
        let Some((x, y, w, h)) = pixel_rect(frame, detection) else {
            return;
        };
        let color = Self::color_for(detection.class_id);

        // 向内收缩绘制以加粗边框
        for t in 0..BOX_THICKNESS {
            let (w, h) = (w as i32 - 2 * t, h as i32 - 2 * t);
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x + t, y + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, rect, color);
        }
    }

    fn draw_label(&self, frame: &mut RgbImage, detection: &Detection) {
        let Some((x, y, _, _)) = pixel_rect(frame, detection) else {
            return;
        };
        let label = detection.label();
        let (text_w, text_h) = text_size(self.scale, &self.font, &label);
        let bg_w = text_w as i32 + 2 * LABEL_PADDING;
        let bg_h = text_h as i32 + 2 * LABEL_PADDING;

        // 标签放在框左上角上方，顶部空间不足时放到框内
        let bg_x = x.min(frame.width() as i32 - bg_w).max(0);
        let bg_y = if y - bg_h >= 0 { y - bg_h } else { y };

        let rect = Rect::at(bg_x, bg_y).of_size(bg_w as u32, bg_h as u32);
        draw_filled_rect_mut(frame, rect, Self::color_for(detection.class_id));
        draw_text_mut(
            frame,
            LABEL_TEXT_COLOR,
            bg_x + LABEL_PADDING,
            bg_y + LABEL_PADDING,
            self.scale,
            &self.font,
            &label,
        );
    }
}

/// 检测框转换为帧内整数像素矩形 (x, y, w, h)，空框返回 None
fn pixel_rect(frame: &RgbImage, detection: &Detection) -> Option<(i32, i32, u32, u32)> {
    let bbox = detection
        .bbox
        .clamp(frame.width() as f32, frame.height() as f32);

    let x1 = bbox.x1.floor() as i32;
    let y1 = bbox.y1.floor() as i32;
    let x2 = (bbox.x2.ceil() as i32).min(frame.width() as i32 - 1);
    let y2 = (bbox.y2.ceil() as i32).min(frame.height() as i32 - 1);

    if x1 >= x2 || y1 >= y2 {
        return None;
    }
    Some((x1, y1, (x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32))
}
