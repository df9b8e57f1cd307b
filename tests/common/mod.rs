#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use candle_core::{Device, Tensor};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use oar_cls_serve::core::{ImageClassifier, ServeError, ServerConfig, Tensor4D};
use oar_cls_serve::server::{AppState, build_app};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

pub const BOUNDARY: &str = "oar-cls-serve-test-boundary";

/// Classifier that always predicts the same class.
#[derive(Debug)]
pub struct FixedClassifier {
    pub class: usize,
    pub num_classes: usize,
    device: Device,
}

impl FixedClassifier {
    pub fn new(class: usize) -> Self {
        Self {
            class,
            num_classes: 31,
            device: Device::Cpu,
        }
    }
}

impl ImageClassifier for FixedClassifier {
    fn model_name(&self) -> &str {
        "fixed"
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, input: &Tensor) -> Result<Vec<usize>, ServeError> {
        assert_eq!(input.dims(), &[1, 3, 224, 224]);
        Ok(vec![self.class])
    }
}

/// Classifier whose inference always fails.
#[derive(Debug)]
pub struct FailingClassifier {
    device: Device,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
        }
    }
}

impl ImageClassifier for FailingClassifier {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn num_classes(&self) -> usize {
        31
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, _input: &Tensor) -> Result<Vec<usize>, ServeError> {
        Err(ServeError::inference(
            "failing",
            "forward pass",
            std::io::Error::other("out of memory"),
        ))
    }
}

/// Classifier that cannot receive input on its device.
#[derive(Debug)]
pub struct UnreachableDeviceClassifier {
    device: Device,
}

impl UnreachableDeviceClassifier {
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
        }
    }
}

impl ImageClassifier for UnreachableDeviceClassifier {
    fn model_name(&self) -> &str {
        "unreachable-device"
    }

    fn num_classes(&self) -> usize {
        31
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn to_device(&self, _batch: &Tensor4D) -> Result<Tensor, ServeError> {
        Err(ServeError::invalid_input("device gone"))
    }

    fn predict(&self, _input: &Tensor) -> Result<Vec<usize>, ServeError> {
        Ok(vec![0])
    }
}

/// Classifier that blocks for `delay` before answering.
#[derive(Debug)]
pub struct SlowClassifier {
    delay: Duration,
    device: Device,
}

impl SlowClassifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            device: Device::Cpu,
        }
    }
}

impl ImageClassifier for SlowClassifier {
    fn model_name(&self) -> &str {
        "slow"
    }

    fn num_classes(&self) -> usize {
        31
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, _input: &Tensor) -> Result<Vec<usize>, ServeError> {
        std::thread::sleep(self.delay);
        Ok(vec![0])
    }
}

pub fn app(classifier: Arc<dyn ImageClassifier>) -> Router {
    app_with_config(classifier, &ServerConfig::default())
}

pub fn app_with_config(classifier: Arc<dyn ImageClassifier>, config: &ServerConfig) -> Router {
    let state = Arc::new(AppState::new(classifier, config).unwrap());
    build_app(state, config)
}

/// Multipart body with a single file field.
pub fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, bytes)))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7) as u8, (y * 5) as u8, 90, if x % 2 == 0 { 255 } else { 0 }])
    });
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

pub fn rgb_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 2) as u8, (y * 4) as u8, 128]));
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}
