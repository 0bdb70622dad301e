use anyhow::{anyhow, Context, Result};
use colored::*;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{info, warn};

use crate::error::GestureError;
use crate::pipeline::FrameSource;
use crate::types::Frame;

/// An open webcam stream. The stream is stopped when this is dropped.
pub struct CameraSource {
    camera: Camera,
    mirror: bool,
}

impl CameraSource {
    pub fn new(index: u32, mirror: bool) -> Result<Self> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .context("Failed to create camera instance")?;

        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("Failed to open camera stream")?;

        println!("{}", format!("Opened camera: {}", camera.info().human_name()).green());
        info!(format = %camera.camera_format(), "camera stream open");

        Ok(Self { camera, mirror })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> crate::error::Result<Option<Frame>> {
        let raw = self
            .camera
            .frame()
            .map_err(|e| GestureError::Capture(e.to_string()))?;
        let mut image = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| GestureError::FrameDecode(e.to_string()))?;
        if self.mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }
        Ok(Some(Frame::rgb(image)))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!(error = %e, "failed to stop camera stream");
        }
    }
}

/// Prints the cameras the platform backend can see.
pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto).context("Failed to query cameras")?;
    println!("{}", "Available Cameras:".bold());
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}
