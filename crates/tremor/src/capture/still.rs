//! Pi camera stills via rpicam-still
//!
//! Each capture runs one `rpicam-still` process writing a JPEG straight to
//! its final path. The process is killed if it outlives the capture timeout
//! or if the capture future is dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::ImageCaptureSink;
use crate::config::picture_path;
use crate::error::{CaptureError, InitializationError};
use crate::event::EventTimestamp;

/// Still camera configuration
#[derive(Debug, Clone)]
pub struct StillCameraConfig {
    /// Capture program (`rpicam-still`, or `libcamera-still` on older images)
    pub program: String,
    /// Output width in pixels (None = sensor default)
    pub width: Option<u32>,
    /// Output height in pixels (None = sensor default)
    pub height: Option<u32>,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Time the camera runs before taking the shot, for exposure to settle
    pub settle: Duration,
    /// Kill the capture process after this long
    pub timeout: Duration,
}

impl Default for StillCameraConfig {
    fn default() -> Self {
        Self {
            program: "rpicam-still".to_string(),
            width: None,
            height: None,
            quality: 93,
            settle: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to the Pi camera.
///
/// The camera holds no device between captures: each capture spawns its own
/// `rpicam-still`, which owns the sensor only while it runs. Closing (also on
/// drop) marks the handle so later captures fail with [`CaptureError::Closed`].
/// A capture still in flight is killed when its future is dropped, through
/// `kill_on_drop` on the child process.
pub struct StillCamera {
    config: StillCameraConfig,
    picture_dir: PathBuf,
    /// Arguments placed before the rpicam arguments
    launcher_args: Vec<String>,
    closed: bool,
}

impl StillCamera {
    /// Check that the capture program runs and reports at least one camera.
    pub async fn open(
        config: StillCameraConfig,
        picture_dir: impl Into<PathBuf>,
    ) -> Result<Self, InitializationError> {
        let mut camera = Self {
            config,
            picture_dir: picture_dir.into(),
            launcher_args: Vec::new(),
            closed: false,
        };
        if let Err(e) = camera.probe().await {
            // Never opened, nothing to release
            camera.closed = true;
            return Err(e);
        }
        info!(
            "Camera initialized ({}, quality {})",
            camera.config.program, camera.config.quality
        );
        Ok(camera)
    }

    async fn probe(&self) -> Result<(), InitializationError> {
        let output = self
            .command()
            .arg("--list-cameras")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                InitializationError::Camera(format!(
                    "failed to run {}: {}. Is it installed?",
                    self.config.program, e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} --list-cameras: {}", self.config.program, stdout.trim());

        if !output.status.success() {
            return Err(InitializationError::Camera(format!(
                "{} --list-cameras exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }
        if !stdout.contains("Available cameras") {
            return Err(InitializationError::Camera("no cameras available".into()));
        }
        Ok(())
    }

    pub fn config(&self) -> &StillCameraConfig {
        &self.config
    }

    pub fn picture_dir(&self) -> &Path {
        &self.picture_dir
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.launcher_args);
        cmd
    }

    /// rpicam-still arguments for a capture written to `path`.
    pub fn capture_args(&self, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(), // No preview window
            "-t".to_string(),
            self.config.settle.as_millis().max(1).to_string(),
            "-q".to_string(),
            self.config.quality.to_string(),
        ];

        if let Some(width) = self.config.width {
            args.push("--width".to_string());
            args.push(width.to_string());
        }
        if let Some(height) = self.config.height {
            args.push("--height".to_string());
            args.push(height.to_string());
        }

        args.push("-o".to_string());
        args.push(path.to_string_lossy().into_owned());
        args
    }

    async fn capture_to(&self, path: &Path) -> Result<(), CaptureError> {
        if !self.picture_dir.is_dir() {
            fs::create_dir_all(&self.picture_dir).map_err(|source| CaptureError::CreateDir {
                path: self.picture_dir.clone(),
                source,
            })?;
            info!("Created directory: {:?}", self.picture_dir);
        }

        let args = self.capture_args(path);
        debug!("{} args: {:?}", self.config.program, args);

        let child = self
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        // On timeout the child is dropped, and kill_on_drop reaps it
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| CaptureError::Timeout(self.config.timeout))?
            .map_err(|e| CaptureError::Other(format!("waiting for capture: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().last().unwrap_or_default().trim().to_string();
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: last,
            });
        }
        Ok(())
    }

    /// Release the camera. Further captures fail with [`CaptureError::Closed`].
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            info!("Camera closed");
        }
    }
}

#[async_trait::async_trait]
impl ImageCaptureSink for StillCamera {
    async fn capture(&mut self, timestamp: &EventTimestamp) -> Result<PathBuf, CaptureError> {
        if self.closed {
            return Err(CaptureError::Closed);
        }

        let path = picture_path(&self.picture_dir, timestamp);
        self.capture_to(&path).await?;

        info!(
            "Picture taken and saved as: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(path)
    }
}

impl Drop for StillCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use tempfile::tempdir;
    use tokio::time::Instant;

    /// Stand-in for rpicam-still: lists one camera, writes a fake JPEG to
    /// the path after `-o`.
    const FAKE_RPICAM: &str = r#"
        if [ "$1" = "--list-cameras" ]; then
            echo "Available cameras"
            echo "-----------------"
            echo "0 : imx219 [3280x2464 10-bit RGGB]"
            exit 0
        fi
        out=""
        while [ $# -gt 0 ]; do
            if [ "$1" = "-o" ]; then out="$2"; fi
            shift
        done
        printf '\377\330\377\340fake' > "$out"
    "#;

    fn fake_camera(script: &str, picture_dir: &Path, timeout: Duration) -> StillCamera {
        StillCamera {
            config: StillCameraConfig {
                program: "sh".to_string(),
                timeout,
                ..Default::default()
            },
            picture_dir: picture_dir.to_path_buf(),
            launcher_args: vec!["-c".to_string(), script.to_string(), "rpicam-still".to_string()],
            closed: false,
        }
    }

    fn timestamp() -> EventTimestamp {
        EventTimestamp::new(
            Instant::now(),
            Local.with_ymd_and_hms(2023, 5, 15, 16, 0, 0).unwrap(),
        )
    }

    #[test]
    fn capture_args_with_resolution() {
        let mut camera = fake_camera("", Path::new("/tmp"), Duration::from_secs(1));
        camera.config.width = Some(1920);
        camera.config.height = Some(1080);
        camera.config.quality = 90;

        let args = camera.capture_args(Path::new("/out/vibration_20230515_160000.jpg"));
        assert_eq!(
            args,
            vec![
                "-n", "-t", "500", "-q", "90", "--width", "1920", "--height", "1080", "-o",
                "/out/vibration_20230515_160000.jpg",
            ]
        );
    }

    #[test]
    fn capture_args_default_resolution() {
        let camera = fake_camera("", Path::new("/tmp"), Duration::from_secs(1));
        let args = camera.capture_args(Path::new("x.jpg"));
        assert!(!args.contains(&"--width".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("x.jpg"));
    }

    #[tokio::test]
    async fn probe_accepts_listed_camera() {
        let dir = tempdir().unwrap();
        let camera = fake_camera(FAKE_RPICAM, dir.path(), Duration::from_secs(5));
        camera.probe().await.unwrap();
    }

    #[tokio::test]
    async fn probe_rejects_empty_list() {
        let dir = tempdir().unwrap();
        let camera = fake_camera("echo 'No cameras available!'", dir.path(), Duration::from_secs(5));
        let err = camera.probe().await.unwrap_err();
        assert!(matches!(err, InitializationError::Camera(_)), "{err}");
    }

    #[tokio::test]
    async fn open_missing_program_is_initialization_error() {
        let config = StillCameraConfig {
            program: "/nonexistent/rpicam-still".to_string(),
            ..Default::default()
        };
        let err = match StillCamera::open(config, "/tmp").await {
            Err(e) => e,
            Ok(_) => panic!("open should fail"),
        };
        assert!(err.to_string().contains("Is it installed?"), "{err}");
    }

    #[tokio::test]
    async fn capture_writes_named_file_and_creates_directory() {
        let dir = tempdir().unwrap();
        let picture_dir = dir.path().join("vibration_pictures");
        let mut camera = fake_camera(FAKE_RPICAM, &picture_dir, Duration::from_secs(5));

        let path = camera.capture(&timestamp()).await.unwrap();

        assert_eq!(path, picture_dir.join("vibration_20230515_160000.jpg"));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn nonzero_exit_is_capture_error() {
        let dir = tempdir().unwrap();
        let mut camera = fake_camera(
            "echo 'ERROR: failed to acquire camera' >&2; exit 1",
            dir.path(),
            Duration::from_secs(5),
        );
        match camera.capture(&timestamp()).await {
            Err(CaptureError::Failed { stderr, .. }) => {
                assert_eq!(stderr, "ERROR: failed to acquire camera")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_capture_times_out() {
        let dir = tempdir().unwrap();
        let mut camera = fake_camera("sleep 5", dir.path(), Duration::from_millis(100));
        let err = camera.capture(&timestamp()).await.unwrap_err();
        assert!(matches!(err, CaptureError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn abandoned_capture_kills_the_process() {
        let dir = tempdir().unwrap();
        // Output path is the last argument; write it only after a delay
        let script = r#"for a; do out="$a"; done; sleep 1; printf x > "$out""#;
        let mut camera = fake_camera(script, dir.path(), Duration::from_secs(5));
        let ts = timestamp();
        let path = picture_path(dir.path(), &ts);

        let abandoned = tokio::time::timeout(Duration::from_millis(200), camera.capture(&ts)).await;
        assert!(abandoned.is_err());
        drop(camera);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!path.exists(), "capture process outlived its future");
    }

    #[tokio::test]
    async fn closed_camera_refuses_capture() {
        let dir = tempdir().unwrap();
        let mut camera = fake_camera(FAKE_RPICAM, dir.path(), Duration::from_secs(5));
        camera.close();
        camera.close();
        assert!(camera.is_closed());
        assert!(matches!(
            camera.capture(&timestamp()).await,
            Err(CaptureError::Closed)
        ));
    }
}
