//! Media source adapter
//!
//! A media source hands the workflow an [`ImageRef`] from the photo library or
//! the camera. Permissions are requested up front; a denied permission or a
//! cancelled pick is reported to the caller, never retried here.

use crate::config::PickOptions;
use crate::error::{Result, SnapCleanError};
use crate::types::ImageRef;
use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions accepted from a capture directory
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

impl Permission {
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

/// Outcome of a pick or capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The user chose an image
    Picked(ImageRef),
    /// The user backed out; not an error
    Cancelled,
}

/// Where the workflow should get its image from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Library,
    Camera,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Camera => write!(f, "camera"),
        }
    }
}

/// Platform picker/camera contract
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Ask for photo library access
    async fn request_photo_library_access(&self) -> Permission;

    /// Ask for camera access
    async fn request_camera_access(&self) -> Permission;

    /// Let the user pick an image from the library
    ///
    /// # Errors
    /// - The chosen image could not be read or edited
    async fn pick_from_library(&self, options: &PickOptions) -> Result<Selection>;

    /// Let the user take a photo
    ///
    /// # Errors
    /// - The captured image could not be read or edited
    async fn capture_from_camera(&self, options: &PickOptions) -> Result<Selection>;
}

/// Filesystem-backed media source
///
/// The "library" is a single preselected file and the "camera" is a drop
/// folder that a tethered camera writes into; the newest image there is the
/// capture. With `allow_editing` set, the adapter performs the crop itself and
/// re-encodes the result into its working directory.
#[derive(Debug, Clone)]
pub struct FileMediaSource {
    library_selection: Option<PathBuf>,
    capture_dir: Option<PathBuf>,
    work_dir: PathBuf,
}

impl FileMediaSource {
    /// Create a source that writes edited images into `work_dir`
    pub fn new<P: Into<PathBuf>>(work_dir: P) -> Self {
        Self {
            library_selection: None,
            capture_dir: None,
            work_dir: work_dir.into(),
        }
    }

    /// Default working directory under the user cache dir
    #[must_use]
    pub fn default_work_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("snapclean")
            .join("edits")
    }

    /// File returned by the next library pick
    #[must_use]
    pub fn with_library_selection<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_selection = Some(path.into());
        self
    }

    /// Folder scanned for the newest capture
    #[must_use]
    pub fn with_capture_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.capture_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Most recently modified image file under `dir`
    fn newest_image(dir: &Path) -> Option<PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file() && has_image_extension(entry.path()))
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((modified, entry.into_path()))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, path)| path)
    }

    /// Read (and optionally edit) the image at `path`
    async fn load(&self, path: PathBuf, options: PickOptions) -> Result<Selection> {
        options.validate()?;
        let work_dir = self.work_dir.clone();

        let image = tokio::task::spawn_blocking(move || {
            if options.allow_editing {
                edit_image(&path, &work_dir, &options)
            } else {
                describe_image(&path)
            }
        })
        .await
        .map_err(|e| SnapCleanError::acquisition(format!("Image task failed: {}", e)))??;

        log::debug!(
            "Selected image: {} ({:?}x{:?})",
            image.uri,
            image.width,
            image.height
        );
        Ok(Selection::Picked(image))
    }
}

#[async_trait]
impl MediaSource for FileMediaSource {
    async fn request_photo_library_access(&self) -> Permission {
        let Some(path) = &self.library_selection else {
            return Permission::Granted;
        };
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        match std::fs::read_dir(parent) {
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                log::warn!("Library access denied for {}", parent.display());
                Permission::Denied
            },
            _ => Permission::Granted,
        }
    }

    async fn request_camera_access(&self) -> Permission {
        match &self.capture_dir {
            Some(dir) if std::fs::read_dir(dir).is_ok() => Permission::Granted,
            Some(dir) => {
                log::warn!("Capture directory unavailable: {}", dir.display());
                Permission::Denied
            },
            None => Permission::Denied,
        }
    }

    async fn pick_from_library(&self, options: &PickOptions) -> Result<Selection> {
        match &self.library_selection {
            Some(path) if path.is_file() => self.load(path.clone(), *options).await,
            Some(path) => {
                log::info!("Nothing to pick at {}", path.display());
                Ok(Selection::Cancelled)
            },
            None => Ok(Selection::Cancelled),
        }
    }

    async fn capture_from_camera(&self, options: &PickOptions) -> Result<Selection> {
        let Some(dir) = &self.capture_dir else {
            return Ok(Selection::Cancelled);
        };
        match Self::newest_image(dir) {
            Some(path) => self.load(path, *options).await,
            None => {
                log::info!("No capture found in {}", dir.display());
                Ok(Selection::Cancelled)
            },
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// `file://` URI for a local path
#[must_use]
pub fn file_uri(path: &Path) -> String {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Local path behind a `file://` URI
#[must_use]
pub fn path_from_file_uri(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix("file://").map(PathBuf::from)
}

fn describe_image(path: &Path) -> Result<ImageRef> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| SnapCleanError::acquisition(format!("{}: {}", path.display(), e)))?;
    Ok(ImageRef::new(file_uri(path), Some(width), Some(height)))
}

/// Centre-crop to the requested aspect and re-encode as JPEG
fn edit_image(path: &Path, work_dir: &Path, options: &PickOptions) -> Result<ImageRef> {
    let source = image::open(path)
        .map_err(|e| SnapCleanError::acquisition(format!("{}: {}", path.display(), e)))?;
    let cropped = crop_to_aspect(&source, options.aspect);
    let (width, height) = cropped.dimensions();

    std::fs::create_dir_all(work_dir)
        .map_err(|e| SnapCleanError::file_io_error("create working directory", work_dir, &e))?;
    let output = work_dir.join(format!("edited-{}.jpg", uuid::Uuid::new_v4()));
    let file = File::create(&output)
        .map_err(|e| SnapCleanError::file_io_error("create edited image", &output, &e))?;

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        BufWriter::new(file),
        options.jpeg_quality(),
    );
    encoder.encode_image(&cropped.to_rgb8())?;

    log::debug!(
        "Edited {} -> {} ({}x{})",
        path.display(),
        output.display(),
        width,
        height
    );
    Ok(ImageRef::new(file_uri(&output), Some(width), Some(height)))
}

fn crop_to_aspect(image: &DynamicImage, aspect: (u32, u32)) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (aspect_w, aspect_h) = (u64::from(aspect.0.max(1)), u64::from(aspect.1.max(1)));
    let (w, h) = (u64::from(width), u64::from(height));

    let (crop_w, crop_h) = if w * aspect_h > h * aspect_w {
        ((h * aspect_w / aspect_h).max(1), h)
    } else {
        (w, (w * aspect_h / aspect_w).max(1))
    };

    let x = (w - crop_w) / 2;
    let y = (h - crop_h) / 2;
    image.crop_imm(x as u32, y as u32, crop_w as u32, crop_h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_image(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10, 200, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_crop_to_square() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 300));
        assert_eq!(crop_to_aspect(&image, (1, 1)).dimensions(), (300, 300));

        let image = DynamicImage::ImageRgb8(RgbImage::new(300, 500));
        assert_eq!(crop_to_aspect(&image, (1, 1)).dimensions(), (300, 300));

        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 400));
        assert_eq!(crop_to_aspect(&image, (4, 3)).dimensions(), (400, 300));
    }

    #[test]
    fn test_file_uri_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        write_image(&path, 2, 2);

        let uri = file_uri(&path);
        assert!(uri.starts_with("file://"));
        assert_eq!(
            path_from_file_uri(&uri).unwrap(),
            path.canonicalize().unwrap()
        );
        assert!(path_from_file_uri("https://cdn/x.png").is_none());
    }

    #[tokio::test]
    async fn test_pick_without_editing_reports_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        write_image(&path, 80, 60);

        let source = FileMediaSource::new(dir.path().join("work")).with_library_selection(&path);
        let options = PickOptions {
            allow_editing: false,
            ..PickOptions::default()
        };
        let selection = source.pick_from_library(&options).await.unwrap();

        let Selection::Picked(image) = selection else {
            panic!("expected a picked image");
        };
        assert_eq!((image.width, image.height), (Some(80), Some(60)));
        assert!(image.uri.ends_with("photo.png"));
    }

    #[tokio::test]
    async fn test_pick_with_editing_crops_square() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        write_image(&path, 120, 60);

        let work = dir.path().join("work");
        let source = FileMediaSource::new(&work).with_library_selection(&path);
        let selection = source
            .pick_from_library(&PickOptions::default())
            .await
            .unwrap();

        let Selection::Picked(image) = selection else {
            panic!("expected a picked image");
        };
        assert_eq!((image.width, image.height), (Some(60), Some(60)));
        assert!(image.uri.ends_with(".jpg"));
        let edited = path_from_file_uri(&image.uri).unwrap();
        assert!(edited.starts_with(work.canonicalize().unwrap()));
    }

    #[tokio::test]
    async fn test_missing_selection_is_cancelled() {
        let dir = TempDir::new().unwrap();
        let source = FileMediaSource::new(dir.path());
        assert_eq!(
            source.pick_from_library(&PickOptions::default()).await.unwrap(),
            Selection::Cancelled
        );

        let source = source.with_library_selection(dir.path().join("missing.jpg"));
        assert_eq!(
            source.pick_from_library(&PickOptions::default()).await.unwrap(),
            Selection::Cancelled
        );
    }

    #[tokio::test]
    async fn test_undecodable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let source = FileMediaSource::new(dir.path()).with_library_selection(&path);
        let err = source
            .pick_from_library(&PickOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SnapCleanError::Acquisition(_)));
    }

    #[tokio::test]
    async fn test_camera_requires_capture_dir() {
        let dir = TempDir::new().unwrap();
        let source = FileMediaSource::new(dir.path());
        assert_eq!(source.request_camera_access().await, Permission::Denied);

        let source = source.with_capture_dir(dir.path().join("nope"));
        assert_eq!(source.request_camera_access().await, Permission::Denied);

        let source = FileMediaSource::new(dir.path()).with_capture_dir(dir.path());
        assert_eq!(source.request_camera_access().await, Permission::Granted);
    }

    #[tokio::test]
    async fn test_capture_picks_newest_image() {
        let dir = TempDir::new().unwrap();
        let captures = dir.path().join("captures");
        std::fs::create_dir_all(&captures).unwrap();
        write_image(&captures.join("a-old.png"), 10, 10);
        std::fs::write(captures.join("notes.txt"), "ignored").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        write_image(&captures.join("b-new.png"), 30, 20);

        let source = FileMediaSource::new(dir.path().join("work")).with_capture_dir(&captures);
        let options = PickOptions {
            allow_editing: false,
            ..PickOptions::default()
        };
        let Selection::Picked(image) = source.capture_from_camera(&options).await.unwrap() else {
            panic!("expected a capture");
        };
        assert!(image.uri.ends_with("b-new.png"));
        assert_eq!(image.width, Some(30));
    }

    #[tokio::test]
    async fn test_empty_capture_dir_is_cancelled() {
        let dir = TempDir::new().unwrap();
        let source = FileMediaSource::new(dir.path()).with_capture_dir(dir.path());
        assert_eq!(
            source
                .capture_from_camera(&PickOptions::default())
                .await
                .unwrap(),
            Selection::Cancelled
        );
    }
}
