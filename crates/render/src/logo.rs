//! Company logos read from the media root.

use std::path::{Component, Path, PathBuf};

use printpdf::image_crate::{self, DynamicImage, GenericImageView};

/// Largest printed logo width in millimetres.
pub const MAX_WIDTH_MM: f32 = 40.0;
/// Largest printed logo height in millimetres.
pub const MAX_HEIGHT_MM: f32 = 20.0;

/// A decoded logo.
#[derive(Debug, Clone)]
pub struct Logo {
    pub image: DynamicImage,
}

impl Logo {
    pub fn pixels(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Printed size in millimetres, scaled into the logo box.
    pub fn printed_size(&self) -> (f32, f32) {
        let (width, height) = self.pixels();
        fit_within(width, height, MAX_WIDTH_MM, MAX_HEIGHT_MM)
    }
}

/// Scales `width × height` to fit inside `max_width × max_height`,
/// keeping the aspect ratio. Images are scaled up as well as down.
pub fn fit_within(width: u32, height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (width, height) = (width as f32, height as f32);
    let ratio = (max_width / width).min(max_height / height);
    (width * ratio, height * ratio)
}

/// Read-only view of the asset directory holding uploaded logos.
#[derive(Debug, Clone)]
pub struct LogoStore {
    root: PathBuf,
}

impl LogoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        (!escapes).then(|| self.root.join(relative))
    }

    /// Loads and decodes a logo. Every failure is logged and yields `None`.
    #[tracing::instrument(skip(self))]
    pub fn load(&self, relative: &str) -> Option<Logo> {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = %relative, "Logo path leaves the media root; skipping logo");
            return None;
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read logo; skipping logo");
                return None;
            }
        };

        match image_crate::load_from_memory(&bytes) {
            Ok(image) => Some(Logo { image }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to decode logo; skipping logo");
                None
            }
        }
    }
}
