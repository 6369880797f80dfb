use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::{In, Reader, Tag, Value};
use log::{debug, warn};
use raylib::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read directory {path:?}: {source}")]
    ReadDir { path: PathBuf, source: std::io::Error },
    #[error("no image files found in {0:?}")]
    NoImages(Vec<PathBuf>),
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

fn extension_of(path: &Path) -> String {
    path.extension().and_then(|s| s.to_str()).unwrap_or("").to_lowercase()
}

pub fn is_image_path(path: &Path) -> bool {
    IMAGE_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Image files of a directory, sorted by file name.
pub fn load_sorted_image_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_dir_error = |source| LoadError::ReadDir { path: dir.to_path_buf(), source };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_file() && is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Expands directories and keeps explicit image files in the given order.
pub fn resolve_image_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(load_sorted_image_paths(input)?);
        } else if is_image_path(input) {
            paths.push(input.clone());
        } else {
            warn!("skipping {input:?}: not an image");
        }
    }
    if paths.is_empty() {
        return Err(LoadError::NoImages(inputs.to_vec()));
    }
    Ok(paths)
}

/// EXIF orientation tag of a JPEG, 1 when absent or unreadable.
pub fn exif_orientation(bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| match &field.value {
                Value::Short(values) => values.first().copied(),
                _ => None,
            })
            .unwrap_or(1),
        Err(e) => {
            debug!("no EXIF data: {e}");
            1
        }
    }
}

/// Loads an image as a texture with its EXIF rotation baked in.
pub fn load_texture_with_exif_rotation(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    image_path: &Path,
) -> Result<Texture2D, LoadError> {
    let bytes = fs::read(image_path)
        .map_err(|source| LoadError::Read { path: image_path.to_path_buf(), source })?;
    let decode_error = |reason: String| LoadError::Decode { path: image_path.to_path_buf(), reason };

    let extension = extension_of(image_path);
    let orientation = if extension == "jpg" || extension == "jpeg" {
        exif_orientation(&bytes)
    } else {
        1
    };

    let mut image = Image::load_image_from_mem(&format!(".{extension}"), &bytes)
        .map_err(|e| decode_error(e.to_string()))?;

    // 3 = 180°, 6 = 90° clockwise, 8 = 90° counter-clockwise; flips are ignored.
    match orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }
    if orientation != 1 {
        debug!("{:?}: applied EXIF orientation {orientation}", image_path.file_name());
    }

    rl.load_texture_from_image(thread, &image)
        .map_err(|e| decode_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_image_extensions_case_insensitively() {
        assert!(is_image_path(Path::new("party.JPG")));
        assert!(is_image_path(Path::new("cake.png")));
        assert!(!is_image_path(Path::new("song.mp3")));
        assert!(!is_image_path(Path::new("README")));
    }

    #[test]
    fn missing_exif_defaults_to_upright() {
        assert_eq!(exif_orientation(b"not a jpeg"), 1);
    }

    #[test]
    fn explicit_files_keep_their_order() {
        let inputs = vec![PathBuf::from("b.jpg"), PathBuf::from("notes.txt"), PathBuf::from("a.png")];
        let paths = resolve_image_paths(&inputs).unwrap();
        assert_eq!(paths, vec![PathBuf::from("b.jpg"), PathBuf::from("a.png")]);
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let inputs = vec![PathBuf::from("notes.txt")];
        assert!(matches!(resolve_image_paths(&inputs), Err(LoadError::NoImages(_))));
    }

    #[test]
    fn directory_scan_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("birthday-page-scan-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["2.jpg", "1.png", "notes.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        let paths = load_sorted_image_paths(&dir).unwrap();
        let names: Vec<_> = paths.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["1.png", "2.jpg"]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
