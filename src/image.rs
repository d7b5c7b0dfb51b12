use std::path::Path;

use base64::Engine;

use crate::error::ChatError;
use crate::models::ImageData;

pub const MAX_IMAGE_BYTES: u64 = 200 * 1024 * 1024;
const ACCEPTED_MIMES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];

fn unsupported() -> ChatError {
  ChatError::InvalidImage("请上传 PNG 或 JPG 格式的图片".to_string())
}

fn too_large() -> ChatError {
  ChatError::InvalidImage("文件大小不能超过 200MB".to_string())
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
  if bytes.starts_with(PNG_MAGIC) {
    Some("image/png")
  } else if bytes.starts_with(JPEG_MAGIC) {
    Some("image/jpeg")
  } else {
    None
  }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    _ => None,
  }
}

pub fn is_accepted_mime(mime: &str) -> bool {
  ACCEPTED_MIMES.contains(&mime)
}

/// Encodes raw image bytes. The declared mime must be PNG/JPEG and agree with the content.
pub fn encode_image(bytes: &[u8], mime: &str) -> Result<ImageData, ChatError> {
  if !is_accepted_mime(mime) {
    return Err(unsupported());
  }
  if bytes.len() as u64 > MAX_IMAGE_BYTES {
    return Err(too_large());
  }
  let sniffed = sniff_mime(bytes).ok_or_else(unsupported)?;
  let declared = if mime == "image/jpg" { "image/jpeg" } else { mime };
  if sniffed != declared {
    return Err(unsupported());
  }

  Ok(ImageData {
    mime: mime.to_string(),
    base64: base64::engine::general_purpose::STANDARD.encode(bytes),
  })
}

pub fn load_image(path: &Path) -> Result<ImageData, ChatError> {
  let mime = mime_from_extension(path).ok_or_else(unsupported)?;
  let size = std::fs::metadata(path)
    .map_err(|e| ChatError::InvalidImage(format!("{}: {e}", path.display())))?
    .len();
  if size > MAX_IMAGE_BYTES {
    return Err(too_large());
  }
  let bytes =
    std::fs::read(path).map_err(|e| ChatError::InvalidImage(format!("{}: {e}", path.display())))?;
  encode_image(&bytes, mime)
}

/// Validates an image that arrived as a data URI.
pub fn parse_data_uri(uri: &str) -> Result<ImageData, ChatError> {
  let image = ImageData::from_data_uri(uri).ok_or_else(unsupported)?;
  if !is_accepted_mime(&image.mime) {
    return Err(unsupported());
  }
  // base64 inflates by 4/3
  if (image.base64.len() as u64) / 4 * 3 > MAX_IMAGE_BYTES {
    return Err(too_large());
  }
  base64::engine::general_purpose::STANDARD
    .decode(image.base64.as_bytes())
    .map_err(|_| ChatError::InvalidImage("图片数据无法解码".to_string()))?;
  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn png_bytes() -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13]);
    bytes
  }

  #[test]
  fn encodes_png() {
    let image = encode_image(&png_bytes(), "image/png").expect("png accepted");
    assert_eq!(image.mime, "image/png");
    assert!(image.data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
  }

  #[test]
  fn rejects_gif_and_mismatched_content() {
    assert!(matches!(
      encode_image(b"GIF89a", "image/gif"),
      Err(ChatError::InvalidImage(_))
    ));
    assert!(matches!(
      encode_image(&png_bytes(), "image/jpeg"),
      Err(ChatError::InvalidImage(_))
    ));
  }

  #[test]
  fn loads_from_disk_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.JPG");
    std::fs::write(&path, [0xff, 0xd8, 0xff, 0xe0, 0, 16]).unwrap();
    let image = load_image(&path).expect("jpeg accepted");
    assert_eq!(image.mime, "image/jpeg");

    let txt = dir.path().join("q.txt");
    std::fs::write(&txt, "hello").unwrap();
    assert!(load_image(&txt).is_err());
  }

  #[test]
  fn data_uri_validation() {
    let ok = parse_data_uri("data:image/png;base64,iVBORw0KGgo=").expect("valid");
    assert_eq!(ok.mime, "image/png");
    assert!(parse_data_uri("data:image/gif;base64,R0lGOD==").is_err());
    assert!(parse_data_uri("data:image/png;base64,@@@").is_err());
    assert!(parse_data_uri("not a uri").is_err());
  }
}
