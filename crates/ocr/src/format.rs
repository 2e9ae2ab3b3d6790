use image::ImageFormat;

/// Whether a receipt with this MIME type can go through OCR at all.
///
/// Parameters (`; charset=…`) and case are ignored. `image/jpg` is a common
/// upload-side misspelling of `image/jpeg` and is accepted as such. PDFs are
/// never rasterizable here.
pub fn is_rasterizable(mime: &str) -> bool {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/pdf" => false,
        "image/jpg" => true,
        other => ImageFormat::from_mime_type(other).is_some(),
    }
}
