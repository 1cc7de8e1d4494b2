/// Image formats recognized by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Ico,
    Cur,
    Png,
    Gif,
    Jpeg,
    Bmp,
    Webp,
    Svg,
}

/// Identifies an image payload by its signature.
///
/// Servers commonly answer `/favicon.ico` with an HTML error page and a 200
/// status, so the body itself has to be checked rather than the status or
/// content-type.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageKind> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

    if bytes.starts_with(PNG) {
        return Some(ImageKind::Png);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(ImageKind::Gif);
    }
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some(ImageKind::Jpeg);
    }
    if bytes.len() >= 6 && bytes.starts_with(&[0, 0]) && bytes[4..6] != [0, 0] {
        match bytes[2..4] {
            [1, 0] => return Some(ImageKind::Ico),
            [2, 0] => return Some(ImageKind::Cur),
            _ => {}
        }
    }
    if bytes.len() >= 14 && bytes.starts_with(b"BM") {
        return Some(ImageKind::Bmp);
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(ImageKind::Webp);
    }
    if looks_like_svg(bytes) {
        return Some(ImageKind::Svg);
    }
    None
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    (head.starts_with("<svg") || head.starts_with("<?xml")) && head.contains("<svg")
}
