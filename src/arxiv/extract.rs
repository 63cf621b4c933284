//! Full-text extraction / 正文提取
//!
//! Source bundles are usually a gzipped tar of LaTeX files, sometimes a single
//! gzipped `.tex`, occasionally plain text. PDFs go through `pdf-extract`.

use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::ExtractError;
use crate::models::ContentKind;

const TEXT_EXTENSIONS: [&str; 3] = ["tex", "txt", "log"];
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extract plain text from a downloaded payload / 从下载内容中提取文本
pub fn extract_text(data: &[u8], kind: ContentKind) -> Result<String, ExtractError> {
    match kind {
        ContentKind::Source => extract_source_text(data),
        ContentKind::Pdf => extract_pdf_text(data),
    }
}

/// Extract text from an e-print source payload / 从源码包提取文本
pub fn extract_source_text(data: &[u8]) -> Result<String, ExtractError> {
    let data = gunzip(data);

    if !looks_like_tar(&data) {
        return Ok(String::from_utf8_lossy(&data).into_owned());
    }

    let mut archive = tar::Archive::new(Cursor::new(data.as_ref()));
    let mut text = String::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.into_owned();
        let ext = extension(&path);
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            text.push_str(&String::from_utf8_lossy(&buf));
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            tracing::debug!("Skipping image file: {}", path.display());
        } else {
            tracing::debug!("Unhandled file type: {}", path.display());
        }
    }

    Ok(text)
}

/// Extract text from PDF bytes / 从 PDF 提取文本
pub fn extract_pdf_text(data: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Decompress gzip data, or hand back the input when it is not gzip
/// 尝试 gzip 解压，失败则原样返回
fn gunzip(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.starts_with(&[0x1f, 0x8b]) {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::new();
    match GzDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Cow::Owned(out),
        Err(e) => {
            tracing::debug!("Payload is not valid gzip ({}), using it as is", e);
            Cow::Borrowed(data)
        }
    }
}

/// A tar archive starts with a 512-byte header whose checksum adds up
/// 通过首个头部校验和判断是否为 tar
fn looks_like_tar(data: &[u8]) -> bool {
    if data.len() < 512 {
        return false;
    }

    let block = &data[..512];
    let header = tar::Header::from_byte_slice(block);
    let Ok(expected) = header.cksum() else {
        return false;
    };

    // The checksum field itself counts as eight spaces
    let actual: u32 = block
        .iter()
        .enumerate()
        .map(|(i, b)| if (148..156).contains(&i) { b' ' as u32 } else { *b as u32 })
        .sum();
    expected == actual
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}
