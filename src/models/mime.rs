//! 根据文件扩展名推断 MIME 类型
//!
//! 上传到文件存储时需要提供 Content-Type，常见的办公文档 / PDF 都在表里。

use phf::phf_map;
use std::path::Path;

/// 未知扩展名时使用的类型
pub const FALLBACK_MIME: &str = "application/octet-stream";

static MIME_BY_EXTENSION: phf::Map<&'static str, &'static str> = phf_map! {
    "pdf" => "application/pdf",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "xls" => "application/vnd.ms-excel",
    "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "ppt" => "application/vnd.ms-powerpoint",
    "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "odt" => "application/vnd.oasis.opendocument.text",
    "ods" => "application/vnd.oasis.opendocument.spreadsheet",
    "odp" => "application/vnd.oasis.opendocument.presentation",
    "rtf" => "application/rtf",
    "txt" => "text/plain",
    "csv" => "text/csv",
    "md" => "text/markdown",
    "htm" => "text/html",
    "html" => "text/html",
    "xml" => "text/xml",
    "json" => "application/json",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "webp" => "image/webp",
};

/// 从文件名推断 MIME 类型（扩展名不区分大小写）
pub fn mime_for_filename(filename: &str) -> &'static str {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| MIME_BY_EXTENSION.get(ext.as_str()).copied())
        .unwrap_or(FALLBACK_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_and_pdf_types() {
        assert_eq!(mime_for_filename("spec.pdf"), "application/pdf");
        assert_eq!(
            mime_for_filename("terms.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(
            mime_for_filename("Preisblatt.XLSX"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(mime_for_filename("archive.7z"), FALLBACK_MIME);
        assert_eq!(mime_for_filename("LIESMICH"), FALLBACK_MIME);
    }
}
