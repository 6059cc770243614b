use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{extension}'; accepted: txt, md, pdf")]
    UnsupportedType { extension: String },

    #[error("file is not valid UTF-8 text")]
    Encoding,

    #[error("no text could be extracted from the document")]
    EmptyDocument,

    #[error("PDF extraction failed: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Lowercased extension of `filename` when it is one we can read.
pub fn supported_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    match extension.as_str() {
        "txt" | "md" | "markdown" | "pdf" => Some(extension),
        _ => None,
    }
}

pub fn is_supported(filename: &str) -> bool {
    supported_extension(filename).is_some()
}

/// Pulls the raw text out of an uploaded file, dispatching on its extension.
/// The result is trimmed; a document that trims to nothing is an error, not
/// an empty success.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let extension = supported_extension(filename).ok_or_else(|| ExtractError::UnsupportedType {
        extension: filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default(),
    })?;

    let text = match extension.as_str() {
        "pdf" => extract_pdf(bytes)?,
        // txt, md, markdown
        _ => std::str::from_utf8(bytes)
            .map_err(|_| ExtractError::Encoding)?
            .to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(trimmed.to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    Ok(document.extract_text(&pages)?)
}
