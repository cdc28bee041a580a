use crate::types::Modality;
use std::path::Path;

/// Map a file to its content modality by extension. Pure; unknown
/// extensions (and files without one) classify as `Other`.
pub fn classify(path: &Path) -> Modality {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Modality::Other;
    };

    match ext.to_lowercase().as_str() {
        // Prose, markup and structured text
        "txt" | "md" | "rst" | "pdf" | "json" | "csv" | "xml" | "html" | "htm" | "log" => {
            Modality::Text
        }
        // Source files carry readable text too
        "py" | "js" | "ts" | "css" | "rs" | "sh" | "toml" | "yaml" | "yml" => Modality::Text,

        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "webp" | "svg" => Modality::Image,

        // mp4 included: the transcription backends accept it as an audio container
        "mp3" | "wav" | "m4a" | "ogg" | "flac" | "aac" | "mp4" => Modality::Audio,

        _ => Modality::Other,
    }
}
