pub mod audio;
pub mod enrich;
pub mod image;
pub mod text;

pub use audio::AudioDetector;
pub use enrich::Summarizer;
pub use image::ImageDetector;
pub use text::TextDetector;

use shroud_core::DetectorRegistry;
use std::sync::Arc;

/// Build the registry of built-in heuristic detectors, resolved once at
/// startup. `Other` files deliberately stay uncovered and fall through to
/// the orchestrator's no-detector verdict.
pub fn default_registry() -> DetectorRegistry {
    let mut registry = DetectorRegistry::new();
    registry.register(Arc::new(TextDetector::new()));
    registry.register(Arc::new(ImageDetector));
    registry.register(Arc::new(AudioDetector));
    registry
}
