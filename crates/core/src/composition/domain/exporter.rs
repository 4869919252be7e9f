use std::path::Path;

use crate::composition::domain::composition::Composition;
use crate::shared::media_time::TimeRange;

/// Renders a range of a composition into a container file.
///
/// Implementations handle muxing details (container, stream copy or
/// re-encode) while the pipeline works with the abstract `Composition`.
/// `on_progress` receives fractions in `[0, 1]`.
pub trait Exporter: Send {
    fn export(
        &self,
        composition: &Composition,
        range: TimeRange,
        output: &Path,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<(), Box<dyn std::error::Error>>;
}
