use std::path::PathBuf;

/// Last prediction shown under the model picker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredictionState {
    pub label: Option<String>,
    /// 28x28 grayscale bytes of the classified image.
    pub preview: Option<Vec<u8>>,
    /// Bumped whenever `preview` changes so the renderer can refresh its texture.
    pub revision: u64,
    pub source: Option<PathBuf>,
}

impl PredictionState {
    pub fn set(&mut self, label: String, preview: Vec<u8>, source: PathBuf) {
        self.label = Some(label);
        self.preview = Some(preview);
        self.source = Some(source);
        self.revision = self.revision.wrapping_add(1);
    }
}
