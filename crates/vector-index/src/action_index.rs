use crate::encoder::Encoder;
use crate::error::Result;
use crate::flat_index::{FlatL2Index, NearestNeighborIndex};
use std::sync::Arc;

/// Embedding index over action descriptions.
///
/// Holds the names alongside the vector index so a search resolves straight
/// to an action name. Rebuilt wholesale whenever the catalog changes; at
/// catalog scale a full re-encode is cheaper than tracking deltas.
pub struct ActionIndex {
    encoder: Arc<dyn Encoder>,
    index: Box<dyn NearestNeighborIndex>,
    names: Vec<String>,
}

impl ActionIndex {
    #[must_use]
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        let dimension = encoder.dimension();
        Self {
            encoder,
            index: Box::new(FlatL2Index::new(dimension)),
            names: Vec::new(),
        }
    }

    /// Swaps in a different search backend. The backend dimension must match
    /// the encoder's.
    #[must_use]
    pub fn with_backend(encoder: Arc<dyn Encoder>, index: Box<dyn NearestNeighborIndex>) -> Self {
        Self {
            encoder,
            index,
            names: Vec::new(),
        }
    }

    /// Re-encodes every `(name, description)` pair and replaces the index
    /// contents. Names keep the order of `actions`.
    pub fn rebuild(&mut self, actions: &[(String, String)]) -> Result<()> {
        if actions.is_empty() {
            self.index.rebuild(Vec::new())?;
            self.names.clear();
            log::info!("Embedding index rebuilt empty");
            return Ok(());
        }

        let descriptions: Vec<String> = actions.iter().map(|(_, desc)| desc.clone()).collect();
        let vectors = self.encoder.encode_batch(&descriptions)?;
        self.index.rebuild(vectors)?;
        self.names = actions.iter().map(|(name, _)| name.clone()).collect();
        log::info!("Embedding index rebuilt with {} actions", self.names.len());
        Ok(())
    }

    /// Returns the name whose description embeds closest to `query`, or
    /// `None` when nothing is indexed.
    pub fn search(&self, query: &str) -> Result<Option<String>> {
        if self.names.is_empty() {
            log::debug!("Embedding search skipped: index is empty");
            return Ok(None);
        }

        let vector = self.encoder.encode(query)?;
        let Some(position) = self.index.nearest(&vector)? else {
            return Ok(None);
        };

        match self.names.get(position) {
            Some(name) => Ok(Some(name.clone())),
            None => {
                // A backend returning a position outside the name table means
                // the two went out of sync; answer from the names we hold
                // rather than failing the whole resolution.
                log::warn!(
                    "Index position {position} out of range for {} names, falling back to first",
                    self.names.len()
                );
                Ok(self.names.first().cloned())
            }
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{StubEncoder, MODEL_DIMENSION};
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<(String, String)> {
        vec![
            (
                "open_chrome".to_string(),
                "Launches the Google Chrome web browser".to_string(),
            ),
            (
                "open_calculator".to_string(),
                "Starts the system calculator application".to_string(),
            ),
        ]
    }

    #[test]
    fn search_prefers_overlapping_description() {
        let encoder = Arc::new(StubEncoder::new(MODEL_DIMENSION));
        let mut index = ActionIndex::new(encoder);
        index.rebuild(&catalog()).unwrap();

        let hit = index.search("Launch the Google Chrome web browser").unwrap();
        assert_eq!(hit, Some("open_chrome".to_string()));
    }

    #[test]
    fn empty_index_yields_no_match() {
        let encoder = Arc::new(StubEncoder::new(MODEL_DIMENSION));
        let mut index = ActionIndex::new(encoder);
        index.rebuild(&[]).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.search("anything at all").unwrap(), None);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let encoder = Arc::new(StubEncoder::new(MODEL_DIMENSION));
        let mut index = ActionIndex::new(encoder);

        index.rebuild(&catalog()).unwrap();
        let first = index.search("Launch the Google Chrome web browser").unwrap();

        index.rebuild(&catalog()).unwrap();
        let second = index.search("Launch the Google Chrome web browser").unwrap();

        assert_eq!(first, second);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn rebuild_replaces_catalog() {
        let encoder = Arc::new(StubEncoder::new(MODEL_DIMENSION));
        let mut index = ActionIndex::new(encoder);
        index.rebuild(&catalog()).unwrap();

        index
            .rebuild(&[(
                "get_cpu_usage".to_string(),
                "Measures and displays the current CPU utilization".to_string(),
            )])
            .unwrap();

        assert_eq!(index.names(), ["get_cpu_usage".to_string()]);
        assert_eq!(
            index.search("what is the cpu utilization right now").unwrap(),
            Some("get_cpu_usage".to_string())
        );
    }

    /// Backend double whose reported position never fits the name table.
    struct MisalignedIndex {
        dimension: usize,
        stored: usize,
    }

    impl NearestNeighborIndex for MisalignedIndex {
        fn dimension(&self) -> usize {
            self.dimension
        }

        fn rebuild(&mut self, vectors: Vec<Vec<f32>>) -> crate::Result<()> {
            self.stored = vectors.len();
            Ok(())
        }

        fn nearest(&self, _query: &[f32]) -> crate::Result<Option<usize>> {
            Ok(Some(self.stored + 1))
        }

        fn len(&self) -> usize {
            self.stored
        }
    }

    #[test]
    fn out_of_range_position_falls_back_to_first_name() {
        let encoder = Arc::new(StubEncoder::new(MODEL_DIMENSION));
        let backend = Box::new(MisalignedIndex {
            dimension: MODEL_DIMENSION,
            stored: 0,
        });
        let mut index = ActionIndex::with_backend(encoder, backend);
        index.rebuild(&catalog()).unwrap();

        let hit = index.search("anything").unwrap();
        assert_eq!(hit, Some("open_chrome".to_string()));
    }
}
