use crate::error::{Result, VectorIndexError};
use ndarray::{Array, Axis, Ix2, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputs};
use ort::value::{DynTensor, Tensor};
use ort::Error as OrtError;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Output dimension of the sentence-embedding model (MiniLM class).
pub const MODEL_DIMENSION: usize = 384;

const MAX_SEQUENCE_LENGTH: usize = 512;
const MAX_BATCH: usize = 32;

/// Text-to-vector capability. Implementations are blocking; async callers
/// wrap calls in `spawn_blocking`.
pub trait Encoder: Send + Sync {
    /// Fixed dimension of every produced vector.
    fn dimension(&self) -> usize;

    /// Encodes a batch of texts into equal-length vectors, one per input,
    /// in input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let owned = [text.to_string()];
        let mut vectors = self.encode_batch(&owned)?;
        vectors
            .pop()
            .ok_or_else(|| VectorIndexError::Encoder("Empty encoder result".to_string()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncoderMode {
    Onnx,
    Stub,
}

impl EncoderMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            other => Err(VectorIndexError::Encoder(format!(
                "Unsupported DESKPILOT_EMBEDDING_MODE '{other}' (expected 'onnx' or 'stub')"
            ))),
        }
    }

    pub fn from_env() -> Result<Self> {
        match env::var("DESKPILOT_EMBEDDING_MODE") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::Onnx),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Stub => "stub",
        }
    }
}

/// Resolves the directory holding `model.onnx` and `tokenizer.json`.
///
/// Order: `DESKPILOT_MODEL_DIR`, a `models/` directory found by walking up
/// from the executable, the same walk from the current directory, then
/// `~/.cache/deskpilot/models`.
pub fn model_dir() -> PathBuf {
    if let Ok(path) = env::var("DESKPILOT_MODEL_DIR") {
        return PathBuf::from(path);
    }

    // A repo-local ./models next to the binary wins over hidden caches, so a
    // checkout keeps working from any working directory.
    if let Ok(exe) = env::current_exe() {
        if let Some(mut dir) = exe.parent().map(Path::to_path_buf) {
            loop {
                let candidate = dir.join("models");
                if candidate.join("model.onnx").exists() {
                    return candidate;
                }
                if !dir.pop() {
                    break;
                }
            }
        }
    }

    if let Ok(mut dir) = env::current_dir() {
        loop {
            let candidate = dir.join("models");
            if candidate.join("model.onnx").exists() {
                return candidate;
            }
            if !dir.pop() {
                break;
            }
        }
    }

    if let Ok(path) = env::var("XDG_CACHE_HOME") {
        return PathBuf::from(path).join("deskpilot").join("models");
    }
    env::var("HOME")
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
        .join(".cache")
        .join("deskpilot")
        .join("models")
}

/// Builds the encoder selected by `DESKPILOT_EMBEDDING_MODE` (`onnx` unless
/// overridden, `stub` for deterministic offline runs).
pub fn encoder_from_env() -> Result<Arc<dyn Encoder>> {
    build_encoder(EncoderMode::from_env()?, &model_dir())
}

pub fn build_encoder(mode: EncoderMode, model_dir: &Path) -> Result<Arc<dyn Encoder>> {
    match mode {
        EncoderMode::Onnx => Ok(Arc::new(OrtEncoder::load(model_dir)?)),
        EncoderMode::Stub => Ok(Arc::new(StubEncoder::new(MODEL_DIMENSION))),
    }
}

/// ONNX Runtime encoder for a MiniLM-class sentence-embedding model.
///
/// Expects `model.onnx` and `tokenizer.json` directly in the model
/// directory. Token embeddings are mean-pooled over the attention mask and
/// L2-normalized.
pub struct OrtEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OrtEncoder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        // Parallel tokenization buys little for catalog-sized batches and
        // makes runs nondeterministic under contention; stay single-threaded
        // unless the user opted in explicitly.
        if !tokenizers::utils::parallelism::is_parallelism_configured() {
            tokenizers::utils::parallelism::set_parallelism(false);
        }

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        if !model_path.exists() || !tokenizer_path.exists() {
            return Err(VectorIndexError::Encoder(format!(
                "Model files are missing. Expected ONNX at {} and tokenizer at {}. Place a MiniLM-class export there, or point DESKPILOT_MODEL_DIR at one.",
                model_path.display(),
                tokenizer_path.display(),
            )));
        }

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| VectorIndexError::Encoder(format!("Tokenizer load failed: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..TruncationParams::default()
            }))
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Tokenizer truncation failed: {e}"))
            })?;

        let (intra_threads, inter_threads) = default_ort_threads();
        let session = Session::builder()
            .map_err(|e| VectorIndexError::Encoder(format!("{e}")))?
            // Inference shares the machine with whatever the user is doing;
            // cap thread usage and disable busy-spinning.
            .with_intra_threads(intra_threads)
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Failed to set ORT intra threads: {e}"))
            })?
            .with_inter_threads(inter_threads)
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Failed to set ORT inter threads: {e}"))
            })?
            .with_intra_op_spinning(false)
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Failed to set ORT intra spinning: {e}"))
            })?
            .with_inter_op_spinning(false)
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Failed to set ORT inter spinning: {e}"))
            })?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| {
                VectorIndexError::Encoder(format!(
                    "Failed to register CPU execution provider: {e}"
                ))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                VectorIndexError::Encoder(format!("Failed to set optimization level: {e}"))
            })?
            .commit_from_file(&model_path)
            .map_err(|e| VectorIndexError::Encoder(format!("Failed to load ONNX model: {e}")))?;

        log::info!(
            "Loaded ONNX model from {} (dim {MODEL_DIMENSION}, max_length {MAX_SEQUENCE_LENGTH})",
            model_dir.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let encodings = self
                .tokenizer
                .encode_batch(batch.to_vec(), true)
                .map_err(|e| VectorIndexError::Encoder(format!("Tokenization failed: {e}")))?;

            if encodings.is_empty() {
                continue;
            }

            let seq_len = encodings[0].len();
            if seq_len > MAX_SEQUENCE_LENGTH {
                return Err(VectorIndexError::Encoder(format!(
                    "Tokenized length {seq_len} exceeds max_length {MAX_SEQUENCE_LENGTH}"
                )));
            }
            if encodings.iter().any(|e| e.len() != seq_len) {
                return Err(VectorIndexError::Encoder(
                    "Inconsistent sequence lengths after padding".to_string(),
                ));
            }
            let (ids, masks, type_ids, mask_rows) = build_flat_tensors(&encodings, seq_len);

            let ids_array = Array::from_shape_vec((batch.len(), seq_len), ids)
                .map_err(|e| VectorIndexError::Encoder(format!("IDs shape error: {e}")))?;
            let mask_array = Array::from_shape_vec((batch.len(), seq_len), masks)
                .map_err(|e| VectorIndexError::Encoder(format!("Mask shape error: {e}")))?;
            let type_array = Array::from_shape_vec((batch.len(), seq_len), type_ids)
                .map_err(|e| VectorIndexError::Encoder(format!("Types shape error: {e}")))?;

            let ids_tensor = Tensor::from_array(ids_array.into_dyn())
                .map_err(|e| to_encoder_error(&e))?
                .upcast();
            let mask_tensor = Tensor::from_array(mask_array.into_dyn())
                .map_err(|e| to_encoder_error(&e))?
                .upcast();
            let type_tensor = Tensor::from_array(type_array.into_dyn())
                .map_err(|e| to_encoder_error(&e))?
                .upcast();

            let array = {
                let mut session = self.session.lock().map_err(|_| {
                    VectorIndexError::Encoder("Failed to lock ONNX session".into())
                })?;

                let mut available: HashMap<String, DynTensor> = HashMap::new();
                available.insert("input_ids".to_string(), ids_tensor);
                available.insert("attention_mask".to_string(), mask_tensor);
                available.insert("token_type_ids".to_string(), type_tensor);

                let mut feed: HashMap<String, DynTensor> = HashMap::new();
                for input in &session.inputs {
                    let key = input.name.clone();
                    let Some(value) = available.get(&key) else {
                        return Err(VectorIndexError::Encoder(format!(
                            "Unsupported ONNX input '{key}'"
                        )));
                    };
                    feed.insert(key, value.clone());
                }

                let outputs = session.run(SessionInputs::from(feed)).map_err(|e| {
                    VectorIndexError::Encoder(format!("ONNX forward failed: {e}"))
                })?;

                if outputs.len() == 0 {
                    return Err(VectorIndexError::Encoder(
                        "ONNX returned no outputs".to_string(),
                    ));
                }

                let array = outputs[0]
                    .try_extract_array::<f32>()
                    .map_err(|e| {
                        VectorIndexError::Encoder(format!("Failed to decode ONNX output: {e}"))
                    })?
                    .to_owned();

                drop(outputs);
                drop(session);

                array
            };
            results.extend(embeddings_from_output(array, &mask_rows, MODEL_DIMENSION)?);
        }

        Ok(results)
    }
}

impl Encoder for OrtEncoder {
    fn dimension(&self) -> usize {
        MODEL_DIMENSION
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch_blocking(texts)
    }
}

/// Deterministic hash-based encoder for tests and offline runs.
///
/// Each token maps to a fixed pseudo-random direction and the text embeds as
/// the normalized sum, so texts sharing tokens land near each other without
/// any model files on disk.
#[derive(Clone, Debug)]
pub struct StubEncoder {
    dimension: usize,
}

impl StubEncoder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Encoder for StubEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

fn default_ort_threads() -> (usize, usize) {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let intra_threads = if cpus <= 4 {
        1
    } else if cpus <= 12 {
        2
    } else if cpus <= 24 {
        3
    } else {
        4
    };

    // Sequential execution mode; keep inter-op conservative.
    (intra_threads.max(1), 1)
}

const fn ensure_dimension(vec: &[f32], expected: usize) -> Result<()> {
    if vec.len() != expected {
        return Err(VectorIndexError::InvalidDimension {
            expected,
            actual: vec.len(),
        });
    }
    Ok(())
}

fn embeddings_from_output(
    array: ndarray::ArrayD<f32>,
    mask_rows: &[Vec<i64>],
    expected_dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut out = Vec::new();
    match array.ndim() {
        2 => {
            let embeddings = array
                .into_dimensionality::<Ix2>()
                .map_err(|e| VectorIndexError::Encoder(format!("Bad output shape: {e}")))?;
            out.reserve(embeddings.len_of(Axis(0)));
            for row in embeddings.outer_iter() {
                let mut emb = row.to_owned().to_vec();
                ensure_dimension(&emb, expected_dimension)?;
                normalize(&mut emb);
                out.push(emb);
            }
        }
        3 => {
            let hidden = array
                .into_dimensionality::<Ix3>()
                .map_err(|e| VectorIndexError::Encoder(format!("Bad output shape: {e}")))?;
            out.reserve(hidden.len_of(Axis(0)));
            for (idx, sample) in hidden.outer_iter().enumerate() {
                let attn = mask_rows
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| vec![1; sample.len_of(Axis(0))]);
                let mut emb = mean_pool(sample.view(), &attn);
                ensure_dimension(&emb, expected_dimension)?;
                normalize(&mut emb);
                out.push(emb);
            }
        }
        _ => {
            return Err(VectorIndexError::Encoder(format!(
                "Unexpected ONNX output dims: {:?}",
                array.shape()
            )));
        }
    }
    Ok(out)
}

fn mean_pool(sample: ndarray::ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    if sample.is_empty() {
        return vec![];
    }

    let hidden = sample.len_of(Axis(1));
    let mut sum = vec![0.0f32; hidden];
    let mut count = 0.0f32;

    for (token_idx, token) in sample.outer_iter().enumerate() {
        if *mask.get(token_idx).unwrap_or(&0) == 0 {
            continue;
        }
        count += 1.0;
        for (dim, value) in token.iter().enumerate() {
            sum[dim] += value;
        }
    }

    if count == 0.0 {
        return sum;
    }

    for value in &mut sum {
        *value /= count;
    }

    sum
}

fn build_flat_tensors(
    encodings: &[Encoding],
    seq_len: usize,
) -> (Vec<i64>, Vec<i64>, Vec<i64>, Vec<Vec<i64>>) {
    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut masks = Vec::with_capacity(encodings.len() * seq_len);
    let mut type_ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut mask_rows = Vec::with_capacity(encodings.len());

    for encoding in encodings {
        let encoding_ids = encoding.get_ids();
        let encoding_masks = encoding.get_attention_mask();
        let encoding_types = encoding.get_type_ids();

        for idx in 0..seq_len {
            ids.push(i64::from(*encoding_ids.get(idx).unwrap_or(&0)));
            masks.push(i64::from(*encoding_masks.get(idx).unwrap_or(&0)));
            type_ids.push(i64::from(*encoding_types.get(idx).unwrap_or(&0)));
        }

        mask_rows.push(
            encoding_masks
                .iter()
                .take(seq_len)
                .map(|v| i64::from(*v))
                .collect(),
        );
    }

    (ids, masks, type_ids, mask_rows)
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let lowered = text.to_ascii_lowercase();
    let mut acc = vec![0.0f32; dimension];
    let mut tokens = 0usize;
    for token in lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        accumulate_direction(&mut acc, token.as_bytes());
        tokens += 1;
    }
    if tokens == 0 {
        accumulate_direction(&mut acc, lowered.as_bytes());
    }
    normalize(&mut acc);
    acc
}

fn accumulate_direction(acc: &mut [f32], bytes: &[u8]) {
    let mut state = fnv1a_64(bytes) ^ (acc.len() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for slot in acc.iter_mut() {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        *slot += unit.mul_add(2.0, -1.0);
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn to_encoder_error(error: &OrtError) -> VectorIndexError {
    VectorIndexError::Encoder(format!("{error}"))
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
