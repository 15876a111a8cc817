//! Word vectors and idf weights of the knowledge-base snapshot.
//!
//! The embedding model is memory-mapped and decoded once into a single
//! row-major `f32` matrix, so a term lookup is one hash probe plus a slice.
//!
//! # Model formats
//!
//! - **Text** (word2vec): optional `<count> <dim>` header line, then
//!   `term v1 v2 ... vD` per line.
//! - **Binary** (word2vec): `<count> <dim>\n` header, then for every entry the
//!   term, one space, and D little-endian `f32` values (an optional newline
//!   may separate entries).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::config::EmbeddingFormat;
use crate::error::{LoadError, LoadResult};

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Dense word vectors keyed by term.
#[derive(Debug, Default)]
pub struct WordVectors {
    dimension: usize,
    rows: HashMap<String, u32>,
    data: Vec<f32>,
}

impl WordVectors {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Append a vector. The first occurrence of a term wins.
    ///
    /// Returns the offending length when `vector` does not match the model dimension.
    pub fn insert(&mut self, term: impl Into<String>, vector: &[f32]) -> Result<(), usize> {
        if vector.len() != self.dimension {
            return Err(vector.len());
        }
        let row = self.rows.len() as u32;
        if let std::collections::hash_map::Entry::Vacant(slot) = self.rows.entry(term.into()) {
            slot.insert(row);
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    pub fn get(&self, term: &str) -> Option<&[f32]> {
        let row = *self.rows.get(term)? as usize;
        let start = row * self.dimension;
        self.data.get(start..start + self.dimension)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Process-wide cache of word vectors and idf weights.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct EmbeddingStore {
    vectors: WordVectors,
    idf: HashMap<String, f32>,
    default_idf: f32,
}

impl EmbeddingStore {
    /// Assemble a store from already decoded parts.
    ///
    /// `default_idf` is the weight of terms missing from `idf`; when `None` the
    /// smallest weight in the table is used (0.0 for an empty table).
    pub fn new(vectors: WordVectors, idf: HashMap<String, f32>, default_idf: Option<f32>) -> Self {
        let default_idf = default_idf.unwrap_or_else(|| {
            idf.values()
                .copied()
                .filter(|w| w.is_finite())
                .reduce(f32::min)
                .unwrap_or(0.0)
        });
        Self {
            vectors,
            idf,
            default_idf,
        }
    }

    /// Load the embedding model and idf table from disk.
    pub fn load(
        embeddings: &Path,
        format: EmbeddingFormat,
        idf: &Path,
        default_idf: Option<f32>,
    ) -> LoadResult<Self> {
        let vectors = match format {
            EmbeddingFormat::Text => read_word2vec_text(embeddings)?,
            EmbeddingFormat::Binary => read_word2vec_binary(embeddings)?,
        };
        let idf = read_idf_table(idf)?;
        Ok(Self::new(vectors, idf, default_idf))
    }

    /// Word vector of `term`, absent for out-of-vocabulary terms.
    pub fn vector_of(&self, term: &str) -> Option<&[f32]> {
        self.vectors.get(term)
    }

    /// Idf weight of `term`, falling back to the default floor for unseen terms.
    pub fn idf_of(&self, term: &str) -> f32 {
        self.idf.get(term).copied().unwrap_or(self.default_idf)
    }

    /// Terms present in the idf table.
    pub fn idf_terms(&self) -> impl Iterator<Item = &str> {
        self.idf.keys().map(String::as_str)
    }

    pub fn default_idf(&self) -> f32 {
        self.default_idf
    }

    /// Dimensionality shared by every vector in the system.
    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }

    pub fn idf_size(&self) -> usize {
        self.idf.len()
    }
}

fn map_file(path: &Path) -> LoadResult<Mmap> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let len = file.metadata().map_err(|e| LoadError::io(path, e))?.len();
    if len == 0 {
        return Err(LoadError::EmptyModel {
            path: path.to_path_buf(),
        });
    }
    // The snapshot is treated as read-only for the lifetime of the mapping.
    unsafe { MmapOptions::new().map(&file) }.map_err(|e| LoadError::io(path, e))
}

fn corrupt(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse a `<count> <dim>` header line.
fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let count = parts.next()?.parse().ok()?;
    let dimension = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((count, dimension))
}

/// Read a word2vec text model.
pub fn read_word2vec_text(path: &Path) -> LoadResult<WordVectors> {
    let mmap = map_file(path)?;
    let mut vectors: Option<WordVectors> = None;
    let mut row = Vec::new();

    for (line_no, raw) in mmap.split(|&b| b == b'\n').enumerate() {
        let line = std::str::from_utf8(raw)
            .map_err(|_| corrupt(path, format!("line {} is not valid UTF-8", line_no + 1)))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line_no == 0 {
            if let Some((_, dimension)) = parse_header(line) {
                if dimension == 0 {
                    return Err(corrupt(path, "header declares dimension 0"));
                }
                vectors = Some(WordVectors::new(dimension));
                continue;
            }
        }

        let mut parts = line.split_whitespace();
        let Some(term) = parts.next() else { continue };
        row.clear();
        for value in parts {
            let value: f32 = value.parse().map_err(|_| {
                corrupt(path, format!("line {}: '{value}' is not a number", line_no + 1))
            })?;
            row.push(value);
        }
        if row.is_empty() {
            return Err(corrupt(path, format!("line {} has no vector values", line_no + 1)));
        }

        let vectors = vectors.get_or_insert_with(|| WordVectors::new(row.len()));
        vectors
            .insert(term, &row)
            .map_err(|actual| LoadError::DimensionMismatch {
                path: path.to_path_buf(),
                entry: line_no + 1,
                expected: vectors.dimension(),
                actual,
            })?;
    }

    match vectors {
        Some(vectors) if !vectors.is_empty() => Ok(vectors),
        _ => Err(LoadError::EmptyModel {
            path: path.to_path_buf(),
        }),
    }
}

/// Read a word2vec binary model.
pub fn read_word2vec_binary(path: &Path) -> LoadResult<WordVectors> {
    let mmap = map_file(path)?;
    let bytes: &[u8] = &mmap;

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| corrupt(path, "missing header line"))?;
    let header = std::str::from_utf8(&bytes[..header_end])
        .map_err(|_| corrupt(path, "header is not valid UTF-8"))?;
    let (count, dimension) =
        parse_header(header).ok_or_else(|| corrupt(path, format!("invalid header '{header}'")))?;
    if dimension == 0 {
        return Err(corrupt(path, "header declares dimension 0"));
    }

    let mut vectors = WordVectors::new(dimension);
    let mut row = vec![0.0f32; dimension];
    let vector_bytes = dimension * BYTES_PER_F32;
    let mut offset = header_end + 1;

    for entry in 0..count {
        while offset < bytes.len() && bytes[offset].is_ascii_whitespace() {
            offset += 1;
        }
        let term_len = bytes[offset..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| corrupt(path, format!("entry {entry}: truncated term")))?;
        let term = std::str::from_utf8(&bytes[offset..offset + term_len])
            .map_err(|_| corrupt(path, format!("entry {entry}: term is not valid UTF-8")))?;
        offset += term_len + 1;

        let data = bytes
            .get(offset..offset + vector_bytes)
            .ok_or_else(|| corrupt(path, format!("entry {entry}: truncated vector")))?;
        for (value, chunk) in row.iter_mut().zip(data.chunks_exact(BYTES_PER_F32)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        offset += vector_bytes;

        // Rows are always `dimension` long here, so insert cannot fail
        let _ = vectors.insert(term, &row);
    }

    if vectors.is_empty() {
        return Err(LoadError::EmptyModel {
            path: path.to_path_buf(),
        });
    }
    Ok(vectors)
}

/// Read the idf table: a JSON object of term -> weight.
pub fn read_idf_table(path: &Path) -> LoadResult<HashMap<String, f32>> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| corrupt(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn sample_vectors() -> WordVectors {
        let mut vectors = WordVectors::new(3);
        vectors.insert("string", &[1.0, 0.0, 0.0]).unwrap();
        vectors.insert("int", &[0.0, 1.0, 0.0]).unwrap();
        vectors
    }

    #[test]
    fn test_vector_lookup_and_oov() {
        let store = EmbeddingStore::new(sample_vectors(), HashMap::new(), None);
        assert_eq!(store.vector_of("int"), Some(&[0.0, 1.0, 0.0][..]));
        assert!(store.vector_of("zzyzx").is_none());
        assert_eq!(store.dimension(), 3);
        assert_eq!(store.vocabulary_size(), 2);
    }

    #[test]
    fn test_first_occurrence_wins_and_dimension_checked() {
        let mut vectors = sample_vectors();
        vectors.insert("string", &[9.0, 9.0, 9.0]).unwrap();
        assert_eq!(vectors.get("string"), Some(&[1.0, 0.0, 0.0][..]));
        assert_eq!(vectors.insert("bad", &[1.0]), Err(1));
    }

    #[test]
    fn test_idf_default_floor() {
        let idf = HashMap::from([("java".to_string(), 0.5), ("parseint".to_string(), 7.0)]);
        let store = EmbeddingStore::new(WordVectors::new(3), idf.clone(), None);
        assert_eq!(store.idf_of("parseint"), 7.0);
        assert_eq!(store.idf_of("unseen"), 0.5);

        let store = EmbeddingStore::new(WordVectors::new(3), idf, Some(2.0));
        assert_eq!(store.idf_of("unseen"), 2.0);

        let store = EmbeddingStore::new(WordVectors::new(3), HashMap::new(), None);
        assert_eq!(store.idf_of("anything"), 0.0);
    }

    #[test]
    fn test_read_text_model_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "2 3\nstring 1 0 0\nint 0 1 0.5\n").unwrap();

        let vectors = read_word2vec_text(&path).unwrap();
        assert_eq!(vectors.dimension(), 3);
        assert_eq!(vectors.get("int"), Some(&[0.0, 1.0, 0.5][..]));
    }

    #[test]
    fn test_read_text_model_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "string 1 0\n\nint 0 1\n").unwrap();

        let vectors = read_word2vec_text(&path).unwrap();
        assert_eq!(vectors.dimension(), 2);
        assert_eq!(vectors.len(), 2);
    }

    #[test]
    fn test_read_text_model_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "string 1 0 0\nint 0 1\n").unwrap();

        let err = read_word2vec_text(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_read_text_model_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "string 1 zero 0\n").unwrap();
        assert!(matches!(
            read_word2vec_text(&path).unwrap_err(),
            LoadError::Corrupt { .. }
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            read_word2vec_text(&empty).unwrap_err(),
            LoadError::EmptyModel { .. }
        ));
    }

    #[test]
    fn test_read_binary_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"2 2\n").unwrap();
        for (term, values) in [("string", [1.0f32, 0.0]), ("int", [0.25f32, -1.0])] {
            file.write_all(term.as_bytes()).unwrap();
            file.write_all(b" ").unwrap();
            for v in values {
                file.write_all(&v.to_le_bytes()).unwrap();
            }
            file.write_all(b"\n").unwrap();
        }
        drop(file);

        let vectors = read_word2vec_binary(&path).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.get("int"), Some(&[0.25, -1.0][..]));
    }

    #[test]
    fn test_read_binary_model_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut bytes = b"1 4\nword ".to_vec();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_word2vec_binary(&path).unwrap_err(),
            LoadError::Corrupt { .. }
        ));
    }

    #[test]
    fn test_missing_artifacts() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            read_idf_table(&missing).unwrap_err(),
            LoadError::MissingArtifact { .. }
        ));
        assert!(matches!(
            read_word2vec_text(&missing).unwrap_err(),
            LoadError::MissingArtifact { .. }
        ));
    }

    #[test]
    fn test_read_idf_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idf.json");
        std::fs::write(&path, r#"{"java": 0.5, "pars": 6.25}"#).unwrap();
        let idf = read_idf_table(&path).unwrap();
        assert_eq!(idf["pars"], 6.25);

        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            read_idf_table(&path).unwrap_err(),
            LoadError::Corrupt { .. }
        ));
    }
}
