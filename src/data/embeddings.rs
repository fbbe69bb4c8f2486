// ============================================================
// Layer 4 — Pre-trained Word Embeddings
// ============================================================
// Builds the initial embedding matrix for the classifier from a
// word2vec file, streaming it so only the rows of words in our
// vocabulary are ever kept in memory.
//
// Rows for words absent from the file start as uniform noise in
// [-0.25, 0.25]. Row 0 (<UNK>) is never overwritten.
//
// Supported formats:
//   binary (.bin)       "<count> <dim>\n" then, per word,
//                       "<word> " followed by dim little-endian f32
//   text   (.txt/.vec)  "<count> <dim>\n" then "<word> v1 ... vdim"
//
// Reference: Mikolov et al. (2013) word2vec
//            Kim (2014) Convolutional Neural Networks for Sentence Classification

use anyhow::{Context, Result};
use rand::{distributions::Uniform, Rng};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::data::vocab::{VocabularyProcessor, UNK_ID};

const INIT_RANGE: f32 = 0.25;

/// Dense `[vocab_size × dim]` matrix aligned with vocabulary indices.
#[derive(Debug, Clone)]
pub struct Embeddings {
    pub vocab_size: usize,
    pub dim:        usize,
    /// Row-major values, `vocab_size * dim` long
    pub values:     Vec<f32>,
}

impl Embeddings {
    /// Uniform random matrix in [-0.25, 0.25]
    pub fn random(vocab_size: usize, dim: usize, rng: &mut impl Rng) -> Self {
        let dist   = Uniform::new_inclusive(-INIT_RANGE, INIT_RANGE);
        let values = (0..vocab_size * dim).map(|_| rng.sample(dist)).collect();
        Self { vocab_size, dim, values }
    }

    fn set_row(&mut self, index: usize, row: &[f32]) {
        self.values[index * self.dim..(index + 1) * self.dim].copy_from_slice(row);
    }
}

/// Load the vectors of every vocabulary word found in `path`.
pub fn load_word2vec(
    path:  &Path,
    vocab: &VocabularyProcessor,
    dim:   usize,
    rng:   &mut impl Rng,
) -> Result<Embeddings> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open embedding file '{}'", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut embeddings = Embeddings::random(vocab.len(), dim, rng);

    let text_format = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("txt") | Some("vec")
    );

    let (count, file_dim) = read_header(&mut reader)
        .with_context(|| format!("Bad header in '{}'", path.display()))?;
    if file_dim != dim {
        anyhow::bail!(
            "Embedding file '{}' has dimension {}, expected {}",
            path.display(), file_dim, dim
        );
    }

    let found = if text_format {
        read_text_vectors(&mut reader, count, vocab, &mut embeddings)?
    } else {
        read_binary_vectors(&mut reader, count, vocab, &mut embeddings)?
    };

    tracing::info!(
        "Found {} of {} vocabulary words in '{}'",
        found, vocab.len(), path.display()
    );
    Ok(embeddings)
}

fn read_header(reader: &mut impl BufRead) -> Result<(usize, usize)> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let mut parts = header.split_whitespace();
    let count = parts.next().context("missing word count")?.parse()?;
    let dim   = parts.next().context("missing dimension")?.parse()?;
    Ok((count, dim))
}

/// Index of `word` when it should receive a pre-trained vector
fn target_row(vocab: &VocabularyProcessor, word: &str) -> Option<usize> {
    vocab.get(word).filter(|&id| id != UNK_ID).map(|id| id as usize)
}

fn read_binary_vectors(
    reader:     &mut impl BufRead,
    count:      usize,
    vocab:      &VocabularyProcessor,
    embeddings: &mut Embeddings,
) -> Result<usize> {
    let mut found  = 0;
    let mut word   = Vec::new();
    let mut buffer = vec![0u8; embeddings.dim * 4];
    let mut row    = vec![0f32; embeddings.dim];

    for i in 0..count {
        word.clear();
        reader
            .read_until(b' ', &mut word)
            .with_context(|| format!("Cannot read word {i}"))?;
        if word.last() != Some(&b' ') {
            anyhow::bail!("Embedding file truncated at word {} of {}", i, count);
        }
        word.pop();
        word.retain(|&b| b != b'\n');

        reader
            .read_exact(&mut buffer)
            .with_context(|| format!("Embedding file truncated in vector {i}"))?;

        let Some(index) = target_row(vocab, &String::from_utf8_lossy(&word)) else {
            continue;
        };
        for (value, bytes) in row.iter_mut().zip(buffer.chunks_exact(4)) {
            *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        embeddings.set_row(index, &row);
        found += 1;
    }

    Ok(found)
}

fn read_text_vectors(
    reader:     &mut impl BufRead,
    count:      usize,
    vocab:      &VocabularyProcessor,
    embeddings: &mut Embeddings,
) -> Result<usize> {
    let mut found = 0;
    let mut read  = 0;

    for (i, line) in reader.lines().take(count).enumerate() {
        let line      = line?;
        read += 1;
        let mut parts = line.split(' ').filter(|p| !p.is_empty());
        let Some(word) = parts.next() else { continue };
        let Some(index) = target_row(vocab, word) else { continue };

        let row = parts
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Bad vector on line {}", i + 2))?;
        if row.len() != embeddings.dim {
            anyhow::bail!("Vector for '{}' has {} values, expected {}", word, row.len(), embeddings.dim);
        }
        embeddings.set_row(index, &row);
        found += 1;
    }

    if read < count {
        anyhow::bail!("Embedding file truncated at word {} of {}", read, count);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::io::Write;
    use tempfile::tempdir;

    impl Embeddings {
        fn row(&self, index: usize) -> &[f32] {
            &self.values[index * self.dim..(index + 1) * self.dim]
        }
    }

    fn vocab() -> VocabularyProcessor {
        let mut vp = VocabularyProcessor::new(4);
        vp.fit(&["rocket orbit missing"]);
        vp
    }

    fn write_binary(path: &Path, entries: &[(&str, [f32; 2])]) {
        let mut f = File::create(path).unwrap();
        writeln!(f, "{} 2", entries.len()).unwrap();
        for (word, vector) in entries {
            f.write_all(word.as_bytes()).unwrap();
            f.write_all(b" ").unwrap();
            for v in vector {
                f.write_all(&v.to_le_bytes()).unwrap();
            }
            f.write_all(b"\n").unwrap();
        }
    }

    #[test]
    fn test_binary_vectors_land_on_vocab_rows() {
        let tmp  = tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");
        write_binary(&path, &[("orbit", [1.0, 2.0]), ("other", [9.0, 9.0]), ("rocket", [-1.0, 0.5])]);

        let vp  = vocab();
        let mut rng = StdRng::seed_from_u64(7);
        let emb = load_word2vec(&path, &vp, 2, &mut rng).unwrap();

        assert_eq!(emb.vocab_size, vp.len());
        assert_eq!(emb.row(vp.get("rocket").unwrap() as usize), &[-1.0, 0.5]);
        assert_eq!(emb.row(vp.get("orbit").unwrap() as usize), &[1.0, 2.0]);

        let missing = emb.row(vp.get("missing").unwrap() as usize);
        assert!(missing.iter().all(|v| v.abs() <= INIT_RANGE));
    }

    #[test]
    fn test_text_format() {
        let tmp  = tempdir().unwrap();
        let path = tmp.path().join("vectors.txt");
        fs_write(&path, "2 2\norbit 0.5 0.25\nunused 1 1\n");

        let vp  = vocab();
        let mut rng = StdRng::seed_from_u64(7);
        let emb = load_word2vec(&path, &vp, 2, &mut rng).unwrap();
        assert_eq!(emb.row(vp.get("orbit").unwrap() as usize), &[0.5, 0.25]);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let tmp  = tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");
        write_binary(&path, &[("orbit", [1.0, 2.0])]);

        let mut rng = StdRng::seed_from_u64(7);
        assert!(load_word2vec(&path, &vocab(), 3, &mut rng).is_err());
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let tmp  = tempdir().unwrap();
        let path = tmp.path().join("vectors.bin");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"1 2\norbit ").unwrap();
        f.write_all(&1.0f32.to_le_bytes()).unwrap();
        drop(f);

        let mut rng = StdRng::seed_from_u64(7);
        assert!(load_word2vec(&path, &vocab(), 2, &mut rng).is_err());
    }

    #[test]
    fn test_truncated_text_file_is_an_error() {
        let tmp  = tempdir().unwrap();
        let path = tmp.path().join("vectors.vec");
        fs_write(&path, "5 2\norbit 0.5 0.25\n");

        let mut rng = StdRng::seed_from_u64(7);
        let err = load_word2vec(&path, &vocab(), 2, &mut rng).unwrap_err();
        assert!(err.to_string().contains("truncated at word 1 of 5"));
    }

    fn fs_write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }
}
