//! Historical question → query pairs and TF-IDF nearest-neighbour retrieval.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_K: usize = 3;

static STOP_WORDS: LazyLock<HashSet<String>> =
    LazyLock::new(|| stop_words::get(stop_words::LANGUAGE::English).into_iter().collect());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExample {
    pub question: String,
    #[serde(alias = "query", alias = "cypher")]
    pub cypher_query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredExample<'a> {
    pub example: &'a QueryExample,
    pub similarity: f64,
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(*t))
        .map(str::to_string)
        .collect()
}

type SparseVector = HashMap<usize, f64>;

/// Examples indexed by their question text.
#[derive(Debug, Clone, Default)]
pub struct ExampleBank {
    examples: Vec<QueryExample>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl ExampleBank {
    pub fn new(examples: Vec<QueryExample>) -> Self {
        let docs: Vec<Vec<String>> = examples.iter().map(|e| tokenize(&e.question)).collect();

        let mut vocabulary = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for doc in &docs {
            let mut seen = HashSet::new();
            for term in doc {
                let next = vocabulary.len();
                let idx = *vocabulary.entry(term.clone()).or_insert(next);
                if idx == df.len() {
                    df.push(0);
                }
                if seen.insert(idx) {
                    df[idx] += 1;
                }
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut bank = Self {
            examples,
            vocabulary,
            idf,
            vectors: Vec::new(),
        };
        bank.vectors = docs.iter().map(|doc| bank.vectorize(doc)).collect();
        bank
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading query examples from {}", path.display()))?;
        let examples: Vec<QueryExample> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Self::new(examples))
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    fn vectorize(&self, terms: &[String]) -> SparseVector {
        let mut v = SparseVector::new();
        for term in terms {
            if let Some(&idx) = self.vocabulary.get(term) {
                *v.entry(idx).or_insert(0.0) += self.idf[idx];
            }
        }
        let norm = v.values().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            v.values_mut().for_each(|x| *x /= norm);
        }
        v
    }

    /// The `k` most similar examples, best first. Zero-similarity examples are dropped.
    pub fn most_similar(&self, question: &str, k: usize) -> Vec<ScoredExample<'_>> {
        let query = self.vectorize(&tokenize(question));
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredExample<'_>> = self
            .vectors
            .iter()
            .zip(&self.examples)
            .filter_map(|(vector, example)| {
                let similarity: f64 = query
                    .iter()
                    .filter_map(|(idx, q)| vector.get(idx).map(|d| q * d))
                    .sum();
                (similarity > 0.0).then_some(ScoredExample {
                    example,
                    similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        scored
    }
}
