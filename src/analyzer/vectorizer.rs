use crate::model::{ClusterError, FeatureMatrix};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const DEFAULT_MAX_FEATURES: usize = 1000;

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyone", "anything", "anywhere", "are", "around", "as", "at", "be", "became", "because",
    "been", "before", "being", "below", "between", "both", "but", "by", "can", "cannot", "could",
    "did", "do", "does", "doing", "done", "down", "during", "each", "either", "else", "enough",
    "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "however",
    "i", "ie", "if", "in", "into", "is", "it", "its", "itself", "just", "least", "less", "many",
    "may", "me", "might", "more", "most", "much", "must", "my", "myself", "neither", "never",
    "no", "nor", "not", "nothing", "now", "of", "off", "often", "on", "once", "one", "only",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "per", "perhaps", "rather", "same", "she", "should", "since", "so", "some", "still", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "though", "through", "thus", "to", "too", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "when", "where", "whether",
    "which", "while", "who", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Lowercased word tokens of two or more characters, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !is_stopword(t))
        .collect()
}

/// TF-IDF vectorizer over a vocabulary capped at `max_features` terms.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    max_features: usize,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl Vectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Vectorizes `documents`. Rows are L2-normalized; an all-empty corpus
    /// gives an empty vocabulary and zero-width rows.
    pub fn vectorize(&self, documents: &[String]) -> Result<FeatureMatrix, ClusterError> {
        if documents.is_empty() {
            return Err(ClusterError::InvalidInput("no documents to vectorize".into()));
        }
        if self.max_features == 0 {
            return Err(ClusterError::InvalidInput("max_features must be positive".into()));
        }

        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
        let vocabulary = self.build_vocabulary(&tokenized);
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        let mut counts: Vec<HashMap<usize, f64>> = Vec::with_capacity(tokenized.len());
        for tokens in &tokenized {
            let mut tf: HashMap<usize, f64> = HashMap::new();
            for token in tokens {
                if let Some(&col) = index.get(token.as_str()) {
                    *tf.entry(col).or_default() += 1.0;
                }
            }
            for &col in tf.keys() {
                doc_freq[col] += 1;
            }
            counts.push(tf);
        }

        let n_docs = documents.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut row = vec![0.0; vocabulary.len()];
                for (col, count) in tf {
                    row[col] = count * idf[col];
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        Ok(FeatureMatrix { rows, vocabulary })
    }

    /// Keeps the most frequent corpus terms, then orders them alphabetically.
    fn build_vocabulary(&self, tokenized: &[Vec<String>]) -> Vec<String> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for tokens in tokenized {
            for token in tokens {
                *totals.entry(token.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        vocabulary
    }
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        row.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Highest mean-weight terms among the rows labelled `cluster`.
pub fn top_terms(matrix: &FeatureMatrix, labels: &[usize], cluster: usize, n: usize) -> Vec<String> {
    let members: Vec<&Vec<f64>> = matrix
        .rows
        .iter()
        .zip(labels)
        .filter(|(_, label)| **label == cluster)
        .map(|(row, _)| row)
        .collect();
    if members.is_empty() {
        return Vec::new();
    }

    let mut weights = vec![0.0; matrix.width()];
    for row in &members {
        for (w, v) in weights.iter_mut().zip(row.iter()) {
            *w += v;
        }
    }

    let mut ranked: Vec<(usize, f64)> = weights
        .into_iter()
        .enumerate()
        .filter(|(_, w)| *w > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(col, _)| matrix.vocabulary[col].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn weight(matrix: &FeatureMatrix, row: usize, term: &str) -> f64 {
        let col = matrix.vocabulary.iter().position(|t| t == term).unwrap();
        matrix.rows[row][col]
    }

    #[test]
    fn tokenizer_lowercases_and_drops_stopwords() {
        assert_eq!(tokenize("Crash on BOOT, the kernel-panic!"), vec!["crash", "boot", "kernel", "panic"]);
        assert!(tokenize("a I x").is_empty());
    }

    #[test]
    fn vocabulary_is_capped() {
        let corpus = docs(&["alpha beta gamma delta", "alpha beta epsilon", "alpha zeta"]);
        let matrix = Vectorizer::new(2).vectorize(&corpus).unwrap();
        assert_eq!(matrix.vocabulary, vec!["alpha", "beta"]);
        assert!(matrix.rows.iter().all(|r| r.len() == 2));
        assert_eq!(matrix.rows[2][1], 0.0);
    }

    #[test]
    fn column_count_never_exceeds_cap() {
        let corpus = docs(&["one two three four five six seven eight nine ten"]);
        for cap in [1, 3, 5, 1000] {
            let matrix = Vectorizer::new(cap).vectorize(&corpus).unwrap();
            assert!(matrix.width() <= cap);
        }
    }

    #[test]
    fn empty_corpus_gives_zero_rows() {
        let matrix = Vectorizer::default().vectorize(&docs(&["", "the and of", ""])).unwrap();
        assert!(matrix.vocabulary.is_empty());
        assert_eq!(matrix.rows.len(), 3);
        assert!(matrix.rows.iter().all(|r| r.iter().all(|v| *v == 0.0)));
    }

    #[test]
    fn no_documents_is_invalid() {
        let err = Vectorizer::default().vectorize(&[]).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let matrix = Vectorizer::default().vectorize(&docs(&["crash boot", "crash freeze"])).unwrap();
        assert!(weight(&matrix, 0, "boot") > weight(&matrix, 0, "crash"));
        assert_eq!(weight(&matrix, 0, "freeze"), 0.0);
    }

    #[test]
    fn repeated_terms_weigh_more() {
        let matrix = Vectorizer::default()
            .vectorize(&docs(&["crash crash boot", "freeze boot"]))
            .unwrap();
        assert!(weight(&matrix, 0, "crash") > weight(&matrix, 0, "boot"));
    }

    #[test]
    fn rows_have_unit_length() {
        let matrix = Vectorizer::default().vectorize(&docs(&["disk full error", "error"])).unwrap();
        for row in &matrix.rows {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn top_terms_follow_cluster_members() {
        let matrix = Vectorizer::default()
            .vectorize(&docs(&["crash boot", "crash kernel", "wifi drop"]))
            .unwrap();
        let labels = [0, 0, 1];
        assert_eq!(top_terms(&matrix, &labels, 0, 1), vec!["crash"]);
        let second = top_terms(&matrix, &labels, 1, 5);
        assert_eq!(second, vec!["drop", "wifi"]);
        assert!(top_terms(&matrix, &labels, 2, 5).is_empty());
    }
}
