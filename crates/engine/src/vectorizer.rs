//! Text vectorization for content-based recommendations.
//!
//! The content strategy only depends on the [`TextVectorizer`] trait. The
//! bundled [`TfidfVectorizer`] follows the usual TF-IDF conventions:
//! - lowercase, tokens are runs of 2+ alphanumeric characters
//! - scikit-learn's English stop-words removed
//! - smoothed idf: `ln((1 + n) / (1 + df)) + 1`
//! - raw term counts times idf, each row L2-normalized
//! - vocabulary sorted alphabetically

use ndarray::Array2;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Weighted term matrix: one row per document, one column per vocabulary term
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatrix {
    pub vocabulary: Vec<String>,
    pub weights: Array2<f64>,
}

impl TermMatrix {
    pub fn documents(&self) -> usize {
        self.weights.nrows()
    }

    pub fn terms(&self) -> usize {
        self.weights.ncols()
    }
}

/// Turns a corpus into a document × term weight matrix
pub trait TextVectorizer: Send + Sync {
    fn fit_transform(&self, corpus: &[String]) -> TermMatrix;
}

/// scikit-learn's `ENGLISH_STOP_WORDS`
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot",
    "cant", "co", "computer", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however",
    "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its",
    "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly", "move",
    "much", "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next",
    "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus", "to",
    "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under",
    "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

/// TF-IDF vectorizer with English stop-words
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stop_words: HashSet<String>,
    min_token_len: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            min_token_len: 2,
        }
    }

    /// Replace the stop-word list
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !self.stop_words.contains(*token))
            .map(|token| token.to_string())
            .collect()
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn fit_transform(&self, corpus: &[String]) -> TermMatrix {
        let documents: Vec<Vec<String>> = corpus.iter().map(|doc| self.tokenize(doc)).collect();

        // Sorted vocabulary with document frequencies
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &documents {
            let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
            for token in unique {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let vocabulary: Vec<String> = document_frequency.keys().map(|t| t.to_string()).collect();
        let columns: HashMap<&str, usize> = document_frequency
            .keys()
            .enumerate()
            .map(|(column, term)| (*term, column))
            .collect();

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut weights = Array2::<f64>::zeros((documents.len(), vocabulary.len()));
        for (row, tokens) in documents.iter().enumerate() {
            for token in tokens {
                weights[[row, columns[token.as_str()]]] += 1.0;
            }

            let mut doc = weights.row_mut(row);
            for (column, weight) in doc.iter_mut().enumerate() {
                *weight *= idf[column];
            }
            let norm = doc.dot(&doc).sqrt();
            if norm > 0.0 {
                doc /= norm;
            }
        }

        TermMatrix { vocabulary, weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[&str]) -> Vec<String> {
        docs.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_tokenize() {
        let vectorizer = TfidfVectorizer::new();
        assert_eq!(
            vectorizer.tokenize("Adventure Children's Sci-Fi"),
            vec!["adventure", "children", "sci", "fi"]
        );
        assert_eq!(vectorizer.tokenize("The Lord of a Ring"), vec!["lord", "ring"]);
    }

    #[test]
    fn test_tokenize_drops_english_stop_words() {
        let vectorizer = TfidfVectorizer::new();
        assert_eq!(
            vectorizer.tokenize("Bill Bryson|Oscar de la Hoya|Fire System Call Find First Two Computer"),
            vec!["bryson", "oscar", "la", "hoya"]
        );
        // Author tags keep their surnames
        assert_eq!(vectorizer.tokenize("Thomas Mann"), vec!["thomas", "mann"]);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let matrix = TfidfVectorizer::new().fit_transform(&corpus(&["drama comedy", "action drama"]));
        assert_eq!(matrix.vocabulary, vec!["action", "comedy", "drama"]);
        assert_eq!(matrix.documents(), 2);
        assert_eq!(matrix.terms(), 3);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let matrix = TfidfVectorizer::new().fit_transform(&corpus(&["drama comedy", "action drama", "western"]));
        for row in matrix.weights.rows() {
            assert!((row.dot(&row).sqrt() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let matrix = TfidfVectorizer::new().fit_transform(&corpus(&["drama comedy", "action drama"]));
        // Row 0: "comedy" (df 1) outweighs "drama" (df 2)
        assert!(matrix.weights[[0, 1]] > matrix.weights[[0, 2]]);
        assert_eq!(matrix.weights[[0, 0]], 0.0);
    }

    #[test]
    fn test_empty_document_is_zero_row() {
        let matrix = TfidfVectorizer::new().fit_transform(&corpus(&["drama", "the"]));
        assert_eq!(matrix.weights.row(1).sum(), 0.0);
    }
}
