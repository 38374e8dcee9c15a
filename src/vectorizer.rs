//! TF-IDF feature space fitted over short catalog labels.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Tokens shorter than this many characters are discarded.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Common English function words dropped during tokenization.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
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
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout", "thru",
    "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
];

/// Lower-cases `text`, splits on non-alphanumeric characters and drops stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Sparse vector of `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    fn from_map(weights: BTreeMap<usize, f32>) -> Self {
        Self {
            entries: weights.into_iter().filter(|(_, w)| *w > 0.0).collect(),
        }
    }

    /// Non-zero entries in column order.
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    /// True when every weight is zero.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product with another sparse vector.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.entries.len() && j < other.entries.len() {
            let (left_col, left_w) = self.entries[i];
            let (right_col, right_w) = other.entries[j];
            match left_col.cmp(&right_col) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += left_w * right_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, weight) in &mut self.entries {
                *weight /= norm;
            }
        }
    }
}

/// Vocabulary, IDF weights and document vectors for one fitted corpus.
///
/// Columns are assigned in lexicographic token order so that identical corpora
/// always produce identical spaces. IDF uses the smoothed form
/// `ln((1 + n) / (1 + df)) + 1`; vectors are L2-normalised.
#[derive(Debug, Clone, Default)]
pub struct FeatureSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    documents: Vec<SparseVector>,
}

impl FeatureSpace {
    /// Fits a feature space over `corpus`; document `i` keeps index `i`.
    pub fn fit<S: AsRef<str>>(corpus: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|doc| tokenize(doc.as_ref())).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (column, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), column);
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
        }

        let mut space = Self {
            vocabulary,
            idf,
            documents: Vec::new(),
        };
        let documents = tokenized.iter().map(|tokens| space.weigh(tokens)).collect();
        space.documents = documents;
        space
    }

    /// Projects `text` into the fitted vocabulary; unknown tokens are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&tokenize(text))
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut weights: BTreeMap<usize, f32> = BTreeMap::new();
        for token in tokens {
            if let Some(&column) = self.vocabulary.get(token) {
                *weights.entry(column).or_insert(0.0) += 1.0;
            }
        }
        for (column, weight) in weights.iter_mut() {
            *weight *= self.idf[*column];
        }
        let mut vector = SparseVector::from_map(weights);
        vector.normalize();
        vector
    }

    /// Fitted document vectors, index-aligned with the corpus.
    pub fn documents(&self) -> &[SparseVector] {
        &self.documents
    }

    /// Number of vocabulary columns.
    pub fn dimensions(&self) -> usize {
        self.idf.len()
    }

    /// Column assigned to `token`, if it is in the vocabulary.
    pub fn column(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }
}
