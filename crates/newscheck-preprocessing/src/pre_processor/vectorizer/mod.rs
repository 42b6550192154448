mod count_vectorizer;
mod ngrams;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

pub use params::VectorizerParams;
pub use tfidf_vectorizer::TfidfVectorizer;
pub use tokenizer::progress_bar_setup;
