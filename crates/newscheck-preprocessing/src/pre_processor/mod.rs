mod normalize;
mod vectorizer;

pub use normalize::{MIN_TOKEN_CHARS, is_stopword, preprocess_text};
pub use vectorizer::{TfidfVectorizer, VectorizerParams, progress_bar_setup};
