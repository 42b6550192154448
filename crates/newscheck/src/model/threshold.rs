/// Default classification threshold between 0.0 and 1.0.
///
/// If P(real) > threshold, the text is classified as real news.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;
