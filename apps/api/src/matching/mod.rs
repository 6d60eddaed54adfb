// Mentor matching: TF-IDF vector space, pluggable matcher trait, recommendation endpoint.
// The matcher never touches storage; handlers load the pool and pass it in.

pub mod handlers;
pub mod recommender;
pub mod tfidf;
