// Built-in bootstrap training set
//
// A placeholder so a fresh deployment has *some* model to serve. These are
// URL patterns, not real threat data, and say nothing about detection
// accuracy. Replace with a real labelled corpus for any serious use.

use tracing::warn;

use crate::models::{Label, TrainingExample};
use crate::services::feature_extractor::UrlFeatureExtractor;

pub const SEED_BENIGN_URLS: &[&str] = &[
    "https://www.google.com",
    "https://www.github.com",
    "https://www.stackoverflow.com",
    "https://www.wikipedia.org",
    "https://www.microsoft.com",
    "https://www.apple.com",
    "https://www.amazon.com",
    "https://www.netflix.com",
    "https://www.spotify.com",
    "https://www.youtube.com",
];

pub const SEED_MALICIOUS_URLS: &[&str] = &[
    "http://malware.example.tk/login/secure/bank/verify",
    "http://phishing.xyz.com/update/account/password",
    "http://scam.ga.com/credit/card/secure",
    "http://fake.cf.com/paypal/ebay/amazon",
    "http://suspicious.ml.com/google/facebook/twitter",
    "http://dangerous.gq.com/instagram/youtube/netflix",
    "http://malicious.top.com/spotify/account/verify",
    "http://harmful.club.com/login/signin/secure",
    "http://risky.online.com/bank/credit/update",
    "http://threat.xyz.com/password/account/secure",
];

/// Labelled (url, label) pairs of the seed set, benign first
pub fn seed_urls() -> impl Iterator<Item = (&'static str, Label)> {
    SEED_BENIGN_URLS
        .iter()
        .map(|url| (*url, Label::Benign))
        .chain(SEED_MALICIOUS_URLS.iter().map(|url| (*url, Label::Malicious)))
}

/// Vectorize the seed set. URLs the extractor rejects are skipped.
pub fn seed_training_set(extractor: &UrlFeatureExtractor) -> Vec<TrainingExample> {
    seed_urls()
        .filter_map(|(url, label)| match extractor.extract(url) {
            Ok(features) => Some(TrainingExample::new(features, label)),
            Err(e) => {
                warn!("Skipping seed URL {}: {}", url, e);
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_set_is_balanced_and_complete() {
        let examples = seed_training_set(&UrlFeatureExtractor::default());

        assert_eq!(examples.len(), 20);
        let malicious = examples
            .iter()
            .filter(|e| e.label() == Label::Malicious)
            .count();
        assert_eq!(malicious, 10);
    }
}
