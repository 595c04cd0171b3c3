// Feature extraction properties over a spread of real-world URL shapes

mod common;

use common::{extractor, PROBE_URLS};
use malicious_url_detector::{
    utils::shannon_entropy, ExtractionError, FeatureLists, UrlFeatureExtractor, FEATURE_COUNT,
    FEATURE_NAMES,
};

#[test]
fn test_extraction_is_deterministic() {
    let extractor = extractor();
    for url in PROBE_URLS {
        let first = extractor.extract(url).unwrap();
        let second = extractor.extract(url).unwrap();
        assert_eq!(first, second, "{url}");
        assert_eq!(first.to_array(), second.to_array(), "{url}");
    }
}

#[test]
fn test_vectors_are_complete_and_non_negative() {
    let extractor = extractor();
    for url in PROBE_URLS {
        let array = extractor.extract(url).unwrap().to_array();
        assert_eq!(array.len(), FEATURE_COUNT);
        assert!(
            array.iter().all(|v| v.is_finite() && *v >= 0.0),
            "{url}: {array:?}"
        );
    }
}

#[test]
fn test_named_values_follow_canonical_order() {
    let features = extractor().extract("https://www.google.com").unwrap();
    let names: Vec<&str> = features.named_values().map(|(name, _)| name).collect();

    assert_eq!(names, FEATURE_NAMES);
    assert_eq!(names.first(), Some(&"url_length"));
    assert_eq!(names.last(), Some(&"entropy"));
}

#[test]
fn test_google_homepage() {
    let features = extractor().extract("https://www.google.com").unwrap();

    assert!(features.https);
    assert!(!features.http);
    assert!(!features.suspicious_tld);
    assert_eq!(features.suspicious_words, 0);
    assert!(!features.has_parameters);
}

#[test]
fn test_phishing_path() {
    let features = extractor()
        .extract("http://malware.example.tk/login/secure/bank/verify")
        .unwrap();

    assert!(features.http);
    assert!(features.suspicious_tld);
    assert!(features.suspicious_words >= 3);
    assert_eq!(features.path_depth, 4);
}

#[test]
fn test_empty_components() {
    let features = extractor().extract("https://example.com").unwrap();

    assert_eq!(features.path_length, 0);
    assert_eq!(features.path_depth, 0);
    assert_eq!(features.query_count, 0);
    assert!(!features.has_parameters);
    assert_eq!(features.subdomain_count, 1);
    assert!(!features.has_subdomain);
}

#[test]
fn test_fragment_is_not_part_of_query() {
    let features = extractor()
        .extract("https://example.com/page?a=1#section&b=2")
        .unwrap();

    assert_eq!(features.query_length, 3);
    assert_eq!(features.query_count, 1);
}

#[test]
fn test_unparseable_inputs_fail_cleanly() {
    let extractor = extractor();

    for input in ["", "not a url", "://missing-scheme.com", "mailto:user@example.com"] {
        assert!(extractor.extract(input).is_err(), "{input:?} should fail");
    }
    assert_eq!(extractor.extract(""), Err(ExtractionError::Empty));
}

#[test]
fn test_max_length_is_configurable() {
    let url = format!("https://example.com/{}", "a".repeat(100));

    assert!(UrlFeatureExtractor::default().extract(&url).is_ok());

    let strict = UrlFeatureExtractor::new(FeatureLists::default(), 50);
    assert_eq!(
        strict.extract(&url),
        Err(ExtractionError::TooLong {
            max: 50,
            current: url.len()
        })
    );
}

#[test]
fn test_bundled_lists_match_defaults() {
    let lists = FeatureLists::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/feature_lists.json"));
    assert_eq!(lists, FeatureLists::default());
}

#[test]
fn test_entropy_bounds() {
    assert_eq!(shannon_entropy(""), 0.0);
    assert_eq!(shannon_entropy("aaaa"), 0.0);
    assert!((shannon_entropy("ab") - 1.0).abs() < 1e-12);

    for url in common::PROBE_URLS {
        let entropy = extractor().extract(url).unwrap().entropy;
        assert!(entropy >= 0.0);
        assert_eq!(entropy, shannon_entropy(url));
    }
}
