// Utility modules for the URL detector

pub mod detector_errors;
pub mod entropy;
pub mod url_parts;

pub use detector_errors::{DetectorError, DetectorErrorResponse, DetectorResult};
pub use entropy::shannon_entropy;
pub use url_parts::UrlParts;
