pub mod extractor;
pub mod fetcher;

pub use extractor::MusicBrainzExtractor;
pub use fetcher::ReqwestFetcher;
