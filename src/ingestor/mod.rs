pub mod ingest_epg;

pub use ingest_epg::EpgIngestor;
