// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orgscope: resilient company-profile fetching and layered extraction.
//!
//! A single profile page is fetched through [`fetch::ResilientFetcher`]
//! (bounded retry with exponential backoff on rate limits and transport
//! failures), then converted into an [`record::EntityRecord`] by combining the
//! embedded JSON-LD block with positional markup patterns. The
//! [`scrape::Scraper`] entry point wires both halves together with explicit
//! cache and credential ports.

pub mod extract;
pub mod fetch;
pub mod ports;
pub mod record;
pub mod scrape;

pub use extract::{extract_record, ExtractionError};
pub use fetch::{
    classify, CapturedFailure, ClassifiedFailure, FailureCategory, FetchConfig, FetchedDocument,
    ResilientFetcher,
};
pub use ports::{CacheStore, CredentialStore};
pub use record::{CompanyAddress, CompanyInfo, EntityRecord, Publication, RelatedEntity};
pub use scrape::{InputMethod, ScrapeError, ScrapeRequest, Scraper, ScraperConfig};
