// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process cache tier backed by moka.
//!
//! [`InMemoryTier`] is the local variant of [`CacheTier`](cacheaside_tier::CacheTier): a
//! concurrent map private to one process. Every write carries its own expiration, so a
//! batch written by the orchestrator expires uniformly while single writes may differ.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use cacheaside_memory::InMemoryTier;
//! use cacheaside_tier::CacheTier;
//!
//! # futures::executor::block_on(async {
//! let tier = InMemoryTier::<i32>::builder().max_capacity(1000).build();
//!
//! tier.set("key", 42, Duration::from_secs(300)).await?;
//! assert_eq!(tier.get("key").await?, Some(42));
//! # Ok::<(), cacheaside_tier::Error>(())
//! # });
//! ```
//!
//! The tier is an ordinary value: construct one per owning service and inject it into the
//! orchestrator. Clones share the same underlying map.

pub mod builder;
mod expiry;
pub mod tier;

#[doc(inline)]
pub use builder::InMemoryTierBuilder;
#[doc(inline)]
pub use tier::InMemoryTier;
