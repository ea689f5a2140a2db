// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Example of read-through caching in front of a slow source.
//!
//! The first read of a key loads it from the source and caches it; the second read is
//! served from the local tier. Run with `--features test-util` to see the log events.

use cacheaside::testing::MockSource;
use cacheaside::{CacheAside, LoadFlag, Settings};
use tick::Clock;

#[derive(Clone)]
struct Profile {
    id: u64,
    display_name: String,
}

fn main() -> Result<(), cacheaside::Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let source = MockSource::new(|profile: &Profile| format!("profile:{}", profile.id));
    source.insert(
        "profile:42",
        Profile {
            id: 42,
            display_name: "Grace".to_string(),
        },
    );

    let cache = CacheAside::builder(Settings::default(), source.clone(), Clock::new_frozen())
        .name("profiles")
        .memory()
        .build()?;

    let probe = Profile {
        id: 42,
        display_name: String::new(),
    };

    futures::executor::block_on(async {
        let first = cache.get_or_load("profile:42", &probe, LoadFlag::None).await?;
        let second = cache.get_or_load("profile:42", &probe, LoadFlag::None).await?;

        let name = |profile: Option<Profile>| profile.map(|p| p.display_name);
        println!("first read: {:?}", name(first));
        println!("second read: {:?}", name(second));
        println!("source calls: {}", source.call_count());
        Ok::<(), cacheaside::Error>(())
    })
}
