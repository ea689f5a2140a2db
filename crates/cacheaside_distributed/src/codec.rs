// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! JSON encoding of cached values.

use cacheaside_tier::Error;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) fn encode<V: Serialize>(value: &V) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(Error::permanent)
}

pub(crate) fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<V, Error> {
    serde_json::from_slice(bytes).map_err(Error::permanent)
}
