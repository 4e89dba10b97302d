//! Canonical binary encoding of every wire message.
//!
//! All messages go through the same bincode options so that two equal
//! values always encode to the same bytes. Trailing bytes are rejected.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// upper bound of any single encoded message
pub const MAX_MESSAGE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot encode `{type_name}`")]
    Encode {
        type_name: &'static str,
        #[source]
        source: bincode::Error,
    },
    #[error("cannot decode `{type_name}`")]
    Decode {
        type_name: &'static str,
        #[source]
        source: bincode::Error,
    },
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_SIZE)
        .reject_trailing_bytes()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    options().serialize(value).map_err(|source| Error::Encode {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    options().deserialize(bytes).map_err(|source| Error::Decode {
        type_name: std::any::type_name::<T>(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::ChannelHeader;

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode(&42u64).unwrap();
        bytes.push(0);
        assert!(matches!(decode::<u64>(&bytes), Err(Error::Decode { .. })));
    }

    #[test]
    fn decode_error_names_the_message() {
        let error = decode::<ChannelHeader>(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(error.to_string().contains("ChannelHeader"));
    }
}
