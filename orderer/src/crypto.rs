//! Local signing identity of the node and envelope construction.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use orderer_lib::{
    codec,
    interfaces::{ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader},
};
use rand::{rngs::OsRng, RngCore as _};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

const NONCE_SIZE: usize = 24;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read the signing key `{}`", .path.to_string_lossy())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("the signing key is not a valid hex encoded 32 bytes seed")]
    InvalidKey,
    #[error(transparent)]
    Codec(#[from] codec::Error),
}

pub trait LocalSigner: Send + Sync {
    fn new_signature_header(&self) -> Result<SignatureHeader, Error>;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error>;
}

pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn generate() -> Self {
        Ed25519Signer {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Ed25519Signer {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// load the key from a file holding the hex encoded seed
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|source| Error::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let seed = hex::decode(content.trim()).map_err(|_| Error::InvalidKey)?;
        let seed: [u8; 32] = seed.try_into().map_err(|_| Error::InvalidKey)?;
        Ok(Self::from_seed(seed))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl LocalSigner for Ed25519Signer {
    fn new_signature_header(&self) -> Result<SignatureHeader, Error> {
        let mut nonce = vec![0; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        Ok(SignatureHeader {
            creator: self.key.verifying_key().to_bytes().to_vec(),
            nonce,
        })
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

/// transaction identifier: hex encoded SHA-256 of the nonce followed by
/// the creator
pub fn compute_tx_id(signature_header: &SignatureHeader) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&signature_header.nonce);
    hasher.update(&signature_header.creator);
    hex::encode(hasher.finalize())
}

/// wrap `data` in a payload addressed to `channel_id` and sign it
pub fn create_signed_envelope<T: Serialize>(
    header_type: HeaderType,
    channel_id: &str,
    signer: &dyn LocalSigner,
    data: &T,
    msg_version: i32,
    epoch: u64,
) -> Result<Envelope, Error> {
    let signature_header = signer.new_signature_header()?;
    let channel_header = ChannelHeader {
        header_type,
        version: msg_version,
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default(),
        channel_id: channel_id.to_owned(),
        tx_id: compute_tx_id(&signature_header),
        epoch,
    };
    let payload = Payload {
        header: Some(Header {
            channel_header,
            signature_header,
        }),
        data: codec::encode(data)?,
    };
    let payload = codec::encode(&payload)?;
    let signature = signer.sign(&payload)?;
    Ok(Envelope { payload, signature })
}
