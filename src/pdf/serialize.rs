//! Turning the finished document into bytes
//!
//! Compression and object streams are passed through to lopdf. A non-empty
//! password encrypts the output with that password as both user and owner
//! password; encrypted output keeps a classic cross-reference table.

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use md5::{Digest, Md5};

use crate::config::ENCRYPTION_KEY_BITS;
use crate::error::{Error, Result};
use crate::model::OutputOptions;

/// Serialize `doc` according to `options`
pub fn serialize(mut doc: Document, options: &OutputOptions) -> Result<Vec<u8>> {
    if options.compress {
        doc.compress();
    }

    let mut buffer = Vec::new();

    match options.effective_password() {
        Some(password) => {
            let mut plain = Vec::new();
            doc.save_to(&mut plain)?;
            set_file_id(&mut doc, &plain);

            encrypt(&mut doc, password)?;
            doc.save_to(&mut buffer)?;
            log::debug!("serialized {} bytes (encrypted)", buffer.len());
        }
        None if options.use_object_streams => {
            doc.save_modern(&mut buffer)?;
            log::debug!("serialized {} bytes with object streams", buffer.len());
        }
        None => {
            doc.save_to(&mut buffer)?;
            log::debug!("serialized {} bytes", buffer.len());
        }
    }

    Ok(buffer)
}

/// Derive the trailer /ID from the unencrypted bytes
///
/// The key derivation for standard security handlers mixes in the first
/// element of /ID, so it has to exist before encrypting.
fn set_file_id(doc: &mut Document, plain: &[u8]) {
    let digest = Md5::digest(plain).to_vec();
    let id = Object::String(digest, StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));
}

fn encrypt(doc: &mut Document, password: &str) -> Result<()> {
    let version = EncryptionVersion::V2 {
        document: &*doc,
        owner_password: password,
        user_password: password,
        key_length: ENCRYPTION_KEY_BITS,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version).map_err(|e| Error::Encryption(e.to_string()))?;

    doc.encrypt(&state).map_err(|e| Error::Encryption(e.to_string()))
}
