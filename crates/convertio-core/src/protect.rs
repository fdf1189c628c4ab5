//! Password protection
//!
//! Encrypts a document with the PDF standard security handler.

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ConvertError;
use crate::{save_document, PdfOutput};

/// RC4 key length in bits
const KEY_LENGTH: usize = 128;

/// Encryption settings
#[derive(Debug, Clone)]
pub struct ProtectOptions {
    /// Password required to open the document
    pub user_password: String,
    /// Password that lifts the permission restrictions, defaults to the user password
    pub owner_password: Option<String>,
    pub permissions: Permissions,
}

impl ProtectOptions {
    /// Open password only, printing allowed, editing and copying denied
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            user_password: password.into(),
            owner_password: None,
            permissions: default_permissions(),
        }
    }

    fn owner_password(&self) -> &str {
        self.owner_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.user_password)
    }
}

fn default_permissions() -> Permissions {
    Permissions::PRINTABLE
        | Permissions::PRINTABLE_IN_HIGH_QUALITY
        | Permissions::COPYABLE_FOR_ACCESSIBILITY
}

/// Encrypt a PDF so it needs `options.user_password` to open
pub fn protect_document(bytes: &[u8], options: &ProtectOptions) -> Result<PdfOutput, ConvertError> {
    if options.user_password.is_empty() {
        return Err(ConvertError::MissingPassword);
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| ConvertError::ParseError(e.to_string()))?;

    if doc.is_encrypted() {
        return Err(ConvertError::AlreadyEncrypted);
    }

    let page_count = doc.get_pages().len() as u32;
    ensure_file_id(&mut doc, bytes);
    doc.compress();

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: options.owner_password(),
        user_password: &options.user_password,
        key_length: KEY_LENGTH,
        permissions: options.permissions,
    };
    let state = EncryptionState::try_from(version)
        .map_err(|e| ConvertError::OperationError(format!("Failed to derive keys: {}", e)))?;

    doc.encrypt(&state)
        .map_err(|e| ConvertError::OperationError(format!("Encryption failed: {}", e)))?;
    debug!("Encrypted document with {}-bit key", KEY_LENGTH);

    save_document(&mut doc, page_count)
}

/// Key derivation needs a file identifier; derive one from the content if absent
fn ensure_file_id(doc: &mut Document, bytes: &[u8]) {
    if doc.trailer.get(b"ID").is_ok() {
        return;
    }

    let digest = Sha256::digest(bytes);
    let id = Object::String(digest[..16].to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_pdf;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_empty_password_rejected() {
        let pdf = create_test_pdf(1, "Lock");
        let result = protect_document(&pdf, &ProtectOptions::new(""));
        assert!(matches!(result, Err(ConvertError::MissingPassword)));
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let result = protect_document(b"not a pdf", &ProtectOptions::new("secret"));
        assert!(matches!(result, Err(ConvertError::ParseError(_))));
    }

    #[test]
    fn test_protect_writes_encrypt_dictionary() {
        let pdf = create_test_pdf(2, "Lock");
        let result = protect_document(&pdf, &ProtectOptions::new("secret")).unwrap();

        assert!(result.bytes.starts_with(b"%PDF-"));
        assert!(contains(&result.bytes, b"/Encrypt"));
        assert!(contains(&result.bytes, b"/Standard"));
        assert_eq!(result.page_count, 2);
    }

    #[test]
    fn test_protect_hides_plain_text_content() {
        let pdf = create_test_pdf(1, "Visible");
        assert!(contains(&pdf, b"Visible-Page-1"));

        let result = protect_document(&pdf, &ProtectOptions::new("secret")).unwrap();
        assert!(!contains(&result.bytes, b"Visible-Page-1"));
    }

    #[test]
    fn test_only_the_right_password_opens_document() {
        let pdf = create_test_pdf(1, "Lock");
        let result = protect_document(&pdf, &ProtectOptions::new("s3cret")).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert!(doc.is_encrypted());
        assert!(doc.authenticate_raw_user_password("s3cret").is_ok());
        assert!(doc.authenticate_raw_user_password("wrong").is_err());
        assert!(doc.authenticate_raw_user_password("").is_err());
    }

    #[test]
    fn test_separate_owner_password_authenticates() {
        let pdf = create_test_pdf(1, "Lock");
        let options = ProtectOptions {
            owner_password: Some("admin".into()),
            ..ProtectOptions::new("reader")
        };
        let result = protect_document(&pdf, &options).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert!(doc.authenticate_raw_owner_password("admin").is_ok());
        assert!(doc.authenticate_raw_user_password("reader").is_ok());
        assert!(doc.authenticate_raw_owner_password("reader").is_err());
    }

    #[test]
    fn test_already_encrypted_rejected() {
        let pdf = create_test_pdf(1, "Lock");
        let once = protect_document(&pdf, &ProtectOptions::new("secret")).unwrap();
        let result = protect_document(&once.bytes, &ProtectOptions::new("again"));
        assert!(matches!(result, Err(ConvertError::AlreadyEncrypted)));
    }

    #[test]
    fn test_file_id_added_when_missing() {
        let pdf = create_test_pdf(1, "Lock");
        let mut doc = Document::load_mem(&pdf).unwrap();
        doc.trailer.remove(b"ID");

        ensure_file_id(&mut doc, &pdf);
        let ids = doc.trailer.get(b"ID").unwrap().as_array().unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_owner_password_falls_back_to_user_password() {
        let options = ProtectOptions {
            owner_password: Some(String::new()),
            ..ProtectOptions::new("secret")
        };
        assert_eq!(options.owner_password(), "secret");

        let options = ProtectOptions {
            owner_password: Some("admin".into()),
            ..ProtectOptions::new("secret")
        };
        assert_eq!(options.owner_password(), "admin");
    }

    #[test]
    fn test_default_permissions_deny_editing() {
        let permissions = ProtectOptions::new("secret").permissions;
        assert!(permissions.contains(Permissions::PRINTABLE_IN_HIGH_QUALITY));
        assert!(!permissions.contains(Permissions::MODIFIABLE));
        assert!(!permissions.contains(Permissions::COPYABLE));
    }
}
