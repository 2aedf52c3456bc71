//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked document storage.

use crate::links::Platform;
use crate::storage::MockDocumentStorage;
use crate::store::LinkStore;

/// Create a mock storage whose document is `document` (or missing).
///
/// `read_document` and `check_connection` are stubbed; `write_document`
/// expectations are left to the test.
#[must_use]
pub fn mock_storage_with(document: Option<Vec<u8>>) -> MockDocumentStorage {
    let mut mock = MockDocumentStorage::new();

    mock.expect_read_document()
        .returning(move || Ok(document.clone()));

    mock.expect_check_connection().returning(|| Ok(()));

    mock
}

/// Serialized store holding the given links.
#[must_use]
pub fn store_json(telegram: &[&str], whatsapp: &[&str]) -> Vec<u8> {
    let mut store = LinkStore::default();
    for link in telegram {
        store.links.insert(Platform::Telegram, link);
    }
    for link in whatsapp {
        store.links.insert(Platform::WhatsApp, link);
    }
    store.encode().unwrap_or_default()
}
