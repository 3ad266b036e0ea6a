use std::sync::Arc;

use crate::billing::CheckoutClient;
use crate::config::Config;
use crate::documents::splitter::TextSplitter;
use crate::flashcards::FlashcardGenerator;
use crate::llm::{ChatClient, CompletionClient};
use crate::storage::{ContactStore, SetStore, WaitlistStore};
use crate::uploads::UploadStore;

use super::StartupError;

pub struct AppState {
    pub config: Config,
    pub generator: FlashcardGenerator,
    pub sets: SetStore,
    pub contacts: ContactStore,
    pub waitlist: WaitlistStore,
    pub uploads: UploadStore,
    pub checkout: CheckoutClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let client = Arc::new(ChatClient::new(&config.llm));
        Self::with_client(config, client)
    }

    /// Build state around any completion backend
    pub fn with_client(config: Config, client: Arc<dyn CompletionClient>) -> Result<Arc<Self>, StartupError> {
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        let generator = FlashcardGenerator::new(client, splitter)
            .with_max_document_bytes(config.max_upload_bytes);

        let sets = SetStore::open(config.sets_dir())?;
        let contacts = ContactStore::open(config.contacts_dir())?;
        let waitlist = WaitlistStore::open(config.waitlist_dir())?;
        let uploads = UploadStore::open(&config.upload_dir, config.max_upload_bytes)?;
        let checkout = CheckoutClient::new(&config.stripe_base_url, config.stripe_secret_key.clone());

        Ok(Arc::new(Self {
            config,
            generator,
            sets,
            contacts,
            waitlist,
            uploads,
            checkout,
        }))
    }
}
