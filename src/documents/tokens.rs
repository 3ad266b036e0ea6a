//! Token counting for chunks using tiktoken-rs.
//!
//! Uses cl100k_base, which tracks llama-family tokenizers closely enough for
//! sizing requests against the model's context window.

use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Distinct chunk texts remembered before the memo is reset
const MEMO_CAPACITY: usize = 4_096;

static MEMO: OnceLock<RwLock<HashMap<u64, u32>>> = OnceLock::new();

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn memo() -> &'static RwLock<HashMap<u64, u32>> {
    MEMO.get_or_init(|| RwLock::new(HashMap::with_capacity(MEMO_CAPACITY)))
}

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER
        .get_or_init(|| match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, falling back to estimates");
                None
            }
        })
        .as_ref()
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// cl100k token count of `text`, memoized per distinct text.
///
/// Without an encoder this is [`estimate_tokens_quick`].
pub fn count_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let key = fingerprint(text);
    if let Some(&count) = memo().read().get(&key) {
        return count;
    }

    let Some(bpe) = encoder() else {
        return estimate_tokens_quick(text);
    };
    let count = bpe.encode_with_special_tokens(text).len() as u32;

    let mut memo = memo().write();
    if memo.len() >= MEMO_CAPACITY {
        memo.clear();
    }
    memo.insert(key, count);
    count
}

/// Bytes / 4, rounded up
pub fn estimate_tokens_quick(text: &str) -> u32 {
    text.len().div_ceil(4) as u32
}
