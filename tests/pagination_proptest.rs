//! Property-based tests for paged history reads
//!
//! For any history length and page size, pages read from the newest end
//! are contiguous, never overlap, and together cover the whole history.

use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;

use chatline::backend::messaging::MessageService;
use chatline::backend::store::{ChatStore, MemoryStore};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_pages_partition_history(count in 0usize..40, page_size in 1u32..8) {
        runtime().block_on(async {
            let store = Arc::new(MemoryStore::new());
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            let (chat, _) = store.get_or_insert_conversation(a, b).await.unwrap();
            let service = MessageService::new(store, page_size, 1000);

            let mut sent = Vec::new();
            for i in 0..count {
                let sender = if i % 2 == 0 { a } else { b };
                let message = service.create_message(chat.id, sender, &format!("m{}", i), None).await.unwrap();
                sent.push(message.id);
            }

            let mut collected = Vec::new();
            let mut page = 0;
            loop {
                let result = service.list_messages_paged(chat.id, a, page).await.unwrap();
                prop_assert!(result.messages.len() <= page_size as usize);

                // Each page is chronological; older pages go in front
                let mut ids: Vec<Uuid> = result.messages.iter().map(|m| m.id).collect();
                ids.extend(collected);
                collected = ids;

                if !result.has_more {
                    break;
                }
                page += 1;
            }

            prop_assert_eq!(&collected, &sent);

            let beyond = service.list_messages_paged(chat.id, b, page + 1).await.unwrap();
            prop_assert!(beyond.messages.is_empty());
            prop_assert!(!beyond.has_more);
            Ok(())
        })?;
    }

    #[test]
    fn test_history_is_capped_to_most_recent(count in 1usize..30, cap in 1u32..10) {
        runtime().block_on(async {
            let store = Arc::new(MemoryStore::new());
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            let (chat, _) = store.get_or_insert_conversation(a, b).await.unwrap();
            let service = MessageService::new(store, 5, cap);

            let mut sent = Vec::new();
            for i in 0..count {
                sent.push(service.create_message(chat.id, a, &format!("m{}", i), None).await.unwrap().id);
            }

            let history: Vec<Uuid> = service.list_messages(chat.id, b).await.unwrap().iter().map(|m| m.id).collect();
            let expected_len = count.min(cap as usize);
            prop_assert_eq!(history.len(), expected_len);
            prop_assert_eq!(&history[..], &sent[count - expected_len..]);
            Ok(())
        })?;
    }
}
