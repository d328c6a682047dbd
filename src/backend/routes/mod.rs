//! Route Configuration Module
//!
//! - **`router`** - Route table, auth layering, static media and fallback
//!
//! # Route Table
//!
//! | Method & path | Auth |
//! |---|---|
//! | `POST /api/v1/users/register` | no |
//! | `POST /api/v1/users/login` | no |
//! | `POST /api/v1/users/refresh-token` | no |
//! | `POST /api/v1/users/logout` | yes |
//! | `POST /api/v1/users/change-password` | yes |
//! | `PATCH /api/v1/users/update-account` | yes |
//! | `GET /api/v1/users/current-user` | yes |
//! | `GET /api/v1/users/search/{query}` | yes |
//! | `GET /api/v1/users/{userId}` | yes |
//! | `POST /api/v1/chat/individual/create-chat` | yes |
//! | `GET /api/v1/chat/individual/get-chats` | yes |
//! | `POST /api/v1/chat/individual/send-message/{chatId}` | yes |
//! | `GET /api/v1/chat/individual/get-messages/{chatId}` | yes |
//! | `GET /api/v1/chat/individual/get-sliced-messages/{chatId}/{page}` | yes |
//! | `PUT /api/v1/chat/individual/editMessage/{messageId}` | yes |
//! | `POST /api/v1/media/upload` | yes |
//! | `GET /media/{file}` | no |
//! | `GET /health` | no |
//! | `GET /ws` | token during upgrade |

pub mod router;

pub use router::{create_router, API_PREFIX};
