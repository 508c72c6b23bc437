pub mod db;
pub mod identity;
pub mod text_llm;
pub mod youtube;

pub use db::DbAdapter;
pub use identity::SessionIdentityProvider;
pub use text_llm::OpenAiTextAdapter;
pub use youtube::{DisabledVideoSearch, YouTubeAdapter};
