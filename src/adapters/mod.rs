// Adapters layer: concrete implementations for external systems (http services, storage, console).

pub mod amazon;
pub mod http;
pub mod openai;
pub mod prompt;
pub mod prompts;
pub mod storage;
pub mod ynab;
