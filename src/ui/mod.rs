pub mod progress_bar;
pub mod prompt;
pub mod state;

pub use prompt::{PromptSummary, run_once, run_prompt};
pub use state::{RequestMachine, RequestState, UiEvent};
