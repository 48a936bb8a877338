//! HotPrompt - replace the current selection with AI output from a hotkey
//!
//! A global hotkey copies the selection (text or image), sends it to an AI
//! provider with the binding's prompt, and pastes the answer back in place.
//! Provider API keys rotate on quota errors.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, entities, and errors
//! - **Application**: The hotkey-to-completion pipeline and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (arboard, enigo, rdev, Gemini, OpenAI-compatible)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
