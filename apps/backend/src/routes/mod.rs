pub mod flashcards;
pub mod sessions;
pub mod stats;
pub mod words;
