mod library_manager;

pub use library_manager::{KioskView, LibraryManager, TodayPlayback};
