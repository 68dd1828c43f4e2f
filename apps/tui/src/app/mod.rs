// App module for agrivision
// Application state, background fetches and input handling

pub mod events;
pub mod input;
pub mod map_panel;
pub mod state;
pub mod tasks;

pub use events::AppEvent;
pub use input::{handle_input, handle_map_mouse};
pub use state::{App, AppScreen};
