pub mod editor;
pub mod events;
pub mod history;
pub mod input;
pub mod restore;
pub mod session;
pub mod shortcuts;

pub use editor::Editor;
pub use events::{DEFAULT_DEBOUNCE_WINDOW, DebounceTimer, SceneEvent};
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use session::{EditorSession, SceneMutation, TextEditState};
pub use shortcuts::{ShortcutAction, ShortcutMap};
