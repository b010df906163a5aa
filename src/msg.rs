use crossterm::event::KeyEvent;
use std::path::PathBuf;

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize,

    // -- Host hooks
    /// The terminal window regained focus.
    FocusGained,
    /// Something changed under a watched folder.
    FileChanged(PathBuf),

    // -- System
    Tick,
    Quit,
}
