/// What currently owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The switcher panel itself.
    #[default]
    Panel,
    /// Typing a name for a new stored file.
    NamePrompt,
    /// Picking a stored file to switch to.
    SelectFile,
    /// An error notice waiting to be dismissed.
    Notice,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Panel => "PANEL",
            Mode::NamePrompt => "NAME",
            Mode::SelectFile => "SELECT",
            Mode::Notice => "NOTICE",
        }
    }

    /// Key hints shown in the status bar.
    pub fn hints(&self) -> &'static str {
        match self {
            Mode::Panel => "c: create  s: switch  o: open folder  Tab: instance  r: reload  q: quit",
            Mode::NamePrompt => "Enter: confirm  Esc: cancel",
            Mode::SelectFile => "Enter: select  Esc: cancel  j/k: move",
            Mode::Notice => "Enter/Esc: dismiss",
        }
    }
}
