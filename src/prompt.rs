/// User-facing error notices raised by the switcher workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoFilesStored,
    ReadFailed,
    WriteFailed,
    PointerFailed,
}

impl Notice {
    pub fn title(self) -> &'static str {
        match self {
            Notice::NoFilesStored => "Standard Switcher: No files",
            Notice::ReadFailed | Notice::WriteFailed | Notice::PointerFailed => {
                "Standard Switcher: Failed to copy"
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::NoFilesStored => {
                "There are no standard settings files stored with standard switcher!"
            }
            Notice::ReadFailed => "Failed to read standard settings file! (Check logs)",
            Notice::WriteFailed => "Failed to write standard settings file! (Check logs)",
            Notice::PointerFailed => "Failed to set standardsettings.global! (Check logs)",
        }
    }
}

/// Modal questions asked of the user. `None` always means cancelled.
pub trait Prompter {
    /// Ask for free text. `warning` is shown above `message` when re-asking.
    fn ask_text(&mut self, title: &str, warning: Option<&str>, message: &str) -> Option<String>;

    /// Pick one of `options`, starting with `default` highlighted.
    fn choose(&mut self, title: &str, message: &str, options: &[String], default: usize)
    -> Option<String>;

    fn notify(&mut self, notice: Notice);
}

/// Ask until `validate` accepts the answer or the user cancels.
///
/// The validator's error is turned into the warning for the next attempt.
pub fn ask_until_valid<P, T, E, V>(
    prompter: &mut P,
    title: &str,
    message: &str,
    mut validate: V,
    warning: impl Fn(&E) -> &str,
) -> Option<T>
where
    P: Prompter + ?Sized,
    V: FnMut(&str) -> Result<T, E>,
{
    let mut answer = prompter.ask_text(title, None, message)?;
    loop {
        match validate(&answer) {
            Ok(value) => return Some(value),
            Err(err) => {
                answer = prompter.ask_text(title, Some(warning(&err)), message)?;
            }
        }
    }
}
