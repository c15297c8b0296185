mod terminal;

pub use terminal::{Command, TerminalSurface, drive, render_frame, run};
