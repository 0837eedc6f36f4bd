pub const BAR_WIDTH: usize = 30;
pub const BAR_FILLED: char = '#';
pub const BAR_EMPTY: char = '-';

pub const MARKER_DONE: &str = "[x]";
pub const MARKER_CURRENT: &str = "[>]";
pub const MARKER_PENDING: &str = "[ ]";

pub const SUBMITTING_TEXT: &str = "Submitting comparison...";
