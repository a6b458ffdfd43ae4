/// Name of the built-in callback which prints the usage and stops parsing.
pub(crate) const HELP_CALLBACK: &str = "help";

pub(crate) const MARGIN: &str = "    ";
// "-x" plus padding, then the type hint.
pub(crate) const SHORT_WIDTH: usize = 4;
pub(crate) const HINT_WIDTH: usize = 5;
pub(crate) const LONG_WIDTH: usize = 20;
pub(crate) const ARGUMENT_WIDTH: usize = 12;

// Wrapping below this many help columns reads worse than overflowing.
pub(crate) const MINIMUM_HELP_WIDTH: usize = 17;
