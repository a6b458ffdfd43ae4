/// The sink for everything the parser shows to the user.
pub trait UserInterface {
    /// Show a message (ex: the usage on a help request).
    fn print(&self, message: String);

    /// Show an error, along with the usage.
    fn print_error(&self, message: String);
}

/// Prints messages to stdout and errors to stderr.
#[derive(Default)]
pub struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, message: String) {
        eprintln!("{message}");
    }
}
