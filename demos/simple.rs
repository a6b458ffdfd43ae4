use fieldopt::Command;

#[derive(Default, Command)]
#[fieldopt(name = "simple", help = "Count down.")]
pub struct CountDown {
    #[fieldopt(short = 'h', callback = "help", help = "show this message")]
    pub help: bool,
    #[fieldopt(short = 'v', help = "print each step")]
    pub verbose: bool,
    #[fieldopt(short = 'f', help = "the name counting", default = "john")]
    pub from: String,
    #[fieldopt(help = "where to start from")]
    pub count: Option<u32>,
}

fn main() {
    let count_down = CountDown::parse_args();
    let count = count_down.count.unwrap_or_default();

    for step in (1..=count).rev() {
        if count_down.verbose || step == 1 {
            println!("{}: {step}", count_down.from);
        }
    }
}
