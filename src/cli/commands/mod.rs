use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgGroup, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn identity_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("phone")
                .long("phone")
                .help("Phone number, international format, example: +22912345678"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .help("Email address"),
        )
        .group(
            ArgGroup::new("identity")
                .args(["phone", "email"])
                .required(true),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("koach")
        .about("Mon Koach client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Backend base URL, example: https://project.supabase.co")
                .env("KOACH_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .help("Backend anon API key")
                .env("KOACH_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new("chat-url")
                .long("chat-url")
                .help("Coach chat webhook URL")
                .env("KOACH_CHAT_URL")
                .default_value("https://n8n-nw6a.onrender.com/webhook/moncoach"),
        )
        .arg(
            Arg::new("code-webhook-url")
                .long("code-webhook-url")
                .help("Webhook that emails the verification code")
                .env("KOACH_CODE_WEBHOOK_URL")
                .default_value(
                    "https://n8n-nw6a.onrender.com/webhook/09686b59-9edd-46a6-a2d5-5620326b2eeb",
                ),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Directory holding the credential file")
                .env("KOACH_DATA_DIR")
                .default_value(".koach"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("KOACH_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            identity_args(Command::new("login"))
                .about("Create or fetch your account and wait for verification")
                .arg(
                    Arg::new("poll-interval")
                        .long("poll-interval")
                        .help("Seconds between verification checks")
                        .env("KOACH_POLL_INTERVAL")
                        .default_value("5")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("poll-attempts")
                        .long("poll-attempts")
                        .help("Maximum number of verification checks")
                        .env("KOACH_POLL_ATTEMPTS")
                        .default_value("60")
                        .value_parser(clap::value_parser!(u32).range(1..)),
                ),
        )
        .subcommand(
            identity_args(Command::new("verify"))
                .about("Verify your account with the emailed code")
                .arg(
                    Arg::new("code")
                        .long("code")
                        .help("The 6-character code you received")
                        .required(true),
                ),
        )
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(
            Command::new("profile")
                .about("Complete or update your profile")
                .arg(Arg::new("nom").long("nom").help("Display name"))
                .arg(Arg::new("email").long("email").help("Email address"))
                .group(
                    ArgGroup::new("fields")
                        .args(["nom", "email"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("chat")
                .about("Send one message to your coach")
                .arg(
                    Arg::new("message")
                        .help("The message")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Clear stored credentials"))
}
