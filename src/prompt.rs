// Interactive prompts used on first run.
// `Terminal` is the seam between the config bootstrap and the console: the
// real implementation uses `dialoguer`, tests plug in a scripted one.

use crate::error::{Error, Result};
use crate::ini;
use dialoguer::{Input, Password};

/// Where to send people who need to look up their keys.
pub const CREDENTIALS_URL: &str = "https://portal.aws.amazon.com/gp/aws/securityCredentials";

/// Banner printed once when any config file is missing.
pub const FIRST_RUN_BANNER: &str = "Looks like this is your first run.";

/// The three console interactions the bootstrap needs.
pub trait Terminal {
    /// Print one informational line.
    fn say(&self, line: &str) -> Result<()>;

    /// Ask for a value without echoing it.
    fn secret(&self, prompt: &str) -> Result<String>;

    /// Ask for a value with echo. A blank answer is allowed and returned as "".
    fn ask(&self, prompt: &str) -> Result<String>;
}

/// Console terminal backed by `dialoguer`.
pub struct DialoguerTerminal;

impl Terminal for DialoguerTerminal {
    fn say(&self, line: &str) -> Result<()> {
        println!("{}", line);
        Ok(())
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        // `Password` hides input in terminal.
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(Error::Prompt)
    }

    fn ask(&self, prompt: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(Error::Prompt)?;
        Ok(answer)
    }
}

/// Prompt for an access key pair and render the credentials file.
/// Answers are written exactly as typed.
pub fn credentials_text(term: &dyn Terminal) -> Result<String> {
    term.say(&format!("Find your credentials at {}", CREDENTIALS_URL))?;
    let key_id = term.secret("Enter your access key id")?;
    let secret = term.secret("Enter your secret access key")?;
    Ok(ini::render(
        crate::config::CREDENTIALS_SECTION,
        &[
            ("aws_access_key_id", key_id.as_str()),
            ("aws_secret_access_key", secret.as_str()),
        ],
    ))
}

/// Prompt for bucket name and table prefix and render the settings file.
///
/// The bucket defaults to `catsnap-{user}`. The prefix defaults to whatever
/// bucket name was chosen, not to the user-derived name.
pub fn settings_text(term: &dyn Terminal, user: &str) -> Result<String> {
    let default_bucket = format!("catsnap-{}", user);
    let bucket = or_default(
        term.ask(&format!(
            "Please name your bucket (leave blank to use '{}')",
            default_bucket
        ))?,
        default_bucket,
    );
    let prefix = or_default(
        term.ask(&format!(
            "Please choose a table prefix (leave blank to use '{}')",
            bucket
        ))?,
        bucket.clone(),
    );
    Ok(ini::render(
        crate::config::SETTINGS_SECTION,
        &[("bucket", bucket.as_str()), ("table_prefix", prefix.as_str())],
    ))
}

fn or_default(answer: String, default: String) -> String {
    let answer = answer.trim();
    if answer.is_empty() {
        default
    } else {
        answer.to_string()
    }
}

/// Name of the user running the CLI, used to derive default names.
pub fn current_user() -> Result<String> {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .or_else(|| {
            dirs::home_dir()
                .and_then(|home| home.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .ok_or(Error::UnknownUser)
}
